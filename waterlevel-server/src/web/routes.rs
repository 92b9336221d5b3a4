//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::board::BoardSnapshot;
use crate::domain::StationMap;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(api_status))
        .route("/api/stations", get(list_stations))
        .route("/api/stations/:id", get(get_station))
        .route("/api/stations/:id/sensors/:sensor", get(get_sensor))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Upstream feed status.
async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.board.snapshot().await;
    Json(StatusResponse::from_snapshot(&snapshot))
}

/// All served stations.
async fn list_stations(
    State(state): State<AppState>,
) -> Result<Json<StationListResponse>, AppError> {
    let snapshot = state.board.snapshot().await;
    let stations = served(&snapshot)?;

    let results = stations
        .iter()
        .map(|(id, record)| StationResult::from_record(id, record))
        .collect();

    Ok(Json(StationListResponse {
        api_available: snapshot.status.api_available,
        using_cached_data: snapshot.using_cached_data(),
        stations: results,
    }))
}

/// One station with all its sensors.
async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StationResult>, AppError> {
    let snapshot = state.board.snapshot().await;
    let stations = served(&snapshot)?;

    let record = stations.get(&id).ok_or_else(|| AppError::NotFound {
        message: format!("Unknown station: {id}"),
    })?;

    Ok(Json(StationResult::from_record(&id, record)))
}

/// One sensor reading with display metadata.
async fn get_sensor(
    State(state): State<AppState>,
    Path((id, sensor)): Path<(String, String)>,
) -> Result<Json<SensorDetail>, AppError> {
    let snapshot = state.board.snapshot().await;
    let stations = served(&snapshot)?;

    let record = stations.get(&id).ok_or_else(|| AppError::NotFound {
        message: format!("Unknown station: {id}"),
    })?;

    let detail = SensorDetail::build(&id, record, &sensor, &snapshot.status, Utc::now())
        .ok_or_else(|| AppError::NotFound {
            message: format!("Station {id} has no sensor {sensor}"),
        })?;

    Ok(Json(detail))
}

/// The station data being served, or 503 if there is none.
fn served(snapshot: &BoardSnapshot) -> Result<Arc<StationMap>, AppError> {
    snapshot
        .stations
        .clone()
        .ok_or_else(|| AppError::Unavailable {
            message: snapshot
                .last_error
                .clone()
                .unwrap_or_else(|| "Station data not yet available".to_string()),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Unavailable { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            warn!("[{status}] {message}");
        } else {
            debug!("[{status}] {message}");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
