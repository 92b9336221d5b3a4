//! Web layer for the water level service.
//!
//! Read-only JSON endpoints over the latest published station data.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
