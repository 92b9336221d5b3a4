//! Periodic refresh loop.
//!
//! Invokes the coordinator on a fixed interval and publishes each outcome
//! to the [`StationBoard`]. One cycle always completes (retries and
//! backoff included) before the next tick is taken.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::board::StationBoard;
use crate::cache::SnapshotStore;
use crate::coordinator::{DataSource, RefreshCoordinator};
use crate::feed::FeedSource;

/// Run one cycle and publish its outcome. Returns whether data is being
/// served afterwards (live or cached).
pub async fn run_once<S, B>(
    coordinator: &mut RefreshCoordinator<S, B>,
    board: &StationBoard,
) -> bool
where
    S: FeedSource,
    B: SnapshotStore,
{
    let outcome = coordinator.refresh().await;

    match &outcome {
        Ok(refreshed) => match refreshed.source {
            DataSource::Live => info!("Refreshed {} stations", refreshed.stations.len()),
            DataSource::Cached { .. } => {
                debug!("Serving {} cached stations", refreshed.stations.len())
            }
        },
        // Already logged by the coordinator.
        Err(_) => {}
    }

    let served = outcome.is_ok();
    board
        .publish(
            outcome,
            coordinator.status(),
            coordinator.last_error().map(str::to_string),
        )
        .await;
    served
}

/// Refresh forever. The first cycle runs immediately.
pub async fn run_refresh_loop<S, B>(
    mut coordinator: RefreshCoordinator<S, B>,
    interval: Duration,
    board: StationBoard,
) where
    S: FeedSource,
    B: SnapshotStore,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_once(&mut coordinator, &board).await;
    }
}
