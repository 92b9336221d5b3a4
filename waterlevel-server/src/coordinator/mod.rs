//! Refresh coordinator.
//!
//! Each cycle fetches the feed (with retries), parses it and writes the
//! result through to the cache. When the fetch fails the coordinator
//! serves the last-good snapshot if it is still within the retention
//! window, and reports a hard failure otherwise.
//!
//! ```text
//!   HEALTHY  --fetch fails, cache fresh-->  DEGRADED
//!   HEALTHY  --fetch fails, no cache----->  FAILED
//!   any      --fetch succeeds------------>  HEALTHY
//! ```

mod error;
mod refresh;


pub use error::UpdateFailed;
pub use refresh::{
    ApiState, CoordinatorStatus, DataSource, RefreshCoordinator, Refreshed, should_warn,
};
