//! Coordinator error types.

/// A refresh cycle that produced no data: the fetch failed and no cached
/// snapshot was fresh enough to serve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Error fetching data from {url}: {last_error} \
     (failed {failures} times, no valid cached data available)"
)]
pub struct UpdateFailed {
    /// Endpoint that was fetched
    pub url: String,
    /// Consecutive failed cycles, including this one
    pub failures: u32,
    /// Description of the last fetch error
    pub last_error: String,
}
