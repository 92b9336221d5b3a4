//! Application state for the web layer.

use crate::board::StationBoard;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Latest published refresh outcome
    pub board: StationBoard,
}

impl AppState {
    /// Create a new app state.
    pub fn new(board: StationBoard) -> Self {
        Self { board }
    }
}
