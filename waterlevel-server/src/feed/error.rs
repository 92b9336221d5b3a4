//! Feed fetch error types.

/// Errors from a single attempt to fetch the feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The attempt exceeded its timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established or the body could not be read
    #[error("connection error: {0}")]
    Connection(String),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Body was not valid JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// Timeouts, connection failures and 5xx responses are transient. Any
    /// other status and undecodable bodies are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Connection(_) => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::Json { .. } => false,
        }
    }

    /// The HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else {
            FetchError::Connection(err.to_string())
        }
    }
}
