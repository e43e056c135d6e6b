use thiserror::Error;

/// Failures surfaced by console operations.
///
/// Missing optional markup is never an error: extractors fall back to empty
/// values and only the variants below reach the caller.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("console responded with HTTP {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("request to {path} timed out")]
    Timeout { path: String },

    #[error("request to {path} was cancelled")]
    Cancelled { path: String },

    #[error("request worker for {path} stopped without a response")]
    Interrupted { path: String },

    #[error("response is not a markup document: {0}")]
    Parse(String),

    #[error("empty response from console for {path}")]
    EmptyResponse { path: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("expected page fragment is missing: {0}")]
    MissingContainer(&'static str),

    #[error("failed to decode JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid console configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
