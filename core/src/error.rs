use thiserror::Error;

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError(format!("request timed out: {e}"))
        } else {
            TransportError(e.to_string())
        }
    }
}

/// Everything that can go wrong while pulling assets out of one source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} fetch failed ({status}): {excerpt}")]
    Fetch {
        source_name: String,
        status: u16,
        excerpt: String,
    },
    #[error("{source_name} returned unexpected JSON: {detail}")]
    Schema { source_name: String, detail: String },
    #[error("{source_name} record could not be normalized: {reason}")]
    Normalization { source_name: String, reason: String },
    #[error("{source_name} request failed: {error}")]
    Transport {
        source_name: String,
        error: TransportError,
    },
}

impl SourceError {
    pub fn source_name(&self) -> &str {
        match self {
            SourceError::Fetch { source_name, .. }
            | SourceError::Schema { source_name, .. }
            | SourceError::Normalization { source_name, .. }
            | SourceError::Transport { source_name, .. } => source_name,
        }
    }

    /// HTTP status for fetch failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The diagnostic without the leading source name, for output that already shows it.
    pub fn detail(&self) -> String {
        match self {
            SourceError::Fetch { status, excerpt, .. } => format!("fetch failed ({status}): {excerpt}"),
            SourceError::Schema { detail, .. } => format!("returned unexpected JSON: {detail}"),
            SourceError::Normalization { reason, .. } => format!("record could not be normalized: {reason}"),
            SourceError::Transport { error, .. } => format!("request failed: {error}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Fetch { .. } => "fetch",
            SourceError::Schema { .. } => "schema",
            SourceError::Normalization { .. } => "normalize",
            SourceError::Transport { .. } => "transport",
        }
    }
}
