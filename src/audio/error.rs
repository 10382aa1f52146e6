use std::error::Error;

/// Failures reported by a media backend.
///
/// Only `Source` failures are considered transient: the engine restarts the
/// stream from scratch. Every other class ends the current playback attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Network or stream source failure (manifest, segment fetch, connection drop)
    Source(String),
    /// The renderer could not decode or output the stream
    Renderer(String),
    /// Unexpected internal backend failure
    Unexpected(String),
    Other(String),
}

impl BackendError {
    pub fn is_source(&self) -> bool {
        matches!(self, BackendError::Source(_))
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Source(e) => write!(f, "Source error: {}", e),
            BackendError::Renderer(e) => write!(f, "Renderer error: {}", e),
            BackendError::Unexpected(e) => write!(f, "Unexpected error: {}", e),
            BackendError::Other(e) => write!(f, "Unknown: {}", e),
        }
    }
}

impl Error for BackendError {}
