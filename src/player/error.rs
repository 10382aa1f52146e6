use std::fmt;

/// Failures of the handle-to-player channel. The player itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The player task has exited
    ChannelClosed,
    /// The command queue is at capacity (`try_command` only)
    ChannelFull,
    /// The player dropped a query responder without answering
    ResponseDropped,
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerError::ChannelClosed => write!(f, "Player channel closed"),
            PlayerError::ChannelFull => write!(f, "Player channel full"),
            PlayerError::ResponseDropped => write!(f, "Player dropped the response"),
        }
    }
}

impl std::error::Error for PlayerError {}
