//! Pipeline-specific error types.
//!
//! Every fitting operation reports its outcome synchronously to the immediate
//! caller. Nothing in here is fatal: a failed write leaves the fitting usable.

use thiserror::Error;

/// Errors that can occur within the pipeline system.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// `connect` on a fitting whose output slot is already taken.
    #[error("Output already connected")]
    AlreadyConnected,

    /// `connect` on a terminal fitting (listener).
    #[error("Fitting is terminal and cannot be connected")]
    Terminal,

    /// `write` on a fitting with nothing downstream.
    #[error("No output connected")]
    NotConnected,

    /// The filter function declined the message.
    #[error("Message rejected by filter '{filter}'")]
    Rejected { filter: String },

    /// The filter function failed while inspecting the message.
    #[error("Filter '{filter}' failed: {message}")]
    FilterFailed { filter: String, message: String },

    /// A fitting received a message kind it has no handling for.
    #[error("{fitting} cannot handle message type {message_type}")]
    UnsupportedMessage {
        fitting: &'static str,
        message_type: String,
    },

    /// One or more outputs failed during a fan-out or flush. All were attempted.
    #[error("Delivery failed for {failed} of {attempted} messages")]
    Delivery { failed: usize, attempted: usize },

    /// A channel-backed listener whose receiver has been dropped.
    #[error("Listener channel closed")]
    ListenerClosed,

    #[error("Pipe name '{0}' is already registered")]
    NameTaken(String),

    #[error("Unknown pipe direction '{0}'")]
    UnknownDirection(String),

    #[error("'{0}' is not a registered input pipe")]
    NotInputPipe(String),

    #[error("'{0}' is not a registered output pipe")]
    NotOutputPipe(String),

    #[error("Script error: {0}")]
    Script(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_names_filter() {
        let err = PipelineError::Rejected {
            filter: "scale".to_string(),
        };
        assert_eq!(err.to_string(), "Message rejected by filter 'scale'");
    }

    #[test]
    fn test_delivery_counts() {
        let err = PipelineError::Delivery {
            failed: 1,
            attempted: 4,
        };
        assert!(err.to_string().contains("1 of 4"));
    }
}
