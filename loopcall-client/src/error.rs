use loopcall_core::MessageError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    /// Media capture refused. `name` follows the DOMException names (`NotAllowedError`, ...).
    #[error("{name}: {reason}")]
    MediaUnavailable { name: &'static str, reason: String },

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("peer connection is closed")]
    Closed,
}

impl PlatformError {
    /// Short error name, as shown in the `getUserMedia() error: <name>` alert.
    pub fn name(&self) -> &str {
        match self {
            Self::WebRtc(_) => "OperationError",
            Self::MediaUnavailable { name, .. } => name,
            Self::InvalidDescription(_) => "InvalidAccessError",
            Self::InvalidState(_) | Self::Closed => "InvalidStateError",
        }
    }
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("{step} timed out after {timeout:?}")]
    Timeout {
        step: &'static str,
        timeout: Duration,
    },
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("no active session")]
    NoSession,
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("the {0} control is disabled")]
    ControlDisabled(&'static str),

    #[error("no local stream, start the call first")]
    NotStarted,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
