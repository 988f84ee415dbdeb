use crate::error::PlatformError;
use crate::platform::{MediaConstraints, MediaStream, PeerConnection, PeerEvent, RtcConfig};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// What the selected platform reports about itself at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDetails {
    pub name: String,
    pub version: String,
}

/// Where a stream is rendered.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum MediaView {
    Local,
    Remote,
}

impl fmt::Display for MediaView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local view"),
            Self::Remote => f.write_str("remote view"),
        }
    }
}

/// Uniform access to the WebRTC engine, media capture and rendering.
///
/// One implementation is picked at startup and shared by everything that
/// negotiates a call.
#[async_trait]
pub trait Platform: Send + Sync {
    fn details(&self) -> PlatformDetails;

    /// Creates a peer connection. Engine callbacks for it are delivered on `events`.
    async fn create_peer_connection(
        &self,
        config: &RtcConfig,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>, PlatformError>;

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError>;

    fn attach_stream(&self, view: MediaView, stream: &MediaStream);
}
