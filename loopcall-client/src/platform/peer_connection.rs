use crate::error::PlatformError;
use crate::platform::{MediaStream, OfferOptions};
use async_trait::async_trait;
use loopcall_core::{IceCandidate, PeerId, SessionDescription};

/// Async face of an `RTCPeerConnection`.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    fn id(&self) -> PeerId;

    /// Adds every track of `stream` for sending.
    async fn add_stream(&self, stream: &MediaStream) -> Result<(), PlatformError>;

    async fn create_offer(
        &self,
        options: &OfferOptions,
    ) -> Result<SessionDescription, PlatformError>;

    async fn create_answer(&self) -> Result<SessionDescription, PlatformError>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PlatformError>;

    async fn set_remote_description(&self, desc: SessionDescription)
    -> Result<(), PlatformError>;

    async fn has_remote_description(&self) -> bool;

    /// Fails when no remote description has been applied yet.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PlatformError>;

    async fn close(&self) -> Result<(), PlatformError>;
}
