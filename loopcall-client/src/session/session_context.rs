use crate::platform::MediaStream;
use crate::session::PeerEndpoint;
use std::sync::Arc;

/// State of one call on the legacy path: the single peer connection, its role
/// and the media attached to it. Lives from session start until hangup.
pub struct SessionContext {
    endpoint: Arc<PeerEndpoint>,
    initiator: bool,
    local_stream: MediaStream,
    remote_stream_id: Option<String>,
}

impl SessionContext {
    pub fn new(endpoint: Arc<PeerEndpoint>, initiator: bool, local_stream: MediaStream) -> Self {
        Self {
            endpoint,
            initiator,
            local_stream,
            remote_stream_id: None,
        }
    }

    pub fn endpoint(&self) -> &Arc<PeerEndpoint> {
        &self.endpoint
    }

    pub fn is_initiator(&self) -> bool {
        self.initiator
    }

    pub fn local_stream(&self) -> &MediaStream {
        &self.local_stream
    }

    pub fn remote_stream_id(&self) -> Option<&str> {
        self.remote_stream_id.as_deref()
    }

    /// Records the remote stream; returns false if it was already the current one.
    pub fn replace_remote_stream(&mut self, stream_id: &str) -> bool {
        if self.remote_stream_id.as_deref() == Some(stream_id) {
            return false;
        }
        self.remote_stream_id = Some(stream_id.to_owned());
        true
    }
}
