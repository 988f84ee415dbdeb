use crate::platform::TrackKind;
use loopcall_core::{IceCandidate, PeerId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Completed => "completed",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Remote media announced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

/// Engine callbacks, forwarded into the loop that owns the connection.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    IceCandidate(PeerId, IceCandidate),
    /// The `null` candidate: gathering finished.
    IceGatheringComplete(PeerId),
    IceConnectionStateChanged(PeerId, IceConnectionState),
    Track(PeerId, RemoteTrack),
    Disconnected(PeerId),
}

impl PeerEvent {
    pub fn peer_id(&self) -> PeerId {
        match self {
            Self::IceCandidate(id, _)
            | Self::IceGatheringComplete(id)
            | Self::IceConnectionStateChanged(id, _)
            | Self::Track(id, _)
            | Self::Disconnected(id) => *id,
        }
    }
}
