mod description;
mod peer;
mod room;
mod signaling;

pub use description::{IceCandidate, SdpType, SessionDescription};
pub use peer::PeerId;
pub use room::RoomId;
pub use signaling::{IceServerConfig, MessageError, SignalingMessage};
