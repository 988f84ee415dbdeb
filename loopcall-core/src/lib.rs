pub mod model;

pub use model::{
    IceCandidate, IceServerConfig, MessageError, PeerId, RoomId, SdpType, SessionDescription,
    SignalingMessage,
};
