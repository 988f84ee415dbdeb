mod peer_endpoint;
mod session_config;
mod session_context;

pub use peer_endpoint::*;
pub use session_config::*;
pub use session_context::*;
