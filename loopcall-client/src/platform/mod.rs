mod capability;
mod media;
mod native;
mod peer_connection;
mod peer_event;
mod platform_config;

pub use capability::*;
pub use media::*;
pub use native::*;
pub use peer_connection::*;
pub use peer_event::*;
pub use platform_config::*;
