mod native_connection;
mod native_platform;
mod sample_pump;

pub use native_connection::NativePeerConnection;
pub use native_platform::NativePlatform;
