mod call;
mod error;
mod platform;
mod session;
mod signaling;
mod ui;

pub use call::*;
pub use error::*;
pub use platform::*;
pub use session::*;
pub use signaling::*;
pub use ui::*;
