mod channel;
mod router;
mod router_command;
mod signaling_output;

pub use channel::*;
pub use router::*;
pub use router_command::*;
pub use signaling_output::*;
