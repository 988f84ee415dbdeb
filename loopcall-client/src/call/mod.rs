mod loopback_call;

pub use loopback_call::*;
