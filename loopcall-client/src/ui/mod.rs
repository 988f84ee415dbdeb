mod transcript;
mod ui_sink;

pub use transcript::ChatTranscript;
pub use ui_sink::{CallControls, UiSink};
