use colored::*;
use loopcall_client::{CallControls, ChatTranscript, UiSink};
use loopcall_core::RoomId;
use std::sync::Mutex;

/// Prints what the page would show, prefixed with the side's name.
pub struct TerminalUi {
    name: String,
    transcript: Mutex<ChatTranscript>,
}

impl TerminalUi {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            transcript: Mutex::new(ChatTranscript::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transcript(&self) -> String {
        match self.transcript.lock() {
            Ok(t) => t.content().to_owned(),
            Err(poisoned) => poisoned.into_inner().content().to_owned(),
        }
    }
}

impl UiSink for TerminalUi {
    fn append_chat(&self, text: &str) {
        let mut transcript = match self.transcript.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        transcript.append(text);
        println!("   💬 [{}] {}", self.name.bold(), text);
    }

    fn room_received(&self, room: &RoomId) {
        println!("   🏠 [{}] room {}", self.name.bold(), room.to_string().cyan());
    }

    fn navigate(&self, location: &str) {
        println!("   ↪  [{}] navigating to {}", self.name.bold(), location);
    }

    fn alert(&self, message: &str) {
        eprintln!("   ⚠️  [{}] {}", self.name.bold(), message.red().bold());
    }

    fn set_controls(&self, controls: CallControls) {
        let show = |label: &str, enabled: bool| {
            if enabled {
                label.green().to_string()
            } else {
                label.dimmed().to_string()
            }
        };
        println!(
            "   [{}] {} {} {}",
            self.name.bold(),
            show("Start", controls.start),
            show("Call", controls.call),
            show("Hang Up", controls.hangup)
        );
    }
}
