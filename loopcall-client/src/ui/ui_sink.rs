use loopcall_core::RoomId;

/// Enabled state of the Start / Call / Hang up buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallControls {
    pub start: bool,
    pub call: bool,
    pub hangup: bool,
}

impl Default for CallControls {
    fn default() -> Self {
        Self {
            start: true,
            call: false,
            hangup: false,
        }
    }
}

/// The page the call is shown on.
pub trait UiSink: Send + Sync {
    /// Appends to the chat transcript and scrolls it into view.
    fn append_chat(&self, text: &str);

    fn room_received(&self, room: &RoomId);

    /// Leaves the current page.
    fn navigate(&self, location: &str);

    /// Blocking alert dialog.
    fn alert(&self, message: &str);

    fn set_controls(&self, _controls: CallControls) {}
}
