/// Chat area: text is concatenated as received, and every append scrolls to the bottom.
#[derive(Debug, Default, Clone)]
pub struct ChatTranscript {
    content: String,
    scroll_top: usize,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
        self.scroll_top = self.scroll_height();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Height in lines.
    pub fn scroll_height(&self) -> usize {
        self.content.lines().count()
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn is_scrolled_to_bottom(&self) -> bool {
        self.scroll_top == self.scroll_height()
    }
}
