use crate::models::transcript::{Role, TranscriptMessage};

/// Ordered conversation log for one call attempt. Entries are only ever appended;
/// `clear` drops the whole log when a call is restarted.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<TranscriptMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(TranscriptMessage::new(role, content));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    /// Content of the newest entry, shown as the live caption.
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
