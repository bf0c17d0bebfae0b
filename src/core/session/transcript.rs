use tokio::time::Instant;

/// One recognized text fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub text: String,
    pub received_at: Instant,
}

/// Fragments recognized since the last turn, in arrival order
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    fragments: Vec<TranscriptFragment>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, received_at: Instant) {
        self.fragments.push(TranscriptFragment {
            text: text.into(),
            received_at,
        });
    }

    /// Take the most recent fragment and clear the rest.
    ///
    /// Recognizers re-send the whole sentence as it grows, so the last
    /// fragment is the complete utterance.
    pub fn take_last(&mut self) -> Option<String> {
        let last = self.fragments.pop().map(|f| f.text);
        self.fragments.clear();
        last
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
