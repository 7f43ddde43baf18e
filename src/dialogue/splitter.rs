//! Sentence splitting over a live token stream

/// Sentence-terminal markers, CJK and ASCII
const TERMINALS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

/// A sentence-sized span of generated text slated for synthesis
///
/// `seq` establishes the intended playback order and is strictly
/// increasing from 0 in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Playback sequence number
    pub seq: u64,
    /// Sentence text
    pub text: String,
}

/// Splits an append-only stream of text fragments into [`TextUnit`]s
///
/// A unit closes at each sentence-terminal marker; whatever is left in the
/// accumulator at end of stream becomes the final unit.
#[derive(Debug, Default)]
pub struct SentenceSplitter {
    buffer: String,
    next_seq: u64,
}

impl SentenceSplitter {
    /// Create a new splitter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next fragment, returning any units it completed
    pub fn push(&mut self, fragment: &str) -> Vec<TextUnit> {
        let mut units = Vec::new();
        for ch in fragment.chars() {
            self.buffer.push(ch);
            if TERMINALS.contains(&ch) {
                units.extend(self.take_unit());
            }
        }
        units
    }

    /// Flush the trailing accumulator at end of stream
    pub fn finish(&mut self) -> Option<TextUnit> {
        self.take_unit()
    }

    /// Number of units emitted so far
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.next_seq
    }

    fn take_unit(&mut self) -> Option<TextUnit> {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        Some(TextUnit { seq, text })
    }
}
