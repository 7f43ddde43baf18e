//! Utterance finalization from cumulative partial transcripts

/// Turns a stream of cumulative partial transcripts into finalized
/// utterances
///
/// Kept behind a trait because boundary detection is heuristic: an upstream
/// API with explicit utterance-boundary markers can be substituted without
/// touching the recording session.
pub trait Segmenter: Send {
    /// Feed the next cumulative partial; returns the utterance this partial
    /// finalized, if any
    fn push(&mut self, partial: &str) -> Option<String>;

    /// Finalize the trailing buffer at end of stream
    fn finish(&mut self) -> Option<String>;
}

/// Segments utterances by watching the recognizer restart its cumulative
/// buffer
///
/// The upstream service sends cumulative text for the current utterance and
/// starts over when it decides a new utterance has begun. A partial that is
/// shorter than its predecessor (or the same length with different content)
/// therefore marks the predecessor as complete. This is documented upstream
/// behavior, not something derived here.
#[derive(Debug, Default)]
pub struct RecumulatingSegmenter {
    previous: String,
}

impl RecumulatingSegmenter {
    /// Create a new segmenter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Segmenter for RecumulatingSegmenter {
    fn push(&mut self, partial: &str) -> Option<String> {
        if partial.is_empty() {
            return None;
        }
        if partial == self.previous {
            return None;
        }

        let mut finalized = None;
        if !self.previous.is_empty() {
            let current_len = partial.chars().count();
            let previous_len = self.previous.chars().count();

            // The cumulative buffer restarted: the previous partial was the
            // complete utterance
            if current_len <= previous_len {
                let utterance = self.previous.trim();
                if !utterance.is_empty() {
                    finalized = Some(utterance.to_string());
                }
            }
        }

        self.previous = partial.to_string();
        finalized
    }

    fn finish(&mut self) -> Option<String> {
        let utterance = self.previous.trim().to_string();
        self.previous.clear();
        (!utterance.is_empty()).then_some(utterance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a full partial sequence through a fresh segmenter
    fn segment(partials: &[&str]) -> Vec<String> {
        let mut segmenter = RecumulatingSegmenter::new();
        let mut out: Vec<String> = partials.iter().filter_map(|p| segmenter.push(p)).collect();
        out.extend(segmenter.finish());
        out
    }

    #[test]
    fn finalizes_on_buffer_restart() {
        let mut segmenter = RecumulatingSegmenter::new();
        assert_eq!(segmenter.push("a"), None);
        assert_eq!(segmenter.push("ab"), None);
        assert_eq!(segmenter.push("abc"), None);
        // Shorter than the previous partial: "abc" was complete
        assert_eq!(segmenter.push("a"), Some("abc".to_string()));
        assert_eq!(segmenter.push("ab"), None);
        assert_eq!(segmenter.finish(), Some("ab".to_string()));
    }

    #[test]
    fn equal_length_different_content_restarts() {
        assert_eq!(segment(&["he", "hello", "bye"]), vec!["hello", "bye"]);
    }

    #[test]
    fn repeated_partials_are_noops() {
        assert_eq!(segment(&["hi", "hi", "hi there"]), vec!["hi there"]);
    }

    #[test]
    fn empty_partials_are_ignored() {
        assert_eq!(segment(&["", "hi", "", "hi there"]), vec!["hi there"]);
    }

    #[test]
    fn utterances_are_trimmed_earlier_partials() {
        let partials = ["  one  ", "x"];
        let out = segment(&partials);
        assert_eq!(out, vec!["one", "x"]);
        // Every finalized utterance equals some earlier partial, trimmed
        for utterance in &out {
            assert!(partials.iter().any(|p| p.trim() == utterance));
        }
    }

    #[test]
    fn output_never_longer_than_input() {
        let cases: [&[&str]; 4] = [
            &[],
            &["a"],
            &["a", "ab", "abc"],
            &["x", "y", "z", "zz", "q"],
        ];
        for partials in cases {
            assert!(segment(partials).len() <= partials.len());
        }
    }

    #[test]
    fn finish_on_empty_stream() {
        let mut segmenter = RecumulatingSegmenter::new();
        assert_eq!(segmenter.finish(), None);
    }
}
