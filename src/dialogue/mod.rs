//! Streaming dialogue I/O engine
//!
//! Two coordinated pipelines make up a speech turn:
//!
//! ```text
//! token stream → SentenceSplitter → SynthesisDispatcher → OrderedPlaybackQueue → speaker
//! microphone   → RecordingSession → transcript channel  → Segmenter/TurnTimer  → utterances
//! ```
//!
//! Playback strictly follows text order even though synthesis completes
//! out of order, and a turn ends automatically once the speaker falls
//! silent past the minimum window.

mod dispatcher;
mod orchestrator;
mod playback_queue;
mod segmenter;
mod session;
mod splitter;
mod timer;

pub use dispatcher::{MIN_AUDIO_BYTES, SynthesisDispatcher, SynthesisResult};
pub use orchestrator::SpeechTurn;
pub use playback_queue::{OrderedPlaybackQueue, PlaybackDriver};
pub use segmenter::{RecumulatingSegmenter, Segmenter};
pub use session::{AnswerOutcome, RecordingHandle, RecordingSession, TurnState};
pub use splitter::{SentenceSplitter, TextUnit};
pub use timer::{TimerState, TurnTimer};
