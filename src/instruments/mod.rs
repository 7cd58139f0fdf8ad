pub mod pattern;
pub mod recall;
pub mod scoring;
pub mod speech;

pub use pattern::{PatternQuiz, PatternState};
pub use recall::{RecallState, WordRecall};
pub use speech::{CaptureState, SpeechInstrument};
