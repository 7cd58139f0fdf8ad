#[cfg(feature = "microphone")]
pub mod capture;
pub mod mock;
pub mod source;
pub mod wav;

#[cfg(feature = "microphone")]
pub use capture::CpalMicrophone;
pub use source::{AudioSource, CaptureStream, StreamFormat};
pub use wav::AudioRecording;
