use std::path::PathBuf;
use thiserror::Error;

/// A lifecycle edge that is not in the instrument's transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{instrument}: illegal transition {from} -> {to}")]
    Illegal {
        instrument: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

/// Microphone and encoding failures. Fatal to the current attempt only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Microphone access was denied. Please enable it in your system settings.")]
    PermissionDenied,
    #[error("Audio recording is not supported in this environment: {0}")]
    Unsupported(String),
    #[error("No input device available")]
    NoDevice,
    #[error("audio stream failed: {0}")]
    Stream(String),
    #[error("failed to encode recording: {0}")]
    Encode(String),
}

/// Rejected synchronously. No external call is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A signed-in session is required to run the assessment.")]
    NoActiveSession,
    #[error("Enter the words you recall before submitting.")]
    EmptyRecall,
    #[error("Audio or transcript is required for speech analysis.")]
    EmptySpeechInput,
    #[error("Stop the recording before submitting it for analysis.")]
    RecordingInProgress,
    #[error("Complete the speech analysis before calculating a risk score.")]
    MissingSpeechArtifact,
    #[error("Complete the cognitive task before calculating a risk score.")]
    MissingRecallSummary,
    #[error("Enter an answer before submitting.")]
    EmptyAnswer,
    #[error("'{0}' is not a whole number.")]
    NotAnInteger(String),
    #[error("There is no risk assessment to export yet.")]
    NothingToExport,
}

/// Failures talking to the reasoning service. Never shown to users verbatim.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service responded with HTTP {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response is missing the flow result")]
    MissingResult,
    #[error("risk score {0} is outside 0..=100")]
    ScoreOutOfRange(f64),
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Anything an instrument operation can reject with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
