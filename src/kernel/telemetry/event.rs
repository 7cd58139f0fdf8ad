use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, ValidationError};
use crate::services::llm::types::OperationKind;

// Allowed: state labels, operation kinds, outcomes, durations, counts, the numeric risk score.
// Forbidden: recalled words, transcripts, audio, analysis or recommendation text.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    InstrumentTransition {
        instrument: String,
        from: String,
        to: String,
    },

    ExternalCall {
        operation: OperationKind,
        outcome: CallOutcome,
        latency_ms: u64,
    },

    DeviceFailure {
        kind: DeviceFailureKind,
    },

    ValidationRejected {
        kind: RejectionKind,
    },

    RiskScored {
        score: u8,
    },

    ExportAttempt {
        succeeded: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    Succeeded,
    Failed,
    /// Short-circuited locally before contacting the service.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFailureKind {
    PermissionDenied,
    Unsupported,
    NoDevice,
    Stream,
    Encode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    NoActiveSession,
    EmptyRecall,
    EmptySpeechInput,
    RecordingInProgress,
    MissingSpeechArtifact,
    MissingRecallSummary,
    EmptyAnswer,
    NotAnInteger,
    NothingToExport,
}

impl From<&DeviceError> for DeviceFailureKind {
    fn from(err: &DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied => DeviceFailureKind::PermissionDenied,
            DeviceError::Unsupported(_) => DeviceFailureKind::Unsupported, // Detail STRIPPED
            DeviceError::NoDevice => DeviceFailureKind::NoDevice,
            DeviceError::Stream(_) => DeviceFailureKind::Stream,
            DeviceError::Encode(_) => DeviceFailureKind::Encode,
        }
    }
}

impl From<&ValidationError> for RejectionKind {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::NoActiveSession => RejectionKind::NoActiveSession,
            ValidationError::EmptyRecall => RejectionKind::EmptyRecall,
            ValidationError::EmptySpeechInput => RejectionKind::EmptySpeechInput,
            ValidationError::RecordingInProgress => RejectionKind::RecordingInProgress,
            ValidationError::MissingSpeechArtifact => RejectionKind::MissingSpeechArtifact,
            ValidationError::MissingRecallSummary => RejectionKind::MissingRecallSummary,
            ValidationError::EmptyAnswer => RejectionKind::EmptyAnswer,
            ValidationError::NotAnInteger(_) => RejectionKind::NotAnInteger, // Input STRIPPED
            ValidationError::NothingToExport => RejectionKind::NothingToExport,
        }
    }
}
