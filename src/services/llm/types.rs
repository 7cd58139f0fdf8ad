use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// The three stateless operations offered by the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    CognitiveTaskAnalysis,
    SpeechAnalysis,
    RiskScoring,
}

impl OperationKind {
    /// Flow endpoint name on the reasoning service.
    pub fn flow_name(self) -> &'static str {
        match self {
            OperationKind::CognitiveTaskAnalysis => "analyzeCognitiveTaskPerformanceFlow",
            OperationKind::SpeechAnalysis => "analyzeSpeechForCognitiveDeclineFlow",
            OperationKind::RiskScoring => "generateDementiaRiskScoreFlow",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationKind::CognitiveTaskAnalysis => "cognitive_task_analysis",
            OperationKind::SpeechAnalysis => "speech_analysis",
            OperationKind::RiskScoring => "risk_scoring",
        }
    }

    /// Uniform user-facing message for any service-side failure of this operation.
    pub fn failure_message(self) -> &'static str {
        match self {
            OperationKind::CognitiveTaskAnalysis => {
                "An unexpected error occurred during cognitive task analysis. Please try again later."
            }
            OperationKind::SpeechAnalysis => {
                "An unexpected error occurred during speech analysis. Please try again later."
            }
            OperationKind::RiskScoring => {
                "An unexpected error occurred while generating the risk score. Please try again later."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveAnalysisRequest {
    pub performance_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveAnalysis {
    pub analysis: String,
}

/// Either field may be empty, but not both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAnalysisRequest {
    #[serde(default)]
    pub audio_data_uri: String,
    #[serde(default)]
    pub transcript: String,
}

impl SpeechAnalysisRequest {
    pub fn has_audio(&self) -> bool {
        !self.audio_data_uri.trim().is_empty()
    }

    pub fn has_transcript(&self) -> bool {
        !self.transcript.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_audio() && !self.has_transcript()
    }
}

/// Speech-analysis output, owned by the orchestrator once the call succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechArtifact {
    pub cognitive_decline_indicators: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoringRequest {
    pub cognitive_task_performance: String,
    pub speech_patterns: String,
    pub behavioral_data: String,
}

/// Risk-scoring payload exactly as the service returns it, before range checks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRiskAssessment {
    pub risk_score: f64,
    pub risk_factors: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub risk_factors: String,
    pub recommendations: String,
}

impl RiskAssessment {
    pub fn band(&self) -> RiskBand {
        RiskBand::for_score(self.risk_score)
    }
}

impl TryFrom<RawRiskAssessment> for RiskAssessment {
    type Error = ServiceError;

    /// All-or-nothing: a score that is not a finite number in 0..=100 rejects the whole payload.
    fn try_from(raw: RawRiskAssessment) -> Result<Self, Self::Error> {
        if !raw.risk_score.is_finite() || !(0.0..=100.0).contains(&raw.risk_score) {
            return Err(ServiceError::ScoreOutOfRange(raw.risk_score));
        }
        Ok(Self {
            risk_score: raw.risk_score.round() as u8,
            risk_factors: raw.risk_factors,
            recommendations: raw.recommendations,
        })
    }
}

/// Display banding for a risk score. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Elevated,
    High,
}

impl RiskBand {
    pub fn for_score(score: u8) -> Self {
        if score > 75 {
            RiskBand::High
        } else if score > 50 {
            RiskBand::Elevated
        } else {
            RiskBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Elevated => "elevated",
            RiskBand::High => "high",
        }
    }
}
