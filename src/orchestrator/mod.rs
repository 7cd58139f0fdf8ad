pub mod report;

use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{ExportError, ValidationError};
use crate::instruments::recall::RecallArtifact;
use crate::kernel::result::OperationResult;
use crate::kernel::session::SessionContext;
use crate::kernel::telemetry::event::{RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;
use crate::services::llm::types::{RiskAssessment, RiskScoringRequest, SpeechArtifact};
use crate::services::llm::ReasoningClient;
use report::{ReportRenderer, ScreeningReport};

/// Which inputs the risk score is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub speech: bool,
    pub recall: bool,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.speech && self.recall
    }

    fn missing(&self) -> Option<ValidationError> {
        if !self.speech {
            Some(ValidationError::MissingSpeechArtifact)
        } else if !self.recall {
            Some(ValidationError::MissingRecallSummary)
        } else {
            None
        }
    }
}

/// Aggregates instrument outputs into one risk assessment.
///
/// Each slot is overwritten wholesale by the next run that fills it. The pattern quiz
/// has no slot here.
pub struct Orchestrator {
    session: SessionContext,
    client: ReasoningClient,
    behavioral_data: String,
    telemetry: Telemetry,

    speech: Option<SpeechArtifact>,
    recall_summary: Option<String>,
    assessment: Option<RiskAssessment>,
}

impl Orchestrator {
    pub fn new(
        session: SessionContext,
        client: ReasoningClient,
        behavioral_data: impl Into<String>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            session,
            client,
            behavioral_data: behavioral_data.into(),
            telemetry,
            speech: None,
            recall_summary: None,
            assessment: None,
        }
    }

    /// Stores a successful speech analysis. A failure leaves the slot as it was.
    ///
    /// Refilling either slot drops the current assessment; it no longer matches its inputs.
    pub fn accept_speech(&mut self, result: OperationResult<SpeechArtifact>) -> bool {
        match result {
            OperationResult::Succeeded(artifact) => {
                self.speech = Some(artifact);
                self.assessment = None;
                info!("speech artifact stored");
                true
            }
            OperationResult::Failed(_) => false,
        }
    }

    pub fn accept_recall(&mut self, artifact: &RecallArtifact) {
        self.accept_recall_summary(artifact.performance_summary());
    }

    pub fn accept_recall_summary(&mut self, summary: String) {
        self.recall_summary = Some(summary);
        self.assessment = None;
        info!("recall summary stored");
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            speech: self.speech.is_some(),
            recall: self.recall_summary.is_some(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness().is_ready()
    }

    pub fn speech(&self) -> Option<&SpeechArtifact> {
        self.speech.as_ref()
    }

    pub fn recall_summary(&self) -> Option<&str> {
        self.recall_summary.as_deref()
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        self.assessment.as_ref()
    }

    /// Builds the aggregated request, or the reason it cannot be built yet.
    pub fn risk_request(&self) -> Result<RiskScoringRequest, ValidationError> {
        self.session.require_active()?;
        match (&self.speech, &self.recall_summary) {
            (Some(speech), Some(summary)) => Ok(RiskScoringRequest {
                cognitive_task_performance: summary.clone(),
                speech_patterns: speech.cognitive_decline_indicators.clone(),
                behavioral_data: self.behavioral_data.clone(),
            }),
            _ => Err(self
                .readiness()
                .missing()
                .unwrap_or(ValidationError::MissingSpeechArtifact)),
        }
    }

    /// Discards any previous assessment, then scores again from the current slots.
    pub async fn score_risk(&mut self) -> OperationResult<RiskAssessment> {
        self.assessment = None;

        let request = match self.risk_request() {
            Ok(request) => request,
            Err(err) => {
                warn!(reason = %err, "risk scoring not ready");
                self.reject(&err);
                return OperationResult::failed(err.to_string());
            }
        };

        let result = self.client.score_risk(&request).await;
        if let OperationResult::Succeeded(assessment) = &result {
            info!(
                score = assessment.risk_score,
                band = assessment.band().label(),
                "risk assessment ready"
            );
            self.telemetry.record(TelemetryEvent::RiskScored {
                score: assessment.risk_score,
            });
            self.assessment = Some(assessment.clone());
        }
        result
    }

    /// Snapshot of the current assessment and both inputs.
    pub fn report(&self) -> Result<ScreeningReport, ValidationError> {
        match (&self.assessment, &self.speech, &self.recall_summary) {
            (Some(risk), Some(speech), Some(summary)) => Ok(ScreeningReport::new(
                risk.clone(),
                speech.clone(),
                summary.clone(),
            )),
            _ => Err(ValidationError::NothingToExport),
        }
    }

    /// Hands the report to `renderer` once. Failures are returned, not retried.
    pub fn export(&self, renderer: &dyn ReportRenderer) -> Result<PathBuf, ExportError> {
        let outcome = self
            .report()
            .map_err(|err| {
                self.reject(&err);
                ExportError::from(err)
            })
            .and_then(|report| renderer.render(&report));

        self.telemetry.record(TelemetryEvent::ExportAttempt {
            succeeded: outcome.is_ok(),
        });
        if let Err(err) = &outcome {
            warn!(error = %err, "report export failed");
        }
        outcome
    }

    fn reject(&self, err: &ValidationError) {
        self.telemetry.record(TelemetryEvent::ValidationRejected {
            kind: RejectionKind::from(err),
        });
    }
}
