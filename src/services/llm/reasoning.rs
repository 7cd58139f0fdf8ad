use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::client::ReasoningService;
use super::types::{
    CognitiveAnalysis, CognitiveAnalysisRequest, OperationKind, RawRiskAssessment,
    RiskAssessment, RiskScoringRequest, SpeechAnalysisRequest, SpeechArtifact,
};
use crate::error::{ServiceError, ValidationError};
use crate::kernel::result::OperationResult;
use crate::kernel::telemetry::event::{CallOutcome, RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;

/// Typed front for the reasoning service. Every call returns an [`OperationResult`];
/// raw service errors are logged here and replaced by a uniform message.
#[derive(Clone)]
pub struct ReasoningClient {
    service: Arc<dyn ReasoningService>,
    telemetry: Telemetry,
}

impl ReasoningClient {
    pub fn new(service: Arc<dyn ReasoningService>, telemetry: Telemetry) -> Self {
        Self { service, telemetry }
    }

    pub async fn analyze_cognitive_task(
        &self,
        request: &CognitiveAnalysisRequest,
    ) -> OperationResult<CognitiveAnalysis> {
        self.call(OperationKind::CognitiveTaskAnalysis, request, Ok).await
    }

    /// Short-circuits without contacting the service when neither audio nor transcript is given.
    pub async fn analyze_speech(
        &self,
        request: &SpeechAnalysisRequest,
    ) -> OperationResult<SpeechArtifact> {
        if request.is_empty() {
            return self.reject(OperationKind::SpeechAnalysis, ValidationError::EmptySpeechInput);
        }
        self.call(OperationKind::SpeechAnalysis, request, Ok).await
    }

    pub async fn score_risk(&self, request: &RiskScoringRequest) -> OperationResult<RiskAssessment> {
        self.call(OperationKind::RiskScoring, request, |raw: RawRiskAssessment| {
            RiskAssessment::try_from(raw)
        })
        .await
    }

    /// request -> await -> tagged result, shared by all three operations.
    async fn call<Req, Resp, Out>(
        &self,
        operation: OperationKind,
        request: &Req,
        convert: impl FnOnce(Resp) -> Result<Out, ServiceError>,
    ) -> OperationResult<Out>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let started = Instant::now();
        let outcome = self.exchange(operation, request).await.and_then(convert);
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                info!(operation = operation.label(), latency_ms, "reasoning call succeeded");
                self.record_call(operation, CallOutcome::Succeeded, latency_ms);
                OperationResult::Succeeded(value)
            }
            Err(err) => {
                warn!(operation = operation.label(), latency_ms, error = %err, "reasoning call failed");
                self.record_call(operation, CallOutcome::Failed, latency_ms);
                OperationResult::failed(operation.failure_message())
            }
        }
    }

    async fn exchange<Req, Resp>(
        &self,
        operation: OperationKind,
        request: &Req,
    ) -> Result<Resp, ServiceError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)?;
        let response = self.service.invoke(operation, payload).await?;
        Ok(serde_json::from_value(response)?)
    }

    fn reject<T>(&self, operation: OperationKind, err: ValidationError) -> OperationResult<T> {
        warn!(operation = operation.label(), reason = %err, "rejected before dispatch");
        self.telemetry.record(TelemetryEvent::ValidationRejected {
            kind: RejectionKind::from(&err),
        });
        self.record_call(operation, CallOutcome::Rejected, 0);
        OperationResult::failed(err.to_string())
    }

    fn record_call(&self, operation: OperationKind, outcome: CallOutcome, latency_ms: u64) {
        self.telemetry.record(TelemetryEvent::ExternalCall {
            operation,
            outcome,
            latency_ms,
        });
    }
}
