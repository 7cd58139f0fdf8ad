use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audio::source::AudioSource;
use crate::config::ScreeningConfig;
use crate::error::{ExportError, InstrumentError, ServiceError, ValidationError};
use crate::instruments::pattern::{default_puzzles, PatternQuiz};
use crate::instruments::recall::{RecallOutcome, WordRecall};
use crate::instruments::speech::SpeechInstrument;
use crate::kernel::result::OperationResult;
use crate::kernel::session::SessionContext;
use crate::kernel::telemetry::event::{RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;
use crate::kernel::time::{Clock, SystemClock};
use crate::orchestrator::report::JsonReportRenderer;
use crate::orchestrator::Orchestrator;
use crate::services::llm::types::{RiskAssessment, SpeechArtifact};
use crate::services::llm::{HttpReasoningService, ReasoningClient, ReasoningService};

/// One user's screening: the three instruments, the orchestrator, and the session they run under.
///
/// Instruments are reachable only while the session is active. The orchestrator checks the
/// session again on its own.
pub struct Screening {
    config: ScreeningConfig,
    session: SessionContext,
    telemetry: Telemetry,
    client: ReasoningClient,

    recall: WordRecall,
    speech: SpeechInstrument,
    pattern: PatternQuiz,
    orchestrator: Orchestrator,
}

impl Screening {
    pub fn new(
        config: ScreeningConfig,
        session: SessionContext,
        service: Arc<dyn ReasoningService>,
        source: Box<dyn AudioSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let telemetry = Telemetry::new();
        let client = ReasoningClient::new(service, telemetry.clone());

        let recall = WordRecall::new(config.recall.clone(), clock, telemetry.clone());
        let speech = SpeechInstrument::new(source, telemetry.clone());
        let pattern = PatternQuiz::new(default_puzzles(), telemetry.clone());
        let orchestrator = Orchestrator::new(
            session.clone(),
            client.clone(),
            config.behavioral_data.clone(),
            telemetry.clone(),
        );

        Self {
            config,
            session,
            telemetry,
            client,
            recall,
            speech,
            pattern,
            orchestrator,
        }
    }

    /// Wires the HTTP reasoning service and the wall clock.
    pub fn connect(
        config: ScreeningConfig,
        session: SessionContext,
        source: Box<dyn AudioSource>,
    ) -> Result<Self, ServiceError> {
        let service = HttpReasoningService::new(&config.service)?;
        info!(service = %config.service.base_url, "reasoning service configured");
        Ok(Self::new(
            config,
            session,
            Arc::new(service),
            source,
            Arc::new(SystemClock::new()),
        ))
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn client(&self) -> &ReasoningClient {
        &self.client
    }

    pub fn recall(&mut self) -> Result<&mut WordRecall, ValidationError> {
        self.gate()?;
        Ok(&mut self.recall)
    }

    pub fn speech(&mut self) -> Result<&mut SpeechInstrument, ValidationError> {
        self.gate()?;
        Ok(&mut self.speech)
    }

    pub fn pattern(&mut self) -> Result<&mut PatternQuiz, ValidationError> {
        self.gate()?;
        Ok(&mut self.pattern)
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Scores the recall input, runs the cognitive-task analysis, and hands the
    /// performance summary to the orchestrator.
    pub async fn submit_recall(&mut self, input: &str) -> Result<RecallOutcome, InstrumentError> {
        self.gate()?;
        let outcome = self.recall.submit_and_analyze(input, &self.client).await?;
        self.orchestrator.accept_recall(&outcome.artifact);
        Ok(outcome.clone())
    }

    /// Runs speech analysis on the current recording and/or `transcript`. A success fills the
    /// orchestrator's speech slot.
    pub async fn analyze_speech(
        &mut self,
        transcript: &str,
    ) -> Result<OperationResult<SpeechArtifact>, ValidationError> {
        self.gate()?;
        let result = self.speech.analyze(transcript, &self.client).await;
        self.orchestrator.accept_speech(result.clone());
        Ok(result)
    }

    pub async fn score_risk(&mut self) -> OperationResult<RiskAssessment> {
        self.orchestrator.score_risk().await
    }

    /// Writes the report as JSON under the configured report directory.
    pub fn export(&self) -> Result<PathBuf, ExportError> {
        let renderer = JsonReportRenderer::new(self.config.report_dir.clone());
        self.orchestrator.export(&renderer)
    }

    fn gate(&self) -> Result<(), ValidationError> {
        self.session.require_active().map_err(|err| {
            warn!("instrument access without an active session");
            self.telemetry.record(TelemetryEvent::ValidationRejected {
                kind: RejectionKind::from(&err),
            });
            err
        })
    }
}
