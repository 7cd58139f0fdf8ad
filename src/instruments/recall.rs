use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::scoring::score_recall;
use crate::config::RecallConfig;
use crate::error::{InstrumentError, TransitionError, ValidationError};
use crate::kernel::lifecycle::{Lifecycle, StateMachine};
use crate::kernel::result::OperationResult;
use crate::kernel::telemetry::event::{RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;
use crate::kernel::time::{Clock, Tick, TICK_MS};
use crate::services::llm::types::{CognitiveAnalysis, CognitiveAnalysisRequest};
use crate::services::llm::ReasoningClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecallState {
    Idle,
    Displaying,
    Recalling,
    Analyzing,
    Results,
}

impl Lifecycle for RecallState {
    const INSTRUMENT: &'static str = "word_recall";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (RecallState::Idle, RecallState::Displaying),
        (RecallState::Displaying, RecallState::Recalling),
        (RecallState::Recalling, RecallState::Analyzing),
        (RecallState::Analyzing, RecallState::Results),
        (RecallState::Results, RecallState::Idle),
    ];

    fn label(self) -> &'static str {
        match self {
            RecallState::Idle => "idle",
            RecallState::Displaying => "displaying",
            RecallState::Recalling => "recalling",
            RecallState::Analyzing => "analyzing",
            RecallState::Results => "results",
        }
    }
}

/// Immutable record of one completed recall run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallArtifact {
    pub words_shown: Vec<String>,
    pub words_recalled_raw: String,
    pub correct_words: Vec<String>,
    pub recall_duration_seconds: f64,
}

impl RecallArtifact {
    pub fn score(&self) -> usize {
        self.correct_words.len()
    }

    pub fn total(&self) -> usize {
        self.words_shown.len()
    }

    /// Free-text normalization handed to the reasoning service and the orchestrator.
    pub fn performance_summary(&self) -> String {
        format!(
            "User was asked to memorize {} words. They took {:.2} seconds to recall them. \
             They correctly recalled {} words. The recalled words were: {}.",
            self.total(),
            self.recall_duration_seconds,
            self.score(),
            self.correct_words.join(", ")
        )
    }
}

/// What the `results` state shows: the artifact plus whichever of analysis or error applies.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallOutcome {
    pub artifact: RecallArtifact,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

pub struct WordRecall {
    machine: StateMachine<RecallState>,
    config: RecallConfig,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    telemetry: Telemetry,

    words: Vec<String>,
    elapsed: Tick,
    recall_started: Option<Duration>,
    pending: Option<RecallArtifact>,
    outcome: Option<RecallOutcome>,
}

impl WordRecall {
    pub fn new(config: RecallConfig, clock: Arc<dyn Clock>, telemetry: Telemetry) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            machine: StateMachine::new(RecallState::Idle, telemetry.clone()),
            config,
            rng,
            clock,
            telemetry,
            words: Vec::new(),
            elapsed: Tick::new(),
            recall_started: None,
            pending: None,
            outcome: None,
        }
    }

    pub fn state(&self) -> RecallState {
        self.machine.state()
    }

    /// Words of the current run, in display order. Empty while idle.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn seconds_remaining(&self) -> u32 {
        if !self.machine.is(RecallState::Displaying) {
            return 0;
        }
        let elapsed = u32::try_from(self.elapsed.frame).unwrap_or(u32::MAX);
        self.config.display_seconds.saturating_sub(elapsed)
    }

    pub fn outcome(&self) -> Option<&RecallOutcome> {
        self.outcome.as_ref()
    }

    pub fn artifact(&self) -> Option<&RecallArtifact> {
        self.outcome.as_ref().map(|outcome| &outcome.artifact)
    }

    /// `idle -> displaying`. Draws and shuffles this run's words once.
    pub fn start(&mut self) -> Result<&[String], TransitionError> {
        self.machine.ensure(RecallState::Displaying)?;

        let mut words: Vec<String> = self
            .config
            .word_bank
            .choose_multiple(&mut self.rng, self.config.word_count)
            .cloned()
            .collect();
        words.shuffle(&mut self.rng);

        self.words = words;
        self.elapsed = Tick::new();
        self.recall_started = None;
        self.pending = None;
        self.outcome = None;

        self.machine.advance(RecallState::Displaying)?;
        info!(words = self.words.len(), seconds = self.config.display_seconds, "recall display started");
        Ok(&self.words)
    }

    /// One countdown step. At zero the display ends and the recall clock starts.
    /// Late ticks outside `displaying` are ignored.
    pub fn tick(&mut self) -> Result<RecallState, TransitionError> {
        if !self.machine.is(RecallState::Displaying) {
            return Ok(self.state());
        }

        self.elapsed = self.elapsed.next();
        if self.seconds_remaining() == 0 {
            self.machine.advance(RecallState::Recalling)?;
            self.recall_started = Some(self.clock.now());
        }
        Ok(self.state())
    }

    /// `recalling -> analyzing`. Scores the input and returns the analysis request to dispatch.
    pub fn submit(&mut self, input: &str) -> Result<CognitiveAnalysisRequest, InstrumentError> {
        self.machine.ensure(RecallState::Analyzing)?;
        if input.trim().is_empty() {
            self.telemetry.record(TelemetryEvent::ValidationRejected {
                kind: RejectionKind::EmptyRecall,
            });
            return Err(ValidationError::EmptyRecall.into());
        }

        let duration = match self.recall_started {
            Some(started) => self.clock.now().saturating_sub(started),
            None => Duration::ZERO,
        };
        let score = score_recall(&self.words, input);

        let artifact = RecallArtifact {
            words_shown: self.words.clone(),
            words_recalled_raw: input.to_string(),
            correct_words: score.correct_words,
            recall_duration_seconds: duration.as_secs_f64(),
        };
        let request = CognitiveAnalysisRequest {
            performance_summary: artifact.performance_summary(),
        };

        self.machine.advance(RecallState::Analyzing)?;
        info!(
            score = artifact.score(),
            total = artifact.total(),
            seconds = artifact.recall_duration_seconds,
            "recall submitted"
        );
        self.pending = Some(artifact);
        Ok(request)
    }

    /// `analyzing -> results`. Completes on either variant; a failure is kept for display.
    pub fn complete(
        &mut self,
        result: OperationResult<CognitiveAnalysis>,
    ) -> Result<&RecallOutcome, TransitionError> {
        self.machine.ensure(RecallState::Results)?;
        let artifact = self
            .pending
            .take()
            .ok_or_else(|| self.machine.illegal(RecallState::Results))?;

        let (analysis, error) = match result {
            OperationResult::Succeeded(CognitiveAnalysis { analysis }) => (Some(analysis), None),
            OperationResult::Failed(message) => {
                warn!("recall analysis unavailable; showing results without it");
                (None, Some(message))
            }
        };

        self.machine.advance(RecallState::Results)?;
        Ok(&*self.outcome.insert(RecallOutcome { artifact, analysis, error }))
    }

    /// Submit, dispatch the cognitive-task analysis, and land in `results` either way.
    pub async fn submit_and_analyze(
        &mut self,
        input: &str,
        client: &ReasoningClient,
    ) -> Result<&RecallOutcome, InstrumentError> {
        let request = self.submit(input)?;
        let result = client.analyze_cognitive_task(&request).await;
        Ok(self.complete(result)?)
    }

    /// `results -> idle`.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        self.machine.advance(RecallState::Idle)?;
        self.words.clear();
        self.elapsed = Tick::new();
        self.recall_started = None;
        self.outcome = None;
        Ok(())
    }
}

/// Drives the display countdown on a one-second cadence until the instrument leaves
/// `displaying`. Returns `false` if cancelled first.
pub async fn run_countdown(
    recall: &mut WordRecall,
    cancel: &CancellationToken,
    mut on_tick: impl FnMut(u32),
) -> Result<bool, TransitionError> {
    let mut cadence = interval(Duration::from_millis(TICK_MS));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of an interval completes immediately.
    cadence.tick().await;

    while recall.state() == RecallState::Displaying {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!(remaining = recall.seconds_remaining(), "recall countdown cancelled");
                return Ok(false);
            }
            _ = cadence.tick() => {
                recall.tick()?;
                on_tick(recall.seconds_remaining());
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::time::ManualClock;

    fn recall_with(words: &[&str], seconds: u32) -> (WordRecall, ManualClock) {
        let clock = ManualClock::new();
        let config = RecallConfig {
            word_bank: words.iter().map(|w| w.to_string()).collect(),
            word_count: words.len(),
            display_seconds: seconds,
            seed: Some(11),
        };
        (WordRecall::new(config, Arc::new(clock.clone()), Telemetry::new()), clock)
    }

    #[test]
    fn start_shuffles_a_permutation_of_the_selection() {
        let (mut recall, _) = recall_with(&["River", "Mountain", "Forest", "Ocean", "Valley"], 10);
        let mut shown = recall.start().unwrap().to_vec();
        shown.sort();
        assert_eq!(shown, vec!["Forest", "Mountain", "Ocean", "River", "Valley"]);
    }

    #[test]
    fn word_count_limits_selection() {
        let clock = ManualClock::new();
        let config = RecallConfig { word_count: 4, seed: Some(3), ..RecallConfig::default() };
        let mut recall = WordRecall::new(config.clone(), Arc::new(clock), Telemetry::new());
        let shown = recall.start().unwrap();
        assert_eq!(shown.len(), 4);
        assert!(shown.iter().all(|w| config.word_bank.contains(w)));
    }

    #[test]
    fn countdown_ends_in_recalling() {
        let (mut recall, _) = recall_with(&["Sun"], 3);
        recall.start().unwrap();
        assert_eq!(recall.seconds_remaining(), 3);
        assert_eq!(recall.tick(), Ok(RecallState::Displaying));
        assert_eq!(recall.tick(), Ok(RecallState::Displaying));
        assert_eq!(recall.tick(), Ok(RecallState::Recalling));
        // Late tick is a no-op.
        assert_eq!(recall.tick(), Ok(RecallState::Recalling));
    }

    #[test]
    fn blank_input_keeps_recalling() {
        let (mut recall, _) = recall_with(&["Sun"], 1);
        recall.start().unwrap();
        recall.tick().unwrap();

        let err = recall.submit(" \t ").unwrap_err();
        assert_eq!(err, InstrumentError::Validation(ValidationError::EmptyRecall));
        assert_eq!(recall.state(), RecallState::Recalling);
    }

    #[test]
    fn submit_before_recalling_is_illegal() {
        let (mut recall, _) = recall_with(&["Sun"], 5);
        recall.start().unwrap();
        assert!(matches!(recall.submit("sun"), Err(InstrumentError::Transition(_))));
    }

    #[test]
    fn summary_uses_two_decimals() {
        let artifact = RecallArtifact {
            words_shown: vec!["Sun".into(), "Moon".into(), "Star".into()],
            words_recalled_raw: "moon, sun, sun".into(),
            correct_words: vec!["Sun".into(), "Moon".into()],
            recall_duration_seconds: 4.5,
        };
        assert_eq!(
            artifact.performance_summary(),
            "User was asked to memorize 3 words. They took 4.50 seconds to recall them. \
             They correctly recalled 2 words. The recalled words were: Sun, Moon."
        );
    }

    #[test]
    fn restart_only_from_results() {
        let (mut recall, _) = recall_with(&["Sun"], 1);
        assert!(recall.restart().is_err());
        recall.start().unwrap();
        assert!(recall.restart().is_err());
    }
}
