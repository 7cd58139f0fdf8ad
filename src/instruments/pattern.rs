use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{InstrumentError, TransitionError, ValidationError};
use crate::kernel::lifecycle::{Lifecycle, StateMachine};
use crate::kernel::telemetry::event::{RejectionKind, TelemetryEvent};
use crate::kernel::telemetry::recorder::Telemetry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePuzzle {
    pub sequence: Vec<i64>,
    pub answer: i64,
    /// Shown after answering. Never used for grading.
    pub rule: String,
}

impl SequencePuzzle {
    pub fn new(sequence: &[i64], answer: i64, rule: &str) -> Self {
        Self {
            sequence: sequence.to_vec(),
            answer,
            rule: rule.to_string(),
        }
    }

    /// `2, 4, 6, 8, ?`
    pub fn prompt(&self) -> String {
        let terms: Vec<String> = self.sequence.iter().map(i64::to_string).collect();
        format!("{}, ?", terms.join(", "))
    }
}

pub fn default_puzzles() -> Vec<SequencePuzzle> {
    vec![
        SequencePuzzle::new(&[2, 4, 6, 8], 10, "Add 2 to the previous number."),
        SequencePuzzle::new(&[10, 8, 6, 4], 2, "Subtract 2 from the previous number."),
        SequencePuzzle::new(&[3, 6, 12, 24], 48, "Multiply the previous number by 2."),
        SequencePuzzle::new(
            &[1, 4, 9, 16],
            25,
            "Square of consecutive integers (1², 2², 3², 4²...).",
        ),
        SequencePuzzle::new(
            &[1, 1, 2, 3, 5],
            8,
            "Fibonacci sequence (each number is the sum of the two preceding ones).",
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternState {
    Answering,
    Answered,
    Finished,
}

impl Lifecycle for PatternState {
    const INSTRUMENT: &'static str = "pattern_sequence";
    const TRANSITIONS: &'static [(Self, Self)] = &[
        (PatternState::Answering, PatternState::Answered),
        (PatternState::Answered, PatternState::Answering),
        (PatternState::Answered, PatternState::Finished),
        (PatternState::Finished, PatternState::Answering),
    ];

    fn label(self) -> &'static str {
        match self {
            PatternState::Answering => "answering",
            PatternState::Answered => "answered",
            PatternState::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub expected: i64,
    pub rule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternScore {
    pub correct: usize,
    pub total: usize,
}

impl PatternScore {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// Step counter over a fixed puzzle list. Its score stays local to the quiz.
pub struct PatternQuiz {
    machine: StateMachine<PatternState>,
    puzzles: Vec<SequencePuzzle>,
    position: usize,
    correct: usize,
    telemetry: Telemetry,
}

impl PatternQuiz {
    pub fn new(puzzles: Vec<SequencePuzzle>, telemetry: Telemetry) -> Self {
        let initial = if puzzles.is_empty() {
            PatternState::Finished
        } else {
            PatternState::Answering
        };
        Self {
            machine: StateMachine::new(initial, telemetry.clone()),
            puzzles,
            position: 0,
            correct: 0,
            telemetry,
        }
    }

    pub fn state(&self) -> PatternState {
        self.machine.state()
    }

    /// Puzzle being answered, or just answered. `None` once finished.
    pub fn current(&self) -> Option<&SequencePuzzle> {
        if self.machine.is(PatternState::Finished) {
            return None;
        }
        self.puzzles.get(self.position)
    }

    /// Zero-based index of the current puzzle and the puzzle count.
    pub fn position(&self) -> (usize, usize) {
        (self.position, self.puzzles.len())
    }

    /// `answering -> answered`. Exact integer equality, no partial credit.
    pub fn submit(&mut self, answer: i64) -> Result<AnswerFeedback, TransitionError> {
        self.machine.ensure(PatternState::Answered)?;
        let puzzle = self
            .puzzles
            .get(self.position)
            .ok_or_else(|| self.machine.illegal(PatternState::Answered))?;

        let feedback = AnswerFeedback {
            correct: answer == puzzle.answer,
            expected: puzzle.answer,
            rule: puzzle.rule.clone(),
        };
        if feedback.correct {
            self.correct += 1;
        }
        self.machine.advance(PatternState::Answered)?;
        info!(puzzle = self.position, correct = feedback.correct, "pattern answer graded");
        Ok(feedback)
    }

    /// Parses a typed answer, then grades it.
    pub fn submit_text(&mut self, input: &str) -> Result<AnswerFeedback, InstrumentError> {
        self.machine.ensure(PatternState::Answered)?;
        let trimmed = input.trim();
        let parsed = if trimmed.is_empty() {
            Err(ValidationError::EmptyAnswer)
        } else {
            trimmed
                .parse::<i64>()
                .map_err(|_| ValidationError::NotAnInteger(trimmed.to_string()))
        };

        match parsed {
            Ok(answer) => Ok(self.submit(answer)?),
            Err(err) => {
                self.telemetry.record(TelemetryEvent::ValidationRejected {
                    kind: RejectionKind::from(&err),
                });
                Err(err.into())
            }
        }
    }

    /// `answered -> answering`, or `answered -> finished` after the last puzzle.
    pub fn next(&mut self) -> Result<PatternState, TransitionError> {
        self.machine.ensure(PatternState::Answering)?;
        if self.position + 1 < self.puzzles.len() {
            self.position += 1;
            self.machine.advance(PatternState::Answering)?;
        } else {
            self.machine.advance(PatternState::Finished)?;
            info!(correct = self.correct, total = self.puzzles.len(), "pattern quiz finished");
        }
        Ok(self.state())
    }

    pub fn final_score(&self) -> Option<PatternScore> {
        if !self.machine.is(PatternState::Finished) {
            return None;
        }
        Some(PatternScore {
            correct: self.correct,
            total: self.puzzles.len(),
        })
    }

    /// `finished -> answering`, back to the first puzzle.
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        if self.puzzles.is_empty() {
            return Err(self.machine.illegal(PatternState::Answering));
        }
        self.machine.advance(PatternState::Answering)?;
        self.position = 0;
        self.correct = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> PatternQuiz {
        PatternQuiz::new(default_puzzles(), Telemetry::new())
    }

    #[test]
    fn default_answers_follow_their_rules() {
        let puzzles = default_puzzles();
        assert_eq!(puzzles.len(), 5);
        assert_eq!(puzzles[0].prompt(), "2, 4, 6, 8, ?");
        let answers: Vec<i64> = puzzles.iter().map(|p| p.answer).collect();
        assert_eq!(answers, vec![10, 2, 48, 25, 8]);
    }

    #[test]
    fn full_run_scores_correct_over_total() {
        let mut quiz = quiz();
        for answer in [10, 3, 48, 25, 8] {
            quiz.submit(answer).unwrap();
            quiz.next().unwrap();
        }
        assert_eq!(quiz.state(), PatternState::Finished);
        let score = quiz.final_score().unwrap();
        assert_eq!(score, PatternScore { correct: 4, total: 5 });
        assert!((score.ratio() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn feedback_reveals_expected_and_rule() {
        let mut quiz = quiz();
        let feedback = quiz.submit(9).unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.expected, 10);
        assert_eq!(feedback.rule, "Add 2 to the previous number.");
    }

    #[test]
    fn cannot_answer_twice_or_skip() {
        let mut quiz = quiz();
        assert!(quiz.next().is_err());
        quiz.submit(10).unwrap();
        assert!(quiz.submit(10).is_err());
        assert_eq!(quiz.final_score(), None);
    }

    #[test]
    fn text_answers_are_validated() {
        let mut quiz = quiz();
        assert_eq!(
            quiz.submit_text("  "),
            Err(InstrumentError::Validation(ValidationError::EmptyAnswer))
        );
        assert_eq!(
            quiz.submit_text("ten"),
            Err(InstrumentError::Validation(ValidationError::NotAnInteger("ten".into())))
        );
        assert_eq!(quiz.state(), PatternState::Answering);
        assert!(quiz.submit_text(" 10 ").unwrap().correct);
    }

    #[test]
    fn restart_clears_progress() {
        let mut quiz = PatternQuiz::new(default_puzzles()[..1].to_vec(), Telemetry::new());
        quiz.submit(10).unwrap();
        quiz.next().unwrap();
        quiz.restart().unwrap();
        assert_eq!(quiz.position(), (0, 1));
        assert_eq!(quiz.current().map(|p| p.answer), Some(10));
    }

    #[test]
    fn empty_quiz_is_finished() {
        let quiz = PatternQuiz::new(Vec::new(), Telemetry::new());
        assert_eq!(quiz.final_score(), Some(PatternScore { correct: 0, total: 0 }));
        assert!(quiz.current().is_none());
    }
}
