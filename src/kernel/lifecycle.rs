use std::fmt::Debug;
use tracing::{debug, info};

use crate::error::TransitionError;
use crate::kernel::telemetry::event::TelemetryEvent;
use crate::kernel::telemetry::recorder::Telemetry;

/// An instrument's state enum together with its static transition table.
///
/// The table is the single authority on legal edges. Instruments never assign
/// their state directly; every change goes through [`StateMachine::advance`].
pub trait Lifecycle: Copy + Eq + Debug + 'static {
    /// Instrument name used in logs, errors and telemetry.
    const INSTRUMENT: &'static str;

    /// Every legal `(from, to)` edge. Anything absent is rejected.
    const TRANSITIONS: &'static [(Self, Self)];

    fn label(self) -> &'static str;

    fn permits(self, to: Self) -> bool {
        Self::TRANSITIONS
            .iter()
            .any(|&(from, target)| from == self && target == to)
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine<S: Lifecycle> {
    state: S,
    telemetry: Telemetry,
}

impl<S: Lifecycle> StateMachine<S> {
    pub fn new(initial: S, telemetry: Telemetry) -> Self {
        debug_assert!(
            S::TRANSITIONS.iter().any(|&(from, to)| from == initial || to == initial),
            "initial state must appear in the transition table"
        );
        Self { state: initial, telemetry }
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn is(&self, state: S) -> bool {
        self.state == state
    }

    /// Checks an edge without taking it.
    pub fn ensure(&self, to: S) -> Result<(), TransitionError> {
        if self.state.permits(to) {
            Ok(())
        } else {
            Err(self.illegal(to))
        }
    }

    /// Takes the edge `current -> to`. Returns the state that was left.
    pub fn advance(&mut self, to: S) -> Result<S, TransitionError> {
        let from = self.state;
        if !from.permits(to) {
            debug!(
                instrument = S::INSTRUMENT,
                from = from.label(),
                to = to.label(),
                "rejected transition"
            );
            return Err(self.illegal(to));
        }

        self.state = to;
        info!(
            instrument = S::INSTRUMENT,
            from = from.label(),
            to = to.label(),
            "state transition"
        );
        self.telemetry.record(TelemetryEvent::InstrumentTransition {
            instrument: S::INSTRUMENT.to_string(),
            from: from.label().to_string(),
            to: to.label().to_string(),
        });
        Ok(from)
    }

    pub fn illegal(&self, to: S) -> TransitionError {
        TransitionError::Illegal {
            instrument: S::INSTRUMENT,
            from: self.state.label(),
            to: to.label(),
        }
    }
}
