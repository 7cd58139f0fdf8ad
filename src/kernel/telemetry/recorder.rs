use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle every component records through. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    inner: Arc<Mutex<TelemetryRecorder>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: TelemetryEvent) {
        self.inner.lock().record(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.lock().snapshot()
    }

    /// Copy of the buffered events, oldest first.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.inner.lock().events().cloned().collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut recorder = TelemetryRecorder::new();
        for score in 0..=MAX_EVENTS {
            recorder.record(TelemetryEvent::RiskScored { score: (score % 101) as u8 });
        }
        assert_eq!(recorder.len(), MAX_EVENTS);
        assert_eq!(
            recorder.events().next(),
            Some(&TelemetryEvent::RiskScored { score: 1 })
        );
    }
}
