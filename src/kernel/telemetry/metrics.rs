use std::collections::{BTreeMap, VecDeque};

use super::event::{CallOutcome, TelemetryEvent};
use crate::services::llm::types::OperationKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub transitions: u64,
    pub calls: BTreeMap<OperationKind, CallStats>,
    pub device_failures: u64,
    pub validation_rejections: u64,
    pub risk_stats: RiskStats,
    pub export_stats: ExportStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallStats {
    pub succeeded: u64,
    pub failed: u64,
    pub rejected: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskStats {
    pub scored: u64,
    pub last_score: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportStats {
    pub succeeded: u64,
    pub failed: u64,
}

impl TelemetrySnapshot {
    pub fn calls_for(&self, operation: OperationKind) -> CallStats {
        self.calls.get(&operation).cloned().unwrap_or_default()
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::InstrumentTransition { .. } => snap.transitions += 1,
            TelemetryEvent::ExternalCall { operation, outcome, latency_ms } => {
                let stats = snap.calls.entry(*operation).or_default();
                match outcome {
                    CallOutcome::Succeeded => stats.succeeded += 1,
                    CallOutcome::Failed => stats.failed += 1,
                    CallOutcome::Rejected => stats.rejected += 1,
                }
                stats.total_latency_ms += latency_ms;
            }
            TelemetryEvent::DeviceFailure { .. } => snap.device_failures += 1,
            TelemetryEvent::ValidationRejected { .. } => snap.validation_rejections += 1,
            TelemetryEvent::RiskScored { score } => {
                snap.risk_stats.scored += 1;
                snap.risk_stats.last_score = Some(*score);
            }
            TelemetryEvent::ExportAttempt { succeeded } => {
                if *succeeded {
                    snap.export_stats.succeeded += 1;
                } else {
                    snap.export_stats.failed += 1;
                }
            }
        }
    }

    // Rejected calls never reached the service, so they don't count toward latency.
    for stats in snap.calls.values_mut() {
        let dispatched = stats.succeeded + stats.failed;
        if dispatched > 0 {
            stats.avg_latency_ms = stats.total_latency_ms as f64 / dispatched as f64;
        }
    }

    snap
}
