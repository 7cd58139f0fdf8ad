//! Instrumentation for screening sessions.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside instrument or orchestration logic.
//! It exists solely for observability and verification.
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain user content (recalled words, transcripts, audio,
//! analysis text). Only state labels, operation kinds, outcomes, latencies and counts.

pub mod event;
pub mod metrics;
pub mod recorder;
