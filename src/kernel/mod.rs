pub mod lifecycle;
pub mod result;
pub mod session;
pub mod telemetry;
pub mod time;
