pub mod client;
pub mod reasoning;
pub mod types;

pub use client::{HttpReasoningService, ReasoningService};
pub use reasoning::ReasoningClient;
