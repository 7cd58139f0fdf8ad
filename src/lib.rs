pub mod audio;
pub mod config;
pub mod error;
pub mod instruments;
pub mod kernel;
pub mod orchestrator;
pub mod screening;
pub mod services;

pub use config::ScreeningConfig;
pub use kernel::result::OperationResult;
pub use kernel::session::SessionContext;
pub use orchestrator::Orchestrator;
pub use screening::Screening;
