pub mod host;
pub mod orchestrator;

pub use host::{AppLauncher, NotificationHost};
pub use orchestrator::OpenOrchestrator;
