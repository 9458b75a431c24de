pub mod notification;
pub mod rule;

pub use notification::{CaptureVerdict, CapturedNotification, IncomingNotification, ReopenHandle};
pub use rule::{AppFilterMode, CaptureMode, Rule, RuleKind};
