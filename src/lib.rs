//! notivault — passive notification capture and reopen-path resolution.
//!
//! Inbound notification events flow through a four-gate decision pipeline
//! (trial window, app selection, capture rules, content dedup) before being
//! persisted; a bounded FIFO cache of reopen handles backs the later
//! "open this saved notification" request, which resolves live handle >
//! cached handle > app launch.

pub mod cache;
pub mod capture;
mod core;
pub mod db;
pub mod domain;
pub mod listener;
pub mod models;
pub mod open;
pub mod prefs;

pub use crate::core::Vault;
pub use cache::{HandleCache, HANDLE_CACHE_CAPACITY};
pub use capture::fingerprint::content_fingerprint;
pub use capture::CaptureService;
pub use db::{Database, VaultQuery};
pub use domain::trial::{can_capture, days_left as trial_days_left, is_trial_active};
pub use domain::{resolve_open_path, OpenPath, RuleEngine};
pub use listener::ListenerController;
pub use models::{
    AppFilterMode, CaptureMode, CaptureVerdict, CapturedNotification, IncomingNotification,
    ReopenHandle, Rule, RuleKind,
};
pub use open::{AppLauncher, NotificationHost, OpenOrchestrator};
pub use prefs::PrefsStore;
