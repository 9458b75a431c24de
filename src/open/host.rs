use anyhow::Result;

use crate::models::ReopenHandle;

/// The currently running OS listener component, when one exists. Injected as
/// an optional capability: the orchestrator treats its absence the same as
/// an activation failure and falls through to launching the app.
pub trait NotificationHost: Send + Sync {
    /// Looks up a reopen handle in the OS-reported active-notification
    /// snapshot.
    fn active_handle(&self, notification_key: &str) -> Option<ReopenHandle>;

    /// Activates a handle; fails when the underlying capability has expired
    /// or was cancelled.
    fn activate(&self, handle: &ReopenHandle) -> Result<()>;

    /// Best-effort dismissal of the live notification by key.
    fn cancel_notification(&self, notification_key: &str) -> bool;
}

/// Last-resort open path: launching the source app by package identifier.
/// Fire-and-forget; the return value only reports whether a launch was
/// attempted.
pub trait AppLauncher: Send + Sync {
    fn launch_package(&self, package_name: &str) -> bool;
}
