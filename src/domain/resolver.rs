//! Open-path decision: which route re-opens a previously captured
//! notification. Priority is live handle, then cached handle, then launching
//! the app itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum OpenPath {
    ActiveNotification,
    CachedHandle,
    AppLaunchFallback,
}

/// Total function over the two availability flags; re-evaluated per call,
/// nothing persisted.
pub fn resolve_open_path(has_active_handle: bool, has_cached_handle: bool) -> OpenPath {
    if has_active_handle {
        OpenPath::ActiveNotification
    } else if has_cached_handle {
        OpenPath::CachedHandle
    } else {
        OpenPath::AppLaunchFallback
    }
}
