use serde::{Deserialize, Serialize};

/// An opaque OS-level capability that re-surfaces the original notification's
/// target action when activated. The token only has meaning to the
/// `NotificationHost` that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReopenHandle {
    pub token: String,
}

impl ReopenHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// A raw notification-posted event as delivered by the OS event source,
/// before any capture decision has been made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingNotification {
    pub package_name: String,
    pub app_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub sub_text: Option<String>,
    /// Origin timestamp assigned by the posting system, epoch ms.
    pub post_time: i64,
    /// Stable event key assigned by the origin system; may be absent.
    pub notification_key: Option<String>,
    pub is_ongoing: bool,
    pub is_clearable: bool,
    #[serde(skip)]
    pub reopen_handle: Option<ReopenHandle>,
}

/// A notification event after fingerprinting, ready for the capture pipeline.
/// Immutable once built; `handled` is owned by the store after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNotification {
    pub id: Option<i64>,
    pub package_name: String,
    pub app_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub sub_text: Option<String>,
    pub post_time: i64,
    pub notification_key: Option<String>,
    pub has_reopen_handle: bool,
    pub is_ongoing: bool,
    pub is_clearable: bool,
    pub content_hash: String,
    pub handled: bool,
    pub captured_at: i64,
}

/// Outcome of running one event through the capture decision pipeline.
/// `Captured` is the only variant that persisted anything; the deny variants
/// name the gate that fired, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureVerdict {
    Captured,
    TrialExpired,
    PackageFiltered,
    NoRuleMatched,
    Duplicate,
}

impl CaptureVerdict {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureVerdict::Captured)
    }
}
