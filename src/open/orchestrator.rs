use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::cache::HandleCache;
use crate::domain::{resolve_open_path, OpenPath};
use crate::models::ReopenHandle;
use crate::open::host::{AppLauncher, NotificationHost};

/// Re-opens a previously captured notification: live handle first, cached
/// handle second, app launch last. Every failure path recovers locally; the
/// caller only ever learns which path actually ran.
pub struct OpenOrchestrator {
    cache: Arc<HandleCache>,
    launcher: Arc<dyn AppLauncher>,
    host: Mutex<Option<Arc<dyn NotificationHost>>>,
}

impl OpenOrchestrator {
    pub fn new(cache: Arc<HandleCache>, launcher: Arc<dyn AppLauncher>) -> Self {
        Self {
            cache,
            launcher,
            host: Mutex::new(None),
        }
    }

    /// Registers the live listener capability. There is at most one; a new
    /// attach replaces the previous host.
    pub fn attach_host(&self, host: Arc<dyn NotificationHost>) {
        *self.host.lock().unwrap() = Some(host);
    }

    pub fn detach_host(&self) {
        *self.host.lock().unwrap() = None;
    }

    fn current_host(&self) -> Option<Arc<dyn NotificationHost>> {
        self.host.lock().unwrap().clone()
    }

    /// Attempts to re-open the notification behind `notification_key`,
    /// reporting the path actually taken (which differs from the resolver's
    /// suggestion when the chosen handle fails to activate).
    pub fn open_saved(&self, notification_key: &str, package_name: &str) -> OpenPath {
        let Some(host) = self.current_host() else {
            info!("No live listener; launching {package_name} directly");
            return self.launch_fallback(package_name);
        };

        let active = host.active_handle(notification_key);
        let cached = self.cache.get(notification_key);

        match resolve_open_path(active.is_some(), cached.is_some()) {
            OpenPath::ActiveNotification => match active {
                Some(handle) => self.send_or_fallback(
                    host.as_ref(),
                    &handle,
                    package_name,
                    OpenPath::ActiveNotification,
                ),
                None => self.launch_fallback(package_name),
            },
            OpenPath::CachedHandle => match cached {
                Some(handle) => self.send_or_fallback(
                    host.as_ref(),
                    &handle,
                    package_name,
                    OpenPath::CachedHandle,
                ),
                None => self.launch_fallback(package_name),
            },
            OpenPath::AppLaunchFallback => self.launch_fallback(package_name),
        }
    }

    /// Best-effort dismissal of the live notification; false when no
    /// listener is running.
    pub fn cancel_active(&self, notification_key: &str) -> bool {
        match self.current_host() {
            Some(host) => host.cancel_notification(notification_key),
            None => false,
        }
    }

    fn send_or_fallback(
        &self,
        host: &dyn NotificationHost,
        handle: &ReopenHandle,
        package_name: &str,
        success_path: OpenPath,
    ) -> OpenPath {
        match host.activate(handle) {
            Ok(()) => success_path,
            Err(err) => {
                warn!("Handle activation failed for {package_name}: {err}");
                self.launch_fallback(package_name)
            }
        }
    }

    fn launch_fallback(&self, package_name: &str) -> OpenPath {
        if !self.launcher.launch_package(package_name) {
            warn!("App launch fallback could not start {package_name}");
        }
        OpenPath::AppLaunchFallback
    }
}
