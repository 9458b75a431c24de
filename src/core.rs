use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use log::info;
use tokio::sync::{mpsc, Mutex};

use crate::cache::HandleCache;
use crate::capture::CaptureService;
use crate::db::Database;
use crate::domain::{OpenPath, RuleEngine};
use crate::listener::ListenerController;
use crate::models::{CaptureVerdict, CapturedNotification, IncomingNotification, Rule};
use crate::open::{AppLauncher, NotificationHost, OpenOrchestrator};
use crate::prefs::PrefsStore;

/// Wires the capture pipeline, handle cache, open orchestrator, and
/// ingestion worker over one database and preference store.
pub struct Vault {
    db: Database,
    prefs: Arc<PrefsStore>,
    capture: Arc<CaptureService>,
    cache: Arc<HandleCache>,
    orchestrator: OpenOrchestrator,
    rule_engine: RuleEngine,
    listener: Mutex<ListenerController>,
}

impl Vault {
    /// Opens (or creates) the vault under `data_dir`, resolving weekday
    /// rules in UTC.
    pub fn new(data_dir: &Path, launcher: Arc<dyn AppLauncher>) -> Result<Self> {
        Self::with_rule_zone(data_dir, launcher, RuleEngine::utc())
    }

    /// Same as `new` with an explicit zone for weekday rule resolution.
    pub fn with_zone(
        data_dir: &Path,
        launcher: Arc<dyn AppLauncher>,
        zone: FixedOffset,
    ) -> Result<Self> {
        Self::with_rule_zone(data_dir, launcher, RuleEngine::new(zone))
    }

    fn with_rule_zone(
        data_dir: &Path,
        launcher: Arc<dyn AppLauncher>,
        rule_engine: RuleEngine,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("notivault.sqlite3"))?;
        let prefs = Arc::new(PrefsStore::new(data_dir.join("prefs.json"))?);

        let capture = Arc::new(CaptureService::new(
            db.clone(),
            Arc::clone(&prefs),
            rule_engine.clone(),
        ));
        let cache = Arc::new(HandleCache::default());
        let orchestrator = OpenOrchestrator::new(Arc::clone(&cache), launcher);

        info!("Vault initialized at {}", data_dir.display());

        Ok(Self {
            db,
            prefs,
            capture,
            cache,
            orchestrator,
            rule_engine,
            listener: Mutex::new(ListenerController::new()),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn prefs(&self) -> &PrefsStore {
        &self.prefs
    }

    pub fn cache(&self) -> &HandleCache {
        &self.cache
    }

    // --- ingestion ---

    /// Spawns the background ingestion worker and returns the sender the OS
    /// event source posts raw notification events into.
    pub async fn start_ingest(&self) -> Result<mpsc::Sender<IncomingNotification>> {
        self.listener
            .lock()
            .await
            .start(Arc::clone(&self.capture), Arc::clone(&self.cache))
    }

    pub async fn stop_ingest(&self) -> Result<()> {
        self.listener.lock().await.stop().await
    }

    // --- capture pipeline ---

    /// Consumes an inbound event; true means it was persisted.
    pub async fn try_capture(&self, entity: &CapturedNotification) -> Result<bool> {
        self.capture.try_capture(entity).await
    }

    /// Gate-level variant of `try_capture`: persists on `Captured` and
    /// reports which gate denied otherwise.
    pub async fn capture(&self, entity: &CapturedNotification) -> Result<CaptureVerdict> {
        self.capture.capture(entity).await
    }

    /// Runs the gates without persisting.
    pub async fn evaluate(&self, entity: &CapturedNotification) -> Result<CaptureVerdict> {
        self.capture.evaluate(entity).await
    }

    pub fn rule_matches(&self, now_ms: i64, package_name: &str, rules: &[Rule]) -> bool {
        self.rule_engine.should_capture(now_ms, package_name, rules)
    }

    // --- trial ---

    pub fn can_capture_now(&self) -> Result<bool> {
        self.prefs
            .can_capture_new_notifications(Utc::now().timestamp_millis())
    }

    pub fn trial_days_left(&self) -> Result<i64> {
        self.prefs.trial_days_left(Utc::now().timestamp_millis())
    }

    // --- reopen ---

    /// Registers the live OS listener capability used for active-handle
    /// lookup, activation, and dismissal.
    pub fn attach_host(&self, host: Arc<dyn NotificationHost>) {
        self.orchestrator.attach_host(host);
    }

    pub fn detach_host(&self) {
        self.orchestrator.detach_host();
    }

    /// Orchestrated reopen; reports the path actually used.
    pub fn open_saved(&self, notification_key: &str, package_name: &str) -> OpenPath {
        self.orchestrator.open_saved(notification_key, package_name)
    }

    /// Best-effort dismissal of the live notification; false when no
    /// listener is attached.
    pub fn cancel_active_best_effort(&self, notification_key: &str) -> bool {
        self.orchestrator.cancel_active(notification_key)
    }
}
