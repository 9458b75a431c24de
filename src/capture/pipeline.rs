use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::db::Database;
use crate::domain::{capture_policy, RuleEngine};
use crate::models::{CaptureMode, CaptureVerdict, CapturedNotification};
use crate::prefs::PrefsStore;

/// The capture decision pipeline: trial gate, app-selection gate, rule
/// engine, then dedup, in that order, short-circuiting on the first deny.
/// Only a `Captured` verdict touches the store.
pub struct CaptureService {
    db: Database,
    prefs: Arc<PrefsStore>,
    rule_engine: RuleEngine,
}

impl CaptureService {
    pub fn new(db: Database, prefs: Arc<PrefsStore>, rule_engine: RuleEngine) -> Self {
        Self {
            db,
            prefs,
            rule_engine,
        }
    }

    /// Runs the gates without persisting, reporting which gate denied.
    pub async fn evaluate(&self, entity: &CapturedNotification) -> Result<CaptureVerdict> {
        if !self.prefs.can_capture_new_notifications(entity.captured_at)? {
            return Ok(CaptureVerdict::TrialExpired);
        }

        let mode = self.prefs.capture_mode();
        let selected = match mode {
            CaptureMode::OnlySelectedApps => self.db.is_selected(&entity.package_name).await?,
            CaptureMode::AllApps => true,
        };
        if !capture_policy::should_capture_package(mode, selected) {
            return Ok(CaptureVerdict::PackageFiltered);
        }

        let rules = self.db.active_rules().await?;
        if !self
            .rule_engine
            .should_capture(entity.captured_at, &entity.package_name, &rules)
        {
            return Ok(CaptureVerdict::NoRuleMatched);
        }

        // Single-predecessor dedup: compares only the most recent row, so
        // duplicates separated by an intervening notification are kept.
        if let Some(last) = self.db.latest_notification().await? {
            if last.content_hash == entity.content_hash
                && last.package_name == entity.package_name
            {
                return Ok(CaptureVerdict::Duplicate);
            }
        }

        Ok(CaptureVerdict::Captured)
    }

    /// Evaluates and persists on an allow verdict.
    pub async fn capture(&self, entity: &CapturedNotification) -> Result<CaptureVerdict> {
        let verdict = self.evaluate(entity).await?;
        match verdict {
            CaptureVerdict::Captured => {
                let id = self.db.insert_notification(entity).await?;
                info!(
                    "Captured notification {} from {} (post_time={})",
                    id, entity.package_name, entity.post_time
                );
            }
            denied => {
                debug!(
                    "Dropped notification from {}: {:?}",
                    entity.package_name, denied
                );
            }
        }
        Ok(verdict)
    }

    pub async fn try_capture(&self, entity: &CapturedNotification) -> Result<bool> {
        Ok(self.capture(entity).await?.is_captured())
    }
}
