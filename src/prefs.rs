use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::domain::trial;
use crate::models::CaptureMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VaultPrefs {
    /// Epoch ms; 0 means the trial window has not been established yet.
    first_launch_ms: i64,
    is_pro: bool,
    capture_mode: CaptureMode,
    onboarded: bool,
}

impl Default for VaultPrefs {
    fn default() -> Self {
        Self {
            first_launch_ms: 0,
            is_pro: false,
            capture_mode: CaptureMode::OnlySelectedApps,
            onboarded: false,
        }
    }
}

/// Durable key-value preferences backing the trial and capture-mode gates.
pub struct PrefsStore {
    path: PathBuf,
    data: RwLock<VaultPrefs>,
}

impl PrefsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prefs from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            VaultPrefs::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Establishes the trial anchor lazily, exactly once: the first query
    /// while unset persists `now_ms` and every later call returns that value.
    pub fn ensure_first_launch(&self, now_ms: i64) -> Result<i64> {
        {
            let guard = self.data.read().unwrap();
            if guard.first_launch_ms > 0 {
                return Ok(guard.first_launch_ms);
            }
        }
        let mut guard = self.data.write().unwrap();
        if guard.first_launch_ms > 0 {
            return Ok(guard.first_launch_ms);
        }
        guard.first_launch_ms = now_ms;
        self.persist(&guard)?;
        Ok(now_ms)
    }

    pub fn first_launch_ms(&self) -> i64 {
        self.data.read().unwrap().first_launch_ms
    }

    pub fn is_pro(&self) -> bool {
        self.data.read().unwrap().is_pro
    }

    pub fn set_pro(&self, value: bool) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.is_pro = value;
        self.persist(&guard)
    }

    pub fn capture_mode(&self) -> CaptureMode {
        self.data.read().unwrap().capture_mode
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.capture_mode = mode;
        self.persist(&guard)
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.data.read().unwrap().onboarded
    }

    pub fn set_onboarding_done(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.onboarded = true;
        self.persist(&guard)
    }

    pub fn can_capture_new_notifications(&self, now_ms: i64) -> Result<bool> {
        let is_pro = self.is_pro();
        let first = self.ensure_first_launch(now_ms)?;
        Ok(trial::can_capture(is_pro, first, now_ms))
    }

    pub fn trial_days_left(&self, now_ms: i64) -> Result<i64> {
        let first = self.ensure_first_launch(now_ms)?;
        Ok(trial::days_left(first, now_ms))
    }

    fn persist(&self, data: &VaultPrefs) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write prefs to {}", self.path.display()))
    }
}
