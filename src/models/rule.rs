use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    DateRange,
    WeekendRepeat,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::DateRange => "DateRange",
            RuleKind::WeekendRepeat => "WeekendRepeat",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AppFilterMode {
    AllExcept,
    OnlySelected,
}

impl AppFilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppFilterMode::AllExcept => "AllExcept",
            AppFilterMode::OnlySelected => "OnlySelected",
        }
    }
}

/// Which apps the pipeline captures from, independent of any rule's own
/// per-app filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    OnlySelectedApps,
    AllApps,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::OnlySelectedApps => "OnlySelectedApps",
            CaptureMode::AllApps => "AllApps",
        }
    }

    pub fn from_storage(raw: &str) -> CaptureMode {
        match raw {
            "AllApps" => CaptureMode::AllApps,
            _ => CaptureMode::OnlySelectedApps,
        }
    }
}

impl Default for CaptureMode {
    fn default() -> Self {
        CaptureMode::OnlySelectedApps
    }
}

/// A capture rule, owned by the store and read-only to the rule engine.
/// Day and package sets are stored as comma-separated lists; parsing is
/// permissive (unparsable tokens are dropped).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub kind: RuleKind,
    pub is_active: bool,
    pub app_filter_mode: AppFilterMode,
    pub selected_packages_csv: String,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    /// ISO weekday numbers, 1=Monday .. 7=Sunday.
    pub weekend_days_csv: String,
}

impl Rule {
    /// A weekend-repeat rule matching all apps, the shape seeded on first run.
    pub fn weekend(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            kind: RuleKind::WeekendRepeat,
            is_active: true,
            app_filter_mode: AppFilterMode::AllExcept,
            selected_packages_csv: String::new(),
            start_ms: None,
            end_ms: None,
            weekend_days_csv: "6,7".to_string(),
        }
    }
}
