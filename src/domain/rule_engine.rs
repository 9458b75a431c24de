//! Rule evaluation: an event is captured when any active rule matches both
//! the current instant and the source package.

use std::collections::HashSet;

use chrono::{Datelike, FixedOffset, TimeZone, Utc};

use crate::models::{AppFilterMode, Rule, RuleKind};

/// Evaluates rules against (now, package). Weekday resolution happens in the
/// configured zone, not the ambient one: the same instant must resolve to
/// different local days under different zones.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    zone: FixedOffset,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::utc()
    }
}

impl RuleEngine {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self {
            zone: FixedOffset::east_opt(0).expect("zero offset is valid"),
        }
    }

    pub fn should_capture(&self, now_ms: i64, package_name: &str, rules: &[Rule]) -> bool {
        rules.iter().any(|rule| {
            rule.is_active
                && self.is_time_match(rule, now_ms)
                && is_package_match(rule, package_name)
        })
    }

    fn is_time_match(&self, rule: &Rule, now_ms: i64) -> bool {
        match rule.kind {
            RuleKind::DateRange => {
                // Both bounds are required for a match.
                match (rule.start_ms, rule.end_ms) {
                    (Some(start), Some(end)) => start <= now_ms && now_ms <= end,
                    _ => false,
                }
            }
            RuleKind::WeekendRepeat => {
                let Some(instant) = Utc.timestamp_millis_opt(now_ms).single() else {
                    return false;
                };
                let day = instant.with_timezone(&self.zone).weekday().number_from_monday();
                parse_days(&rule.weekend_days_csv).contains(&day)
            }
        }
    }
}

fn is_package_match(rule: &Rule, package_name: &str) -> bool {
    let selected = parse_packages(&rule.selected_packages_csv);
    match rule.app_filter_mode {
        AppFilterMode::AllExcept => !selected.contains(package_name),
        AppFilterMode::OnlySelected => selected.contains(package_name),
    }
}

/// ISO weekday numbers (1=Monday..7=Sunday). Unparsable tokens are dropped.
fn parse_days(days_csv: &str) -> HashSet<u32> {
    days_csv
        .split(',')
        .filter_map(|token| token.trim().parse::<u32>().ok())
        .collect()
}

fn parse_packages(csv: &str) -> HashSet<String> {
    csv.split(',')
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect()
}
