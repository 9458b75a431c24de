use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use notivault::{
    content_fingerprint, AppLauncher, CaptureMode, CaptureVerdict, CapturedNotification,
    VaultQuery, Vault,
};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

struct NoopLauncher;

impl AppLauncher for NoopLauncher {
    fn launch_package(&self, _package_name: &str) -> bool {
        true
    }
}

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("notivault-test-{}", Uuid::new_v4()))
}

fn new_vault() -> Vault {
    let _ = env_logger::builder().is_test(true).try_init();
    Vault::new(&temp_data_dir(), Arc::new(NoopLauncher)).expect("vault init")
}

fn ms(year: i32, month: u32, day: u32, hour: u32) -> i64 {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap();
    Utc.from_utc_datetime(&naive).timestamp_millis()
}

/// A Saturday, so the seeded weekend rule matches.
fn saturday() -> i64 {
    ms(2026, 1, 3, 9)
}

fn event(package: &str, title: &str, post_time: i64, captured_at: i64) -> CapturedNotification {
    CapturedNotification {
        id: None,
        package_name: package.to_string(),
        app_name: None,
        title: Some(title.to_string()),
        text: Some("body".to_string()),
        sub_text: None,
        post_time,
        notification_key: Some(format!("0|{package}|{post_time}")),
        has_reopen_handle: false,
        is_ongoing: false,
        is_clearable: true,
        content_hash: content_fingerprint(package, Some(title), Some("body"), None, post_time),
        handled: false,
        captured_at,
    }
}

#[tokio::test]
async fn captures_when_all_gates_pass() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    let now = saturday();
    vault.prefs().ensure_first_launch(now).unwrap();

    let entity = event("com.chat", "Hi", now - 500, now);
    assert_eq!(vault.capture(&entity).await.unwrap(), CaptureVerdict::Captured);

    let stored = vault.db().latest_notification().await.unwrap().unwrap();
    assert_eq!(stored.package_name, "com.chat");
    assert_eq!(stored.content_hash, entity.content_hash);
    assert!(!stored.handled);
}

#[tokio::test]
async fn trial_expiry_denies_before_any_other_gate() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    // Trial started 15 days ago; everything else would allow the capture:
    // AllApps mode, seeded weekend rule matches, no prior row to collide
    // with. The deny must come from the trial gate alone.
    let now = saturday();
    vault.prefs().ensure_first_launch(now - 15 * DAY_MS).unwrap();

    let entity = event("com.chat", "Hi", now - 500, now);
    assert_eq!(
        vault.evaluate(&entity).await.unwrap(),
        CaptureVerdict::TrialExpired
    );
    assert!(!vault.try_capture(&entity).await.unwrap());
    assert!(vault.db().latest_notification().await.unwrap().is_none());
}

#[tokio::test]
async fn pro_flag_overrides_expired_trial() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();
    vault.prefs().set_pro(true).unwrap();

    let now = saturday();
    vault.prefs().ensure_first_launch(now - 15 * DAY_MS).unwrap();

    let entity = event("com.chat", "Hi", now - 500, now);
    assert_eq!(vault.capture(&entity).await.unwrap(), CaptureVerdict::Captured);
}

#[tokio::test]
async fn unselected_package_is_filtered_under_only_selected_mode() {
    let vault = new_vault();
    // Default mode is OnlySelectedApps.
    let now = saturday();
    vault.prefs().ensure_first_launch(now).unwrap();

    let entity = event("com.chat", "Hi", now - 500, now);
    assert_eq!(
        vault.evaluate(&entity).await.unwrap(),
        CaptureVerdict::PackageFiltered
    );

    vault.db().set_selected("com.chat", true).await.unwrap();
    assert_eq!(vault.capture(&entity).await.unwrap(), CaptureVerdict::Captured);
}

#[tokio::test]
async fn weekday_event_matches_no_rule() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    let monday = ms(2026, 1, 5, 9);
    vault.prefs().ensure_first_launch(monday).unwrap();

    let entity = event("com.chat", "Hi", monday - 500, monday);
    assert_eq!(
        vault.evaluate(&entity).await.unwrap(),
        CaptureVerdict::NoRuleMatched
    );
}

#[tokio::test]
async fn identical_back_to_back_event_is_suppressed() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    let now = saturday();
    vault.prefs().ensure_first_launch(now).unwrap();

    let entity = event("com.chat", "Hi", now - 500, now);
    assert!(vault.try_capture(&entity).await.unwrap());
    assert_eq!(
        vault.capture(&entity).await.unwrap(),
        CaptureVerdict::Duplicate
    );

    // Same fingerprint from a different app is not a duplicate.
    let other_app = CapturedNotification {
        package_name: "com.mail".to_string(),
        ..entity.clone()
    };
    assert_eq!(
        vault.capture(&other_app).await.unwrap(),
        CaptureVerdict::Captured
    );

    // Different content from the same app is not a duplicate either.
    let different = event("com.chat", "Hi again", now - 400, now);
    assert_eq!(
        vault.capture(&different).await.unwrap(),
        CaptureVerdict::Captured
    );
}

#[tokio::test]
async fn dedup_only_compares_the_most_recent_row() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    let now = saturday();
    vault.prefs().ensure_first_launch(now).unwrap();

    let first = event("com.chat", "Hi", now - 500, now);
    let intervening = event("com.mail", "Invoice", now - 400, now);
    let repeat = first.clone();

    assert!(vault.try_capture(&first).await.unwrap());
    assert!(vault.try_capture(&intervening).await.unwrap());
    // The intervening row defeats the single-predecessor check.
    assert!(vault.try_capture(&repeat).await.unwrap());

    let all = vault
        .db()
        .list_notifications(VaultQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn vault_queries_filter_and_update() {
    let vault = new_vault();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();

    let now = saturday();
    vault.prefs().ensure_first_launch(now).unwrap();

    vault
        .try_capture(&event("com.chat", "Hello there", now - 900, now - 200))
        .await
        .unwrap();
    vault
        .try_capture(&event("com.mail", "Invoice due", now - 800, now - 100))
        .await
        .unwrap();

    let chat_only = vault
        .db()
        .list_notifications(VaultQuery {
            package_name: Some("com.chat".to_string()),
            ..VaultQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(chat_only.len(), 1);
    assert_eq!(chat_only[0].title.as_deref(), Some("Hello there"));

    let searched = vault
        .db()
        .list_notifications(VaultQuery {
            search: Some("Invoice".to_string()),
            ..VaultQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);

    let recent = vault
        .db()
        .list_notifications(VaultQuery {
            from_ms: Some(now - 150),
            ..VaultQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].package_name, "com.mail");

    assert_eq!(
        vault.db().known_packages().await.unwrap(),
        vec!["com.chat".to_string(), "com.mail".to_string()]
    );

    let id = chat_only[0].id.unwrap();
    vault.db().mark_handled(id).await.unwrap();
    let handled = vault
        .db()
        .list_notifications(VaultQuery {
            package_name: Some("com.chat".to_string()),
            ..VaultQuery::default()
        })
        .await
        .unwrap();
    assert!(handled[0].handled);

    vault.db().delete_notification(id).await.unwrap();
    assert_eq!(
        vault
            .db()
            .list_notifications(VaultQuery {
                package_name: Some("com.chat".to_string()),
                ..VaultQuery::default()
            })
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn first_launch_is_established_exactly_once() {
    let vault = new_vault();
    let first = vault.prefs().ensure_first_launch(1_000).unwrap();
    let second = vault.prefs().ensure_first_launch(2_000).unwrap();
    assert_eq!(first, 1_000);
    assert_eq!(second, 1_000);
    assert_eq!(vault.prefs().first_launch_ms(), 1_000);
}

#[tokio::test]
async fn fresh_install_seeds_one_weekend_rule() {
    let vault = new_vault();
    let rules = vault.db().list_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "Weekend");
    assert!(rules[0].is_active);
    assert_eq!(rules[0].weekend_days_csv, "6,7");
}
