use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use notivault::{
    AppLauncher, AppFilterMode, CaptureMode, IncomingNotification, OpenPath, ReopenHandle, Rule,
    RuleKind, VaultQuery, Vault,
};

#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
}

impl AppLauncher for RecordingLauncher {
    fn launch_package(&self, package_name: &str) -> bool {
        self.launched.lock().unwrap().push(package_name.to_string());
        true
    }
}

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir().join(format!("notivault-test-{}", Uuid::new_v4()))
}

/// A DateRange rule covering all time, so ingestion at wall-clock "now"
/// passes the rule gate regardless of the weekday the test runs on.
fn always_rule() -> Rule {
    Rule {
        id: 0,
        name: "always".to_string(),
        kind: RuleKind::DateRange,
        is_active: true,
        app_filter_mode: AppFilterMode::AllExcept,
        selected_packages_csv: String::new(),
        start_ms: Some(0),
        end_ms: Some(i64::MAX),
        weekend_days_csv: "6,7".to_string(),
    }
}

fn incoming(package: &str, key: &str, handle: Option<ReopenHandle>) -> IncomingNotification {
    IncomingNotification {
        package_name: package.to_string(),
        app_name: None,
        title: Some("Hi".to_string()),
        text: Some("body".to_string()),
        sub_text: None,
        post_time: Utc::now().timestamp_millis(),
        notification_key: Some(key.to_string()),
        is_ongoing: false,
        is_clearable: true,
        reopen_handle: handle,
    }
}

async fn wait_for_rows(vault: &Vault, expected: usize) {
    for _ in 0..100 {
        let rows = vault
            .db()
            .list_notifications(VaultQuery::default())
            .await
            .unwrap();
        if rows.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {expected} captured rows");
}

#[tokio::test]
async fn ingested_event_is_persisted_and_reopenable_from_cache() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vault = Vault::new(&temp_data_dir(), Arc::new(RecordingLauncher::default())).unwrap();
    vault.prefs().set_capture_mode(CaptureMode::AllApps).unwrap();
    vault.db().upsert_rule(&always_rule()).await.unwrap();

    let events = vault.start_ingest().await.unwrap();
    events
        .send(incoming(
            "com.chat",
            "0|com.chat|1",
            Some(ReopenHandle::new("token-1")),
        ))
        .await
        .unwrap();

    wait_for_rows(&vault, 1).await;
    vault.stop_ingest().await.unwrap();

    let stored = vault.db().latest_notification().await.unwrap().unwrap();
    assert_eq!(stored.package_name, "com.chat");
    assert!(stored.has_reopen_handle);

    // The cached handle exists even though no live host is attached, but
    // without a host the orchestrator cannot activate it.
    assert!(vault.cache().get("0|com.chat|1").is_some());
    assert_eq!(
        vault.open_saved("0|com.chat|1", "com.chat"),
        OpenPath::AppLaunchFallback
    );
}

#[tokio::test]
async fn handle_is_cached_even_when_the_pipeline_drops_the_event() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vault = Vault::new(&temp_data_dir(), Arc::new(RecordingLauncher::default())).unwrap();
    // Default OnlySelectedApps mode with nothing selected: every event is
    // dropped at the policy gate.
    vault.db().upsert_rule(&always_rule()).await.unwrap();

    let events = vault.start_ingest().await.unwrap();
    events
        .send(incoming(
            "com.chat",
            "0|com.chat|2",
            Some(ReopenHandle::new("token-2")),
        ))
        .await
        .unwrap();

    // Wait for the worker to drain the event, then confirm the side effect.
    for _ in 0..100 {
        if vault.cache().get("0|com.chat|2").is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    vault.stop_ingest().await.unwrap();

    assert!(vault.cache().get("0|com.chat|2").is_some());
    assert!(vault
        .db()
        .list_notifications(VaultQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn restarting_the_worker_is_allowed_after_stop() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vault = Vault::new(&temp_data_dir(), Arc::new(RecordingLauncher::default())).unwrap();

    let first = vault.start_ingest().await.unwrap();
    assert!(vault.start_ingest().await.is_err());
    drop(first);
    vault.stop_ingest().await.unwrap();
    let _second = vault.start_ingest().await.unwrap();
    vault.stop_ingest().await.unwrap();
}
