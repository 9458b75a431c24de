use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cache::HandleCache;
use crate::capture::fingerprint::content_fingerprint;
use crate::capture::CaptureService;
use crate::models::{CapturedNotification, IncomingNotification};

pub async fn ingest_loop(
    mut events: mpsc::Receiver<IncomingNotification>,
    capture: Arc<CaptureService>,
    cache: Arc<HandleCache>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => ingest_one(event, &capture, &cache).await,
                    None => {
                        info!("Notification event source closed; ingest loop exiting");
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Ingest loop shutting down");
                break;
            }
        }
    }
}

async fn ingest_one(
    event: IncomingNotification,
    capture: &CaptureService,
    cache: &HandleCache,
) {
    // The reopen handle is cached before the capture decision runs, so a
    // later open can still find it even for events the pipeline drops.
    if let (Some(key), Some(handle)) = (&event.notification_key, &event.reopen_handle) {
        cache.put(key, handle.clone());
    }

    let entity = build_entity(&event, Utc::now().timestamp_millis());
    if let Err(err) = capture.capture(&entity).await {
        error!(
            "Capture failed for notification from {}: {err:?}",
            entity.package_name
        );
    }
}

fn build_entity(event: &IncomingNotification, captured_at: i64) -> CapturedNotification {
    let content_hash = content_fingerprint(
        &event.package_name,
        event.title.as_deref(),
        event.text.as_deref(),
        event.sub_text.as_deref(),
        event.post_time,
    );

    CapturedNotification {
        id: None,
        package_name: event.package_name.clone(),
        app_name: event.app_name.clone(),
        title: event.title.clone(),
        text: event.text.clone(),
        sub_text: event.sub_text.clone(),
        post_time: event.post_time,
        notification_key: event.notification_key.clone(),
        has_reopen_handle: event.reopen_handle.is_some(),
        is_ongoing: event.is_ongoing,
        is_clearable: event.is_clearable,
        content_hash,
        handled: false,
        captured_at,
    }
}
