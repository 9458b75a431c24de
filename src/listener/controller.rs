use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::HandleCache;
use crate::capture::CaptureService;
use crate::models::IncomingNotification;

use super::worker::ingest_loop;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Owns the background ingestion worker. The OS event source posts raw
/// notification events into the sender returned by `start`.
pub struct ListenerController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl ListenerController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(
        &mut self,
        capture: Arc<CaptureService>,
        cache: Arc<HandleCache>,
    ) -> Result<mpsc::Sender<IncomingNotification>> {
        if self.handle.is_some() {
            bail!("ingestion already active");
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(ingest_loop(event_rx, capture, cache, token_clone));
        info!("Notification ingest worker started");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(event_tx)
    }

    /// Stops the worker; any in-flight event finishes before the task joins.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("ingest loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Default for ListenerController {
    fn default() -> Self {
        Self::new()
    }
}
