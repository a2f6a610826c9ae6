//! Close notifications, delivered off the close path.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeClosed {
    pub group_id: Uuid,
    pub challenge_id: Uuid,
    pub challenge_name: String,
    pub winner_id: Uuid,
    pub high_score: Decimal,
}

#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn challenge_closed(&self, event: &ChallengeClosed) -> Result<(), NotifyError>;
}

/// Writes the event to the log. Mail delivery lives outside this crate.
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn challenge_closed(&self, event: &ChallengeClosed) -> Result<(), NotifyError> {
        info!(
            group_id = %event.group_id,
            challenge_id = %event.challenge_id,
            winner_id = %event.winner_id,
            high_score = %event.high_score,
            "Challenge '{}' closed",
            event.challenge_name
        );
        Ok(())
    }
}

/// Bounded queue in front of a [`Notifier`], drained by one worker task.
pub struct NotificationDispatcher {
    tx: mpsc::Sender<ChallengeClosed>,
    worker: JoinHandle<()>,
}

impl NotificationDispatcher {
    /// Must be called inside a tokio runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(notify_worker(rx, notifier));
        Self { tx, worker }
    }

    /// Queues the event without waiting. Returns an advisory when it was dropped.
    pub fn dispatch(&self, event: ChallengeClosed) -> Option<String> {
        match self.tx.try_send(event) {
            Ok(()) => None,
            Err(TrySendError::Full(event)) => {
                warn!(challenge_id = %event.challenge_id, "notification queue full, event dropped");
                Some("close notification dropped: queue is full".to_string())
            }
            Err(TrySendError::Closed(event)) => {
                warn!(challenge_id = %event.challenge_id, "notification worker stopped, event dropped");
                Some("close notification dropped: notifier is not running".to_string())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }
}

async fn notify_worker(mut rx: mpsc::Receiver<ChallengeClosed>, notifier: Arc<dyn Notifier>) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = notifier.challenge_closed(&event).await {
            warn!(challenge_id = %event.challenge_id, error = %e, "close notification failed");
        }
    }
}
