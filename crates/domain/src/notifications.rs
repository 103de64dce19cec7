//! Best-effort notification delivery.
//!
//! A failed or dropped notification is logged and counted, never returned
//! to the operation that produced it.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::collaborators::{Notification, NotificationEmitter};

/// How sellers are notified about a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutPolicy {
    /// One notice per order item, so a seller with three items in an order
    /// hears about it three times.
    #[default]
    PerItem,

    /// One notice per distinct seller per order.
    PerSeller,
}

impl FromStr for FanoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_item" => Ok(FanoutPolicy::PerItem),
            "per_seller" => Ok(FanoutPolicy::PerSeller),
            other => Err(format!("unknown fan-out policy: {other}")),
        }
    }
}

#[derive(Clone)]
enum Delivery {
    Inline(Arc<dyn NotificationEmitter>),
    Queued(mpsc::Sender<Notification>),
}

/// Hands notifications to an emitter, either directly or through a
/// bounded queue drained by a background task.
#[derive(Clone)]
pub struct NotificationDispatcher {
    delivery: Delivery,
}

impl NotificationDispatcher {
    /// Delivers each notification before `dispatch` returns.
    pub fn inline(emitter: Arc<dyn NotificationEmitter>) -> Self {
        Self {
            delivery: Delivery::Inline(emitter),
        }
    }

    /// Spawns a worker that delivers queued notifications in order.
    ///
    /// The worker exits once every clone of the dispatcher is dropped and the
    /// queue is drained. Must be called inside a tokio runtime.
    pub fn queued(emitter: Arc<dyn NotificationEmitter>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                deliver(emitter.as_ref(), &notification).await;
            }
            tracing::debug!("notification worker stopped");
        });

        (
            Self {
                delivery: Delivery::Queued(tx),
            },
            worker,
        )
    }

    /// Returns true if delivery goes through the background queue.
    pub fn is_queued(&self) -> bool {
        matches!(self.delivery, Delivery::Queued(_))
    }

    /// Delivers or enqueues one notification.
    pub async fn dispatch(&self, notification: Notification) {
        match &self.delivery {
            Delivery::Inline(emitter) => deliver(emitter.as_ref(), &notification).await,
            Delivery::Queued(tx) => {
                if let Err(e) = tx.try_send(notification) {
                    metrics::counter!("notifications_failed_total").increment(1);
                    let reason = match e {
                        mpsc::error::TrySendError::Full(_) => "queue full",
                        mpsc::error::TrySendError::Closed(_) => "worker stopped",
                    };
                    tracing::warn!(reason, "notification dropped");
                }
            }
        }
    }

    /// Dispatches notifications in the given order.
    pub async fn dispatch_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.dispatch(notification).await;
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.delivery {
            Delivery::Inline(_) => "inline",
            Delivery::Queued(_) => "queued",
        };
        f.debug_struct("NotificationDispatcher")
            .field("mode", &mode)
            .finish()
    }
}

async fn deliver(emitter: &dyn NotificationEmitter, notification: &Notification) {
    if let Err(e) = emitter
        .notify(notification.user_id, &notification.message)
        .await
    {
        metrics::counter!("notifications_failed_total").increment(1);
        tracing::warn!(user_id = %notification.user_id, error = %e, "notification delivery failed");
    }
}
