//! Notification emitter trait and a recording implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::UserId;

use super::CollaboratorError;

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: UserId,
    pub message: String,
}

impl Notification {
    pub fn new(user_id: UserId, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
        }
    }
}

/// Fire-and-forget delivery of a message to a user.
///
/// Callers never depend on delivery; an `Err` is only logged.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<Notification>,
    fail_on_notify: bool,
}

/// Emitter that keeps every delivered notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates a notifier with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to reject every delivery.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_notify = fail;
    }

    /// Returns every delivered notification in delivery order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
            .clone()
    }

    /// Returns the notifications delivered to one user.
    pub fn notifications_for(&self, user_id: UserId) -> Vec<Notification> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Returns the number of delivered notifications.
    pub fn count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
            .len()
    }
}

#[async_trait]
impl NotificationEmitter for RecordingNotifier {
    async fn notify(&self, user_id: UserId, message: &str) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if state.fail_on_notify {
            return Err(CollaboratorError::Unavailable(
                "notification channel down".to_string(),
            ));
        }

        state.delivered.push(Notification::new(user_id, message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_deliveries_per_user() {
        let notifier = RecordingNotifier::new();
        let alice = UserId::new();
        let bob = UserId::new();

        notifier.notify(alice, "one").await.unwrap();
        notifier.notify(bob, "two").await.unwrap();
        notifier.notify(alice, "three").await.unwrap();

        assert_eq!(notifier.count(), 3);
        let for_alice = notifier.notifications_for(alice);
        assert_eq!(for_alice.len(), 2);
        assert_eq!(for_alice[1].message, "three");
    }

    #[tokio::test]
    async fn failing_notifier_records_nothing() {
        let notifier = RecordingNotifier::new();
        notifier.set_fail_on_notify(true);

        assert!(notifier.notify(UserId::new(), "lost").await.is_err());
        assert_eq!(notifier.count(), 0);
    }
}
