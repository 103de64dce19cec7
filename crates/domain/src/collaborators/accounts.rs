//! Account directory trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::UserId;

use super::CollaboratorError;

/// The part of a user account the order core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub blocked: bool,
}

impl Account {
    /// Returns true if the account may place orders.
    pub fn is_active(&self) -> bool {
        !self.blocked
    }
}

/// Looks up user accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns the account, or `None` if no such user exists.
    async fn find_account(&self, user_id: UserId) -> Result<Option<Account>, CollaboratorError>;
}

/// In-memory account directory for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<UserId, Account>>>,
}

impl InMemoryAccountDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active account.
    pub fn register(&self, user_id: UserId) {
        self.put(Account {
            id: user_id,
            blocked: false,
        });
    }

    /// Marks an account as blocked or unblocked.
    pub fn set_blocked(&self, user_id: UserId, blocked: bool) {
        self.put(Account {
            id: user_id,
            blocked,
        });
    }

    fn put(&self, account: Account) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.id, account);
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_account(&self, user_id: UserId) -> Result<Option<Account>, CollaboratorError> {
        Ok(self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_account_is_active() {
        let directory = InMemoryAccountDirectory::new();
        let user = UserId::new();
        directory.register(user);

        let account = directory.find_account(user).await.unwrap().unwrap();
        assert!(account.is_active());
    }

    #[tokio::test]
    async fn blocked_account_is_inactive() {
        let directory = InMemoryAccountDirectory::new();
        let user = UserId::new();
        directory.register(user);
        directory.set_blocked(user, true);

        let account = directory.find_account(user).await.unwrap().unwrap();
        assert!(!account.is_active());
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let directory = InMemoryAccountDirectory::new();
        assert!(directory.find_account(UserId::new()).await.unwrap().is_none());
    }
}
