//! User accounts and their granted roles.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;
use crate::scopes::{DEFAULT_USER_ROLES, is_known_scope};

/// A user able to obtain access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique login name.
    pub username: String,
    /// Granted scopes.
    pub roles: Vec<String>,
}

impl User {
    /// A user with the default role set.
    pub fn with_default_roles(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: DEFAULT_USER_ROLES.iter().map(|r| (*r).to_owned()).collect(),
        }
    }

    /// Whether `scope` was granted.
    pub fn has_role(&self, scope: &str) -> bool {
        self.roles.iter().any(|r| r == scope)
    }
}

/// Read access to user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by name.
    async fn get_by_username(&self, username: &str) -> Option<User>;
}

/// Process-local user directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user. Every role must be a known scope.
    pub fn insert(&self, user: User) -> Result<(), AuthError> {
        if let Some(bad) = user.roles.iter().find(|r| !is_known_scope(r)) {
            return Err(AuthError::InvalidRole(bad.clone()));
        }
        let mut users = self.users.write();
        if users.contains_key(&user.username) {
            return Err(AuthError::UserExists(user.username));
        }
        let _ = users.insert(user.username.clone(), user);
        Ok(())
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_by_username(&self, username: &str) -> Option<User> {
        self.users.read().get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn insert_and_lookup() {
        let dir = InMemoryUserDirectory::new();
        dir.insert(User::with_default_roles("bob")).unwrap();
        let user = dir.get_by_username("bob").await.unwrap();
        assert!(user.has_role("user:own"));
        assert!(!user.has_role("admin"));
        assert!(dir.get_by_username("alice").await.is_none());
    }

    #[test]
    fn duplicate_username_rejected() {
        let dir = InMemoryUserDirectory::new();
        dir.insert(User::with_default_roles("bob")).unwrap();
        assert_matches!(
            dir.insert(User::with_default_roles("bob")),
            Err(AuthError::UserExists(name)) if name == "bob"
        );
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn unknown_role_rejected() {
        let dir = InMemoryUserDirectory::new();
        let user = User {
            username: "eve".into(),
            roles: vec!["root".into()],
        };
        assert_matches!(dir.insert(user), Err(AuthError::InvalidRole(r)) if r == "root");
        assert!(dir.is_empty());
    }
}
