//! Credential store: persistence for users and sessions.
//!
//! Every operation touches a single row. Uniqueness of `users.login` and
//! `sessions.token` is enforced by the database, so concurrent writers racing
//! on the same key observe [`StoreError::Duplicate`] rather than needing
//! application-level locking.

mod sqlite;

pub use sqlite::SqliteCredentialStore;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by a [`CredentialStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (user login or session token) already exists.
    #[error("record already exists")]
    Duplicate,
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A registered account.
///
/// The password hash is never serialized and is redacted from `Debug`
/// output, so a `User` can be handed to the renderer or logged safely.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"***")
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

/// Server-side proof that a login happened. The row's existence is the only
/// validity check; there is no expiry column.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Duplicate`] when the login is taken.
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_login(&self, login: &str) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    async fn create_session(&self, token: &str, user_id: Uuid) -> Result<Session, StoreError>;

    async fn find_session_by_token(&self, token: &str) -> Result<Session, StoreError>;

    /// Remove a session row. Unknown tokens are not an error.
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    /// Flip the admin flag on an existing user (operator tooling only).
    async fn set_admin(&self, login: &str, is_admin: bool) -> Result<User, StoreError>;
}
