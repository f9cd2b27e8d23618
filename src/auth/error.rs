//! Error taxonomy for the session service.

use thiserror::Error;

use crate::store::StoreError;

use super::validation::{MIN_LOGIN_LEN, MIN_PASSWORD_LEN};

/// Client input that fails basic form rules. The `Display` text is safe to
/// show to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Login must be at least {} characters long", MIN_LOGIN_LEN)]
    LoginTooShort,
    #[error("Password must be at least {} characters long", MIN_PASSWORD_LEN)]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("login is already taken")]
    DuplicateLogin,
    /// Unknown login, token, or session.
    #[error("not found")]
    NotFound,
    #[error("wrong password")]
    BadPassword,
    /// Hashing or random generation failed.
    #[error("crypto failure: {0}")]
    Crypto(String),
    #[error("store failure: {0}")]
    Store(#[source] StoreError),
}

impl AuthError {
    /// True for errors caused by what the client sent, as opposed to server faults.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::DuplicateLogin | Self::NotFound | Self::BadPassword
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => Self::DuplicateLogin,
            StoreError::NotFound => Self::NotFound,
            StoreError::Database(_) => Self::Store(err),
        }
    }
}
