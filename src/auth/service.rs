//! Session service: signup, login, and session resolution.
//!
//! Flow Overview:
//! 1) `sign_up` validates the credentials, hashes the password, and inserts the user.
//! 2) `log_in` re-verifies the password and only then issues a fresh session row.
//! 3) `check_session` resolves a token to its session, then to the owning user.
//!
//! Every call goes to the store; nothing is cached in process.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::store::{CredentialStore, User};

use super::{
    error::AuthError,
    password::PasswordHasher,
    token::{generate_session_token, SessionToken},
    validation::validate_credentials,
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    revoke_on_logout: bool,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            revoke_on_logout: false,
        }
    }

    /// Delete the server-side session row on logout instead of only clearing the cookie.
    #[must_use]
    pub fn with_revoke_on_logout(mut self, revoke: bool) -> Self {
        self.revoke_on_logout = revoke;
        self
    }

    /// Create a user with a salted hash of `password`.
    ///
    /// # Errors
    /// [`AuthError::Validation`] for short input, [`AuthError::DuplicateLogin`]
    /// if the login exists, [`AuthError::Store`] for persistence failures.
    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, login: &str, password: &SecretString) -> Result<User, AuthError> {
        validate_credentials(login, password.expose_secret())?;

        let hash = self.hash_password(password).await?;
        let user = self.store.create_user(login, &hash).await?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Verify the password and issue a new session.
    ///
    /// # Errors
    /// [`AuthError::NotFound`] for an unknown login, [`AuthError::BadPassword`]
    /// on mismatch (no session is written), [`AuthError::Store`] otherwise.
    #[instrument(skip(self, password))]
    pub async fn log_in(
        &self,
        login: &str,
        password: &SecretString,
    ) -> Result<SessionToken, AuthError> {
        let user = self.store.find_user_by_login(login).await?;

        if !self.verify_password(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::BadPassword);
        }

        let token = generate_session_token()?;
        // A token collision is a server fault, not a duplicate login.
        self.store
            .create_session(token.as_str(), user.id)
            .await
            .map_err(AuthError::Store)?;

        info!(user_id = %user.id, "session issued");
        Ok(token)
    }

    /// Resolve a session token to its user.
    ///
    /// # Errors
    /// [`AuthError::NotFound`] if the token is empty or unknown (or its user
    /// vanished), [`AuthError::Store`] for persistence failures.
    #[instrument(skip_all)]
    pub async fn check_session(&self, token: &str) -> Result<User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotFound);
        }

        let session = self.store.find_session_by_token(token).await?;
        let user = self.store.find_user_by_id(session.user_id).await?;
        Ok(user)
    }

    /// Server side of logout. A no-op unless revocation is enabled; the
    /// cookie is cleared by the caller either way.
    ///
    /// # Errors
    /// [`AuthError::Store`] if the session row cannot be deleted.
    #[instrument(skip_all)]
    pub async fn log_out(&self, token: &str) -> Result<(), AuthError> {
        if !self.revoke_on_logout || token.is_empty() {
            return Ok(());
        }
        self.store
            .delete_session(token)
            .await
            .map_err(AuthError::Store)
    }

    async fn hash_password(&self, password: &SecretString) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.expose_secret().to_string());
        tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .map_err(|err| AuthError::Crypto(format!("hashing task failed: {err}")))?
    }

    async fn verify_password(
        &self,
        password: &SecretString,
        stored: &str,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.expose_secret().to_string());
        let stored = stored.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &stored))
            .await
            .map_err(|err| AuthError::Crypto(format!("verification task failed: {err}")))?
    }
}
