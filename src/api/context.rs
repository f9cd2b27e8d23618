//! Request-scoped identity slot.
//!
//! The authorization gate writes exactly one [`Identity`] into the request
//! extensions before any handler runs; handlers read it back through the
//! [`CurrentUser`] extractor. A request without an identity means the gate was
//! not wired in front of the route, which is a programming error.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};
use std::convert::Infallible;
use thiserror::Error;

use crate::store::User;

#[derive(Clone, Debug)]
struct Identity(Option<User>);

#[derive(Debug, Error)]
#[error("no identity in request extensions; the authorization gate is not installed")]
pub struct MissingIdentity;

/// Record the resolved identity (`None` = anonymous) for this request.
pub fn store(extensions: &mut Extensions, user: Option<User>) {
    extensions.insert(Identity(user));
}

/// Current user, if any. Anonymous and "gate never ran" both read as `None`.
#[must_use]
pub fn get(extensions: &Extensions) -> Option<User> {
    try_get(extensions).ok().flatten()
}

/// # Errors
/// Returns [`MissingIdentity`] if the gate did not run for this request.
pub fn try_get(extensions: &Extensions) -> Result<Option<User>, MissingIdentity> {
    extensions
        .get::<Identity>()
        .map(|identity| identity.0.clone())
        .ok_or(MissingIdentity)
}

/// Strict accessor for handlers that sit behind the gate.
///
/// # Panics
/// Panics if the gate did not run for this request.
#[must_use]
pub fn must_get(extensions: &Extensions) -> Option<User> {
    match try_get(extensions) {
        Ok(user) => user,
        Err(err) => panic!("{err}"),
    }
}

/// Extractor over [`must_get`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.0.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|user| user.is_admin)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(must_get(&parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn alice() -> User {
        User {
            id: Uuid::new_v4(),
            login: "alice".to_string(),
            password_hash: String::new(),
            is_admin: false,
        }
    }

    #[test]
    fn stored_user_is_returned() {
        let mut extensions = Extensions::new();
        let user = alice();
        store(&mut extensions, Some(user.clone()));
        assert_eq!(get(&extensions), Some(user.clone()));
        assert_eq!(must_get(&extensions), Some(user));
    }

    #[test]
    fn anonymous_is_distinct_from_missing() {
        let mut extensions = Extensions::new();
        assert!(try_get(&extensions).is_err());
        assert_eq!(get(&extensions), None);

        store(&mut extensions, None);
        assert!(matches!(try_get(&extensions), Ok(None)));
    }

    #[test]
    #[should_panic(expected = "authorization gate is not installed")]
    fn must_get_panics_without_gate() {
        let _ = must_get(&Extensions::new());
    }

    #[test]
    fn current_user_flags() {
        let anonymous = CurrentUser(None);
        assert!(!anonymous.is_authorized());
        assert!(!anonymous.is_admin());

        let mut admin = alice();
        admin.is_admin = true;
        let current = CurrentUser(Some(admin));
        assert!(current.is_authorized());
        assert!(current.is_admin());
    }
}
