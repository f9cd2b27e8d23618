//! Authorization gate: resolves the session cookie into an identity for every
//! request before it reaches a handler.
//!
//! No cookie means anonymous without touching the store. An unknown or stale
//! token also degrades to anonymous; this is what makes logout (empty cookie)
//! and dropped sessions work. Only store failures surface, as a 500.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    auth::{AuthError, AuthService},
    store::User,
};

use super::{context, cookie::extract_session_token, handlers::internal_error};

/// Resolve the identity carried by `headers`.
///
/// # Errors
/// Returns any [`AuthError`] other than `NotFound` from the session lookup.
pub async fn resolve_identity(
    auth: &AuthService,
    headers: &HeaderMap,
) -> Result<Option<User>, AuthError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };

    match auth.check_session(&token).await {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::NotFound) => {
            debug!("unknown session cookie, continuing as anonymous");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn authorize(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match resolve_identity(&auth, request.headers()).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to check session: {err}");
            return internal_error();
        }
    };

    context::store(request.extensions_mut(), user);
    next.run(request).await
}
