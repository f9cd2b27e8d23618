//! Index and account pages.
//!
//! Flow Overview:
//! 1) Read the identity the gate attached to the request.
//! 2) For form posts, run the session service call.
//! 3) On success set the session cookie and redirect home; on a client error
//!    re-render the form with a user-facing message; on anything else log it
//!    and show a generic message.

use axum::{
    extract::{Extension, Form},
    http::HeaderMap,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::{
        context::CurrentUser,
        cookie::{extract_session_token, CookieConfig},
        render::{PageRenderer, INDEX, LOGIN, SIGNUP},
    },
    auth::{validate_credentials, validate_signup, AuthError, AuthService, SessionToken},
    reports::ReportRepository,
};

use super::{found, found_with_cookie, internal_error, page_data, render_page};

const DUPLICATE_LOGIN_MESSAGE: &str = "A user with this login already exists";
const FAILED_LOGIN_MESSAGE: &str = "No user with this login and password combination";
const UNKNOWN_ERROR_MESSAGE: &str = "Unknown server error";

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: SecretString,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: SecretString,
    #[serde(default, rename = "passwordRepeat")]
    pub password_repeat: SecretString,
}

/// Message shown back in the form. Server faults are logged here and masked.
fn form_error_message(err: &AuthError) -> String {
    if !err.is_client_error() {
        error!("Auth request failed: {err}");
        return UNKNOWN_ERROR_MESSAGE.to_string();
    }
    match err {
        AuthError::DuplicateLogin => DUPLICATE_LOGIN_MESSAGE.to_string(),
        AuthError::NotFound | AuthError::BadPassword => FAILED_LOGIN_MESSAGE.to_string(),
        _ => err.to_string(),
    }
}

fn session_redirect(cookies: &CookieConfig, token: &SessionToken) -> Response {
    match cookies.session_cookie(token.as_str()) {
        Ok(cookie) => found_with_cookie(cookie),
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            internal_error()
        }
    }
}

#[instrument(skip_all)]
pub async fn index(
    current: CurrentUser,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
) -> Response {
    let mut data = page_data(&current);
    match reports.list().await {
        Ok(list) => {
            data.insert("reports".to_string(), json!(list));
            render_page(renderer.as_ref(), INDEX, data)
        }
        Err(err) => {
            error!("Failed to list reports: {err}");
            internal_error()
        }
    }
}

pub async fn signup_page(
    current: CurrentUser,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
) -> Response {
    render_page(renderer.as_ref(), SIGNUP, page_data(&current))
}

pub async fn login_page(
    current: CurrentUser,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
) -> Response {
    render_page(renderer.as_ref(), LOGIN, page_data(&current))
}

/// Create the account, then log straight in.
async fn sign_up_and_log_in(
    auth: &AuthService,
    form: &SignUpForm,
) -> Result<SessionToken, AuthError> {
    validate_signup(
        &form.login,
        form.password.expose_secret(),
        form.password_repeat.expose_secret(),
    )?;
    auth.sign_up(&form.login, &form.password).await?;
    auth.log_in(&form.login, &form.password).await
}

#[instrument(skip_all, fields(login = %form.login))]
pub async fn signup(
    current: CurrentUser,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
    Extension(cookies): Extension<CookieConfig>,
    Form(form): Form<SignUpForm>,
) -> Response {
    match sign_up_and_log_in(&auth, &form).await {
        Ok(token) => session_redirect(&cookies, &token),
        Err(err) => {
            let mut data = page_data(&current);
            data.insert("login".to_string(), json!(form.login));
            data.insert("error".to_string(), json!(form_error_message(&err)));
            render_page(renderer.as_ref(), SIGNUP, data)
        }
    }
}

async fn validate_and_log_in(auth: &AuthService, form: &LoginForm) -> Result<SessionToken, AuthError> {
    validate_credentials(&form.login, form.password.expose_secret())?;
    auth.log_in(&form.login, &form.password).await
}

#[instrument(skip_all, fields(login = %form.login))]
pub async fn login(
    current: CurrentUser,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
    Extension(cookies): Extension<CookieConfig>,
    Form(form): Form<LoginForm>,
) -> Response {
    match validate_and_log_in(&auth, &form).await {
        Ok(token) => session_redirect(&cookies, &token),
        Err(err) => {
            let mut data = page_data(&current);
            data.insert("login".to_string(), json!(form.login));
            data.insert("error".to_string(), json!(form_error_message(&err)));
            render_page(renderer.as_ref(), LOGIN, data)
        }
    }
}

/// Clear the cookie and go home. The server-side row is only removed when
/// revocation is enabled on the service.
#[instrument(skip_all)]
pub async fn signout(
    headers: HeaderMap,
    Extension(auth): Extension<Arc<AuthService>>,
    Extension(cookies): Extension<CookieConfig>,
) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = auth.log_out(&token).await {
            error!("Failed to revoke session: {err}");
        }
    }

    match cookies.clear_session_cookie() {
        Ok(cookie) => found_with_cookie(cookie),
        Err(err) => {
            error!("Failed to build logout cookie: {err}");
            found("/")
        }
    }
}
