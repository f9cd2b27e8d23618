//! Route handlers and the helpers they share for rendering and redirects.

pub mod health;
pub mod pages;
pub mod reports;

use axum::{
    http::{
        header::{CONTENT_TYPE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use serde_json::{json, Map, Value};
use tracing::error;

use super::{context::CurrentUser, render::PageRenderer};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Generic 500 that never carries internal error text.
#[must_use]
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        INTERNAL_ERROR_MESSAGE,
    )
        .into_response()
}

/// `302 Found` to `location`.
#[must_use]
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(LOCATION, HeaderValue::from_static(location))]).into_response()
}

/// `302 Found` to `/` while setting a cookie.
#[must_use]
pub fn found_with_cookie(cookie: HeaderValue) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    headers.insert(LOCATION, HeaderValue::from_static("/"));
    (StatusCode::FOUND, headers).into_response()
}

/// Base data map for every page: `authorized` plus `user` when signed in.
#[must_use]
pub fn page_data(current: &CurrentUser) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("authorized".to_string(), json!(current.is_authorized()));
    if let Some(user) = current.user() {
        data.insert("user".to_string(), json!(user));
    }
    data
}

/// Render `template` or fall back to a generic 500.
#[must_use]
pub fn render_page(
    renderer: &dyn PageRenderer,
    template: &str,
    data: Map<String, Value>,
) -> Response {
    match renderer.render(template, &Value::Object(data)) {
        Ok(page) => Html(page).into_response(),
        Err(err) => {
            error!("Failed to render {template}: {err}");
            internal_error()
        }
    }
}
