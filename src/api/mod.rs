//! HTTP surface: route table, middleware stack and the listener.
//!
//! Every route sits behind the authorization gate, so handlers can always
//! extract [`context::CurrentUser`].

use anyhow::Result;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware::from_fn_with_state,
    routing::get,
    Extension, Router,
};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

use crate::{auth::AuthService, reports::ReportRepository};

pub mod context;
pub mod cookie;
pub mod gate;
pub mod handlers;
pub mod render;

use cookie::CookieConfig;
use handlers::{health, pages, reports};
use render::PageRenderer;

const REQUEST_ID_HEADER: &str = "x-request-id";
const UPLOAD_LIMIT_BYTES: usize = 64 * 1024 * 1024;

/// Everything the router hands to handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth: Arc<AuthService>,
    pub reports: Arc<ReportRepository>,
    pub renderer: Arc<dyn PageRenderer>,
    pub cookies: CookieConfig,
    pub assets_dir: PathBuf,
}

/// Build the application router with the gate and tracing layers applied.
#[must_use]
pub fn router(state: AppState) -> Router {
    let source_reports = ServeDir::new(state.reports.directory());
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .route("/", get(pages::index))
        .route("/signup", get(pages::signup_page).post(pages::signup))
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/signout", get(pages::signout))
        .route(
            "/report",
            get(reports::view_report)
                .post(reports::add_report)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/delete_report", get(reports::delete_report))
        .route("/health", get(health::health))
        .nest_service("/assets", assets)
        .nest_service("/source_reports", source_reports)
        .layer(from_fn_with_state(state.auth.clone(), gate::authorize))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state.auth))
                .layer(Extension(state.reports))
                .layer(Extension(state.renderer))
                .layer(Extension(state.cookies))
                .layer(Extension(state.pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn serve(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
