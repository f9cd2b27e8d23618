use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use reportal::{
    api::{self, cookie::CookieConfig, render::HtmlRenderer, AppState},
    auth::{AuthService, PasswordHasher},
    reports::ReportRepository,
    store::{CredentialStore, SqliteCredentialStore},
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "reportal-test-boundary";

struct TestApp {
    _dir: TempDir,
    reports_dir: std::path::PathBuf,
    store: SqliteCredentialStore,
    router: Router,
}

async fn setup(revoke_on_logout: bool) -> Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let reports_dir = dir.path().join("reports");
    let assets_dir = dir.path().join("assets");
    std::fs::create_dir_all(&reports_dir)?;
    std::fs::create_dir_all(&assets_dir)?;
    std::fs::write(assets_dir.join("style.css"), "body {}")?;

    let dsn = format!("sqlite://{}", dir.path().join("reportal.db").display());
    let store = SqliteCredentialStore::connect(&dsn).await?;
    store.migrate().await?;

    let auth = AuthService::new(Arc::new(store.clone()), PasswordHasher::minimal()?)
        .with_revoke_on_logout(revoke_on_logout);

    let router = api::router(AppState {
        pool: store.pool().clone(),
        auth: Arc::new(auth),
        reports: Arc::new(ReportRepository::new(&reports_dir)),
        renderer: Arc::new(HtmlRenderer),
        cookies: CookieConfig::default(),
        assets_dir,
    });

    Ok(TestApp {
        _dir: dir,
        reports_dir,
        store,
        router,
    })
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Result<Response> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<Response> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::empty())?).await
    }

    async fn post_form(&self, uri: &str, form: &str) -> Result<Response> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))?;
        self.send(request).await
    }

    async fn upload(&self, cookie: &str, name: &str, file_name: &str, data: &str) -> Result<Response> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             {name}\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {data}\r\n\
             --{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/report")
            .header(COOKIE, cookie)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))?;
        self.send(request).await
    }

    /// Sign up and return the `name=value` cookie pair for the new session.
    async fn sign_up(&self, login: &str, password: &str) -> Result<String> {
        let response = self
            .post_form(
                "/signup",
                &format!("login={login}&password={password}&passwordRepeat={password}"),
            )
            .await?;
        assert_eq!(response.status(), StatusCode::FOUND);
        session_cookie(&response)
    }
}

fn session_cookie(response: &Response) -> Result<String> {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?;
    let pair = header.split(';').next().context("empty Set-Cookie")?;
    Ok(pair.to_string())
}

async fn body_text(response: Response) -> Result<String> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn signup_login_and_signout_flow() -> Result<()> {
    let app = setup(false).await?;

    let response = app.get("/", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let page = body_text(response).await?;
    assert!(page.contains("href=\"/login\""));

    let cookie = app.sign_up("alice", "hunter2").await?;
    assert!(cookie.starts_with("reportal_session="));
    assert!(cookie.len() > "reportal_session=".len());

    let page = body_text(app.get("/", Some(&cookie)).await?).await?;
    assert!(page.contains("alice"));
    assert!(page.contains("/signout"));

    // Each login issues a fresh session.
    let response = app.post_form("/login", "login=alice&password=hunter2").await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(LOCATION).map(|v| v.as_bytes()), Some(&b"/"[..]));
    let second = session_cookie(&response)?;
    assert_ne!(cookie, second);

    let response = app.get("/signout", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    let cleared = session_cookie(&response)?;
    assert_eq!(cleared, "reportal_session=");

    let page = body_text(app.get("/", Some(&cleared)).await?).await?;
    assert!(!page.contains("/signout"));

    // Without revocation the old token keeps working until it expires.
    let page = body_text(app.get("/", Some(&cookie)).await?).await?;
    assert!(page.contains("alice"));
    Ok(())
}

#[tokio::test]
async fn signout_revokes_session_when_enabled() -> Result<()> {
    let app = setup(true).await?;
    let cookie = app.sign_up("alice", "hunter2").await?;

    app.get("/signout", Some(&cookie)).await?;

    let page = body_text(app.get("/", Some(&cookie)).await?).await?;
    assert!(!page.contains("alice"));
    Ok(())
}

#[tokio::test]
async fn form_errors_are_rendered() -> Result<()> {
    let app = setup(false).await?;
    app.sign_up("alice", "hunter2").await?;

    let response = app
        .post_form("/signup", "login=alice&password=other1&passwordRepeat=other1")
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert!(body_text(response).await?.contains("already exists"));

    let response = app
        .post_form("/signup", "login=bobby&password=abcd&passwordRepeat=abce")
        .await?;
    assert!(body_text(response).await?.contains("Passwords do not match"));

    // Login length is checked before the password confirmation.
    let response = app
        .post_form("/signup", "login=bob&password=abcd&passwordRepeat=abce")
        .await?;
    assert!(body_text(response).await?.contains("Login must be at least 4"));

    let response = app.post_form("/signup", "login=bo&password=abcd&passwordRepeat=abcd").await?;
    assert!(body_text(response).await?.contains("Login must be at least 4"));

    let wrong = body_text(app.post_form("/login", "login=alice&password=wrong1").await?).await?;
    let unknown = body_text(app.post_form("/login", "login=nobody&password=wrong1").await?).await?;
    assert!(wrong.contains("No user with this login and password combination"));
    assert!(unknown.contains("No user with this login and password combination"));
    Ok(())
}

#[tokio::test]
async fn forged_cookie_is_anonymous() -> Result<()> {
    let app = setup(false).await?;
    let response = app.get("/", Some("reportal_session=forged")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await?.contains("/signout"));
    Ok(())
}

#[tokio::test]
async fn report_page_requires_session() -> Result<()> {
    let app = setup(false).await?;
    std::fs::write(app.reports_dir.join("q3.pdf"), "pdf")?;

    let response = app.get("/report?report=q3.pdf", None).await?;
    assert_eq!(response.status(), StatusCode::FOUND);

    let cookie = app.sign_up("alice", "hunter2").await?;
    let response = app.get("/report?report=q3.pdf", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await?.contains("/source_reports/q3.pdf"));

    let response = app.get("/source_reports/q3.pdf", Some(&cookie)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await?, "pdf");
    Ok(())
}

#[tokio::test]
async fn only_admins_manage_reports() -> Result<()> {
    let app = setup(false).await?;
    let member = app.sign_up("alice", "hunter2").await?;
    let admin = app.sign_up("root", "toor1234").await?;
    app.store.set_admin("root", true).await?;

    let response = app.upload(&member, "Q3", "draft.pdf", "member").await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(!app.reports_dir.join("Q3.pdf").exists());

    let response = app.upload(&admin, "Q3", "draft.pdf", "admin data").await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(std::fs::read_to_string(app.reports_dir.join("Q3.pdf"))?, "admin data");

    let page = body_text(app.get("/", Some(&member)).await?).await?;
    assert!(page.contains(">Q3</a>"));
    assert!(!page.contains("/delete_report"));

    let response = app.get("/delete_report?report=Q3.pdf", Some(&member)).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(app.reports_dir.join("Q3.pdf").exists());

    let response = app.get("/delete_report?report=Q3.pdf", Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(!app.reports_dir.join("Q3.pdf").exists());

    let response = app.get("/delete_report?report=..%2Freportal.db", Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn health_and_assets() -> Result<()> {
    let app = setup(false).await?;

    let response = app.get("/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_text(response).await?)?;
    assert_eq!(health["database"], "ok");
    assert_eq!(health["name"], "reportal");

    let response = app.get("/assets/style.css", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
