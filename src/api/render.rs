//! Page renderer.
//!
//! Handlers build a JSON data map (always carrying `authorized` and, when
//! signed in, `user`) and hand it to a [`PageRenderer`] by template name.

use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;
use url::form_urlencoded;

pub const INDEX: &str = "index.html";
pub const SIGNUP: &str = "signup.html";
pub const LOGIN: &str = "login.html";
pub const REPORT: &str = "report.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    #[error("failed to format page: {0}")]
    Format(#[from] std::fmt::Error),
}

pub trait PageRenderer: Send + Sync {
    /// Render `template` with `data` into an HTML document.
    ///
    /// # Errors
    /// Returns [`RenderError`] if the template is unknown or formatting fails.
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError>;
}

/// Built-in renderer for the four application pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl PageRenderer for HtmlRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, RenderError> {
        let (title, body) = match template {
            INDEX => ("Reports", index_body(data)?),
            SIGNUP => ("Sign up", signup_body(data)?),
            LOGIN => ("Log in", login_body(data)?),
            REPORT => ("Report", report_body(data)?),
            other => return Err(RenderError::UnknownTemplate(other.to_string())),
        };
        layout(title, data, &body)
    }
}

/// Minimal HTML escaping for text and attribute values.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn is_authorized(data: &Value) -> bool {
    data.get("authorized")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn is_admin(data: &Value) -> bool {
    data.get("user")
        .and_then(|user| user.get("is_admin"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn layout(title: &str, data: &Value, body: &str) -> Result<String, RenderError> {
    let mut page = String::new();
    write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/assets/style.css\">\n</head>\n<body>\n<nav>\n\
         <a href=\"/\">Reports</a>\n",
        escape(title)
    )?;

    if is_authorized(data) {
        let login = data
            .get("user")
            .and_then(|user| user.get("login"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        write!(
            page,
            "<span class=\"user\">{}</span>\n<a href=\"/signout\">Sign out</a>\n",
            escape(login)
        )?;
    } else {
        page.push_str("<a href=\"/login\">Log in</a>\n<a href=\"/signup\">Sign up</a>\n");
    }

    page.push_str("</nav>\n<main>\n");
    page.push_str(body);
    page.push_str("</main>\n</body>\n</html>\n");
    Ok(page)
}

fn error_block(data: &Value) -> String {
    str_field(data, "error").map_or_else(String::new, |error| {
        format!("<p class=\"error\">{}</p>\n", escape(error))
    })
}

fn index_body(data: &Value) -> Result<String, RenderError> {
    let mut body = String::from("<h1>Reports</h1>\n");
    body.push_str(&error_block(data));

    let reports = data
        .get("reports")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let admin = is_admin(data);

    if reports.is_empty() {
        body.push_str("<p>No reports yet.</p>\n");
    } else {
        body.push_str("<ul class=\"reports\">\n");
        for report in reports {
            let name = str_field(report, "name").unwrap_or_default();
            let href = str_field(report, "href").unwrap_or_default();
            write!(
                body,
                "<li><a href=\"/report?report={}\">{}</a>",
                escape(&query_value(href)),
                escape(name)
            )?;
            if admin {
                write!(
                    body,
                    " <a class=\"delete\" href=\"/delete_report?report={}\">Delete</a>",
                    escape(&query_value(href))
                )?;
            }
            body.push_str("</li>\n");
        }
        body.push_str("</ul>\n");
    }

    if admin {
        body.push_str(
            "<form method=\"post\" action=\"/report\" enctype=\"multipart/form-data\">\n\
             <input type=\"text\" name=\"name\" placeholder=\"Report name\" required>\n\
             <input type=\"file\" name=\"file\" required>\n\
             <button type=\"submit\">Upload</button>\n</form>\n",
        );
    }

    Ok(body)
}

fn credentials_form(
    data: &Value,
    heading: &str,
    action: &str,
    confirm: bool,
) -> Result<String, RenderError> {
    let mut body = String::new();
    write!(body, "<h1>{}</h1>\n", escape(heading))?;
    body.push_str(&error_block(data));
    write!(
        body,
        "<form method=\"post\" action=\"{}\">\n\
         <input type=\"text\" name=\"login\" placeholder=\"Login\" value=\"{}\" required>\n\
         <input type=\"password\" name=\"password\" placeholder=\"Password\" required>\n",
        escape(action),
        escape(str_field(data, "login").unwrap_or_default())
    )?;
    if confirm {
        body.push_str(
            "<input type=\"password\" name=\"passwordRepeat\" placeholder=\"Repeat password\" required>\n",
        );
    }
    write!(
        body,
        "<button type=\"submit\">{}</button>\n</form>\n",
        escape(heading)
    )?;
    Ok(body)
}

fn signup_body(data: &Value) -> Result<String, RenderError> {
    credentials_form(data, "Sign up", "/signup", true)
}

fn login_body(data: &Value) -> Result<String, RenderError> {
    credentials_form(data, "Log in", "/login", false)
}

fn report_body(data: &Value) -> Result<String, RenderError> {
    let report = data.get("report").unwrap_or(&Value::Null);
    let name = str_field(report, "name").unwrap_or_default();
    let href = str_field(report, "href").unwrap_or_default();
    let source = format!("/source_reports/{}", escape(&query_value(href).replace('+', "%20")));

    let mut body = String::new();
    write!(
        body,
        "<h1>{}</h1>\n<p><a href=\"{source}\" download>Download</a></p>\n\
         <iframe class=\"report\" src=\"{source}\"></iframe>\n",
        escape(name)
    )?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn unknown_template_is_an_error() {
        let result = HtmlRenderer.render("missing.html", &json!({}));
        assert!(matches!(result, Err(RenderError::UnknownTemplate(_))));
    }

    #[test]
    fn anonymous_pages_offer_login_and_signup() -> anyhow::Result<()> {
        let page = HtmlRenderer.render(LOGIN, &json!({ "authorized": false }))?;
        assert!(page.contains("href=\"/login\""));
        assert!(page.contains("href=\"/signup\""));
        assert!(!page.contains("/signout"));
        Ok(())
    }

    #[test]
    fn signed_in_user_is_escaped_in_nav() -> anyhow::Result<()> {
        let data = json!({
            "authorized": true,
            "user": { "login": "<script>", "is_admin": false },
        });
        let page = HtmlRenderer.render(INDEX, &data)?;
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("/signout"));
        Ok(())
    }

    #[test]
    fn index_shows_admin_controls_only_to_admins() -> anyhow::Result<()> {
        let reports = json!([{ "name": "q3 results", "href": "q3 results.pdf" }]);
        let member = json!({
            "authorized": true,
            "user": { "login": "alice", "is_admin": false },
            "reports": reports,
        });
        let page = HtmlRenderer.render(INDEX, &member)?;
        assert!(page.contains("/report?report=q3+results.pdf"));
        assert!(!page.contains("/delete_report"));
        assert!(!page.contains("multipart/form-data"));

        let admin = json!({
            "authorized": true,
            "user": { "login": "root", "is_admin": true },
            "reports": reports,
        });
        let page = HtmlRenderer.render(INDEX, &admin)?;
        assert!(page.contains("/delete_report?report=q3+results.pdf"));
        assert!(page.contains("multipart/form-data"));
        Ok(())
    }

    #[test]
    fn forms_echo_login_and_error() -> anyhow::Result<()> {
        let data = json!({
            "authorized": false,
            "login": "alice",
            "error": "Passwords do not match",
        });
        let page = HtmlRenderer.render(SIGNUP, &data)?;
        assert!(page.contains("value=\"alice\""));
        assert!(page.contains("Passwords do not match"));
        assert!(page.contains("name=\"passwordRepeat\""));
        Ok(())
    }

    #[test]
    fn report_page_links_source_file() -> anyhow::Result<()> {
        let data = json!({
            "authorized": true,
            "user": { "login": "alice", "is_admin": false },
            "report": { "name": "q3 results", "href": "q3 results.pdf" },
        });
        let page = HtmlRenderer.render(REPORT, &data)?;
        assert!(page.contains("<h1>q3 results</h1>"));
        assert!(page.contains("/source_reports/q3%20results.pdf"));
        Ok(())
    }
}
