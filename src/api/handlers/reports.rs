//! Report viewing plus the admin-only upload and delete routes.

use axum::{
    extract::{Extension, Multipart, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::{
    api::{
        context::CurrentUser,
        render::{PageRenderer, REPORT},
    },
    reports::{Report, ReportError, ReportRepository},
};

use super::{found, internal_error, page_data, render_page};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub report: Option<String>,
}

/// Upload fields collected from the multipart body, in any order.
#[derive(Default)]
struct Upload {
    name: Option<String>,
    file_name: Option<String>,
    data: Option<Vec<u8>>,
}

impl Upload {
    /// `<name>.<ext>` where the extension comes from the uploaded filename.
    fn target_name(&self) -> Option<String> {
        let name = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let extension = self
            .file_name
            .as_deref()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty());
        Some(match extension {
            Some(ext) => format!("{name}.{ext}"),
            None => name.to_string(),
        })
    }
}

fn report_error_response(err: &ReportError) -> Response {
    match err {
        ReportError::InvalidName(name) => {
            warn!(report = %name, "rejected report name");
            (StatusCode::BAD_REQUEST, "Invalid report name").into_response()
        }
        ReportError::Io { .. } => {
            error!("Report operation failed: {err}");
            internal_error()
        }
    }
}

#[instrument(skip_all)]
pub async fn view_report(
    current: CurrentUser,
    Extension(renderer): Extension<Arc<dyn PageRenderer>>,
    Query(query): Query<ReportQuery>,
) -> Response {
    if !current.is_authorized() {
        return found("/");
    }
    let Some(file_name) = query.report.filter(|report| !report.is_empty()) else {
        return found("/");
    };

    let mut data = page_data(&current);
    data.insert("report".to_string(), json!(Report::from_file_name(&file_name)));
    render_page(renderer.as_ref(), REPORT, data)
}

#[instrument(skip_all)]
pub async fn add_report(
    current: CurrentUser,
    Extension(reports): Extension<Arc<ReportRepository>>,
    mut multipart: Multipart,
) -> Response {
    if !current.is_admin() {
        error!("non-admin attempted to upload a report");
        return found("/");
    }

    let mut upload = Upload::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Malformed upload: {err}");
                return (StatusCode::BAD_REQUEST, "Malformed upload").into_response();
            }
        };

        let field_name = field.name().map(ToString::to_string);
        match field_name.as_deref() {
            Some("name") => match field.text().await {
                Ok(text) => upload.name = Some(text),
                Err(err) => {
                    warn!("Failed to read report name: {err}");
                    return (StatusCode::BAD_REQUEST, "Malformed upload").into_response();
                }
            },
            Some("file") => {
                upload.file_name = field.file_name().map(ToString::to_string);
                match field.bytes().await {
                    Ok(bytes) => upload.data = Some(bytes.to_vec()),
                    Err(err) => {
                        warn!("Failed to read report file: {err}");
                        return (StatusCode::BAD_REQUEST, "Malformed upload").into_response();
                    }
                }
            }
            _ => {}
        }
    }

    let (Some(target), Some(data)) = (upload.target_name(), upload.data.as_deref()) else {
        return (StatusCode::BAD_REQUEST, "Both name and file are required").into_response();
    };

    let mut reader = data;
    match reports.add(&target, &mut reader).await {
        Ok(()) => found("/"),
        Err(err) => report_error_response(&err),
    }
}

#[instrument(skip_all)]
pub async fn delete_report(
    current: CurrentUser,
    Extension(reports): Extension<Arc<ReportRepository>>,
    Query(query): Query<ReportQuery>,
) -> Response {
    if !current.is_admin() {
        error!("non-admin attempted to delete a report");
        return found("/");
    }
    let Some(file_name) = query.report else {
        return found("/");
    };

    match reports.delete(&file_name).await {
        Ok(()) => found("/"),
        Err(err) => report_error_response(&err),
    }
}
