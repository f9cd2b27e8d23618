//! Report repository: a flat directory of files.
//!
//! A report's display name is its filename up to the last `.`; the full
//! filename is the `href` used to fetch it from `/source_reports`.

use regex::Regex;
use serde::Serialize;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs,
    io::{AsyncRead, AsyncWriteExt},
};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid report name: {0:?}")]
    InvalidName(String),
    #[error("report i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub name: String,
    pub href: String,
}

impl Report {
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        Self {
            name: display_name(file_name).to_string(),
            href: file_name.to_string(),
        }
    }
}

/// Filename without its last extension; the whole name when there is none.
#[must_use]
pub fn display_name(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// A single path component that is not hidden and has no separators.
#[must_use]
pub fn valid_report_name(name: &str) -> bool {
    !name.starts_with('.') && Regex::new(r"^[^/\\\x00]+$").is_ok_and(|re| re.is_match(name))
}

async fn copy_to_file<R>(data: &mut R, file: &mut fs::File) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let written = tokio::io::copy(data, file).await?;
    file.flush().await?;
    Ok(written)
}

#[derive(Clone, Debug)]
pub struct ReportRepository {
    directory: PathBuf,
}

impl ReportRepository {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ReportError> {
        if !valid_report_name(name) {
            return Err(ReportError::InvalidName(name.to_string()));
        }
        Ok(self.directory.join(name))
    }

    fn io_error(&self, path: &Path) -> impl FnOnce(io::Error) -> ReportError {
        let path = path.to_path_buf();
        move |source| ReportError::Io { path, source }
    }

    /// All reports in the directory, sorted by filename. Hidden files are skipped.
    ///
    /// # Errors
    /// Returns [`ReportError::Io`] if the directory cannot be read.
    pub async fn list(&self) -> Result<Vec<Report>, ReportError> {
        let mut entries = fs::read_dir(&self.directory)
            .await
            .map_err(self.io_error(&self.directory))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(self.io_error(&self.directory))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(self.io_error(&entry.path()))?;
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 report name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names.iter().map(|name| Report::from_file_name(name)).collect())
    }

    /// Write `data` to a report named `name`, replacing any existing file.
    ///
    /// # Errors
    /// Returns [`ReportError::InvalidName`] or [`ReportError::Io`].
    pub async fn add<R>(&self, name: &str, data: &mut R) -> Result<(), ReportError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = self.path_for(name)?;
        let mut file = fs::File::create(&path).await.map_err(self.io_error(&path))?;
        let result = copy_to_file(data, &mut file).await;
        drop(file);

        match result {
            Ok(written) => {
                info!(report = name, bytes = written, "report stored");
                Ok(())
            }
            Err(source) => {
                if let Err(err) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), "failed to remove partial report: {err}");
                }
                Err(ReportError::Io { path, source })
            }
        }
    }

    /// Remove the report named `name`.
    ///
    /// # Errors
    /// Returns [`ReportError::InvalidName`] or [`ReportError::Io`] (including
    /// when the file does not exist).
    pub async fn delete(&self, name: &str) -> Result<(), ReportError> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).await.map_err(self.io_error(&path))?;

        info!(report = name, "report deleted");
        Ok(())
    }
}
