use crate::store::SqliteCredentialStore;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite creates the file but not its directory.
async fn ensure_parent_dir(dsn: &str) -> Result<()> {
    let options = SqliteConnectOptions::from_str(dsn).context("Invalid database DSN")?;
    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            debug!(dir = %parent.display(), "ensuring database directory");
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Open (creating if needed) the database and apply the schema.
/// # Errors
/// Returns an error if the database cannot be opened or the schema fails.
pub async fn connect_and_migrate(dsn: &str) -> Result<SqliteCredentialStore> {
    ensure_parent_dir(dsn).await?;
    let store = SqliteCredentialStore::connect(dsn)
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to apply schema")?;
    Ok(store)
}

/// Execute the migrate action.
/// # Errors
/// Returns an error if the schema cannot be applied.
pub async fn execute(dsn: &str) -> Result<()> {
    let store = connect_and_migrate(dsn).await?;
    store.pool().close().await;

    info!("Schema applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_database_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("db").join("reportal.db");
        let dsn = format!("sqlite://{}", path.display());

        execute(&dsn).await?;
        assert!(path.exists());

        // Running twice is harmless.
        execute(&dsn).await?;
        Ok(())
    }
}
