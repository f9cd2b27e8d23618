use crate::{
    cli::actions::migrate::connect_and_migrate,
    store::{CredentialStore, StoreError},
};
use anyhow::{anyhow, Result};
use tracing::info;

/// Execute the grant-admin action.
/// # Errors
/// Returns an error if the user does not exist or the database fails.
pub async fn execute(dsn: &str, login: &str) -> Result<()> {
    let store = connect_and_migrate(dsn).await?;

    let result = store.set_admin(login, true).await;
    store.pool().close().await;

    match result {
        Ok(user) => {
            info!(user_id = %user.id, "admin granted");
            println!("{} is now an admin", user.login);
            Ok(())
        }
        Err(StoreError::NotFound) => Err(anyhow!("no user with login {login:?}")),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCredentialStore;

    #[tokio::test]
    async fn promotes_existing_user() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dsn = format!("sqlite://{}", dir.path().join("reportal.db").display());

        let store = connect_and_migrate(&dsn).await?;
        store.create_user("alice", "hash").await?;
        store.pool().close().await;

        execute(&dsn, "alice").await?;

        let store = SqliteCredentialStore::connect(&dsn).await?;
        assert!(store.find_user_by_login("alice").await?.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_login_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dsn = format!("sqlite://{}", dir.path().join("reportal.db").display());

        let result = execute(&dsn, "ghost").await;
        assert!(result.is_err());
        Ok(())
    }
}
