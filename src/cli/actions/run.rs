use crate::cli::actions::{admin, migrate, server, Action};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::Migrate { dsn } => migrate::execute(&dsn).await,
        Action::GrantAdmin { dsn, login } => admin::execute(&dsn, &login).await,
    }
}
