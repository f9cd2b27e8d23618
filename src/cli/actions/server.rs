use crate::{
    api::{self, cookie::CookieConfig, render::HtmlRenderer, AppState},
    auth::{AuthService, PasswordHasher},
    cli::{actions::migrate::connect_and_migrate, commands::auth::Argon2Costs},
    reports::ReportRepository,
};
use anyhow::{Context, Result};
use argon2::Params;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub reports_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub session_ttl_seconds: i64,
    pub secure_cookie: bool,
    pub revoke_sessions_on_logout: bool,
    pub argon2: Argon2Costs,
}

/// Fill unset costs with the argon2 crate defaults.
fn password_hasher(costs: Argon2Costs) -> Result<PasswordHasher> {
    if costs == Argon2Costs::default() {
        return Ok(PasswordHasher::default());
    }

    PasswordHasher::from_costs(
        costs.memory_kib.unwrap_or(Params::DEFAULT_M_COST),
        costs.iterations.unwrap_or(Params::DEFAULT_T_COST),
        costs.parallelism.unwrap_or(Params::DEFAULT_P_COST),
    )
    .context("Invalid Argon2 parameters")
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database or reports directory cannot be prepared, or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    debug!(?args, "starting server");

    let hasher = password_hasher(args.argon2)?;

    let store = connect_and_migrate(&args.dsn).await?;
    let pool = store.pool().clone();

    tokio::fs::create_dir_all(&args.reports_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.reports_dir.display()))?;

    let auth = AuthService::new(Arc::new(store), hasher)
        .with_revoke_on_logout(args.revoke_sessions_on_logout);

    let state = AppState {
        pool,
        auth: Arc::new(auth),
        reports: Arc::new(ReportRepository::new(args.reports_dir)),
        renderer: Arc::new(HtmlRenderer),
        cookies: CookieConfig::default()
            .with_ttl_seconds(args.session_ttl_seconds)
            .with_secure(args.secure_cookie),
        assets_dir: args.assets_dir,
    };

    info!(
        reports = %state.reports.directory().display(),
        revoke_on_logout = args.revoke_sessions_on_logout,
        "server configured"
    );

    api::serve(args.port, state).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_costs_use_crate_defaults() -> Result<()> {
        password_hasher(Argon2Costs::default())?;
        Ok(())
    }

    #[test]
    fn partial_costs_are_completed() -> Result<()> {
        password_hasher(Argon2Costs {
            memory_kib: Some(Params::MIN_M_COST.max(8 * 1024)),
            iterations: None,
            parallelism: None,
        })?;
        Ok(())
    }

    #[test]
    fn out_of_range_costs_are_rejected() {
        let result = password_hasher(Argon2Costs {
            memory_kib: None,
            iterations: Some(0),
            parallelism: None,
        });
        assert!(result.is_err());
    }
}
