//! Map parsed CLI arguments to the [`Action`] to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    auth, ARG_ASSETS_DIR, ARG_DSN, ARG_LOGIN, ARG_PORT, ARG_REPORTS_DIR, CMD_GRANT_ADMIN,
    CMD_MIGRATE,
};
use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::PathBuf;

fn required_string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("missing required argument: --{id}"))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_MIGRATE, sub)) => Ok(Action::Migrate {
            dsn: required_string(sub, ARG_DSN)?,
        }),
        Some((CMD_GRANT_ADMIN, sub)) => Ok(Action::GrantAdmin {
            dsn: required_string(sub, ARG_DSN)?,
            login: required_string(sub, ARG_LOGIN)?,
        }),
        _ => {
            let auth_opts = auth::Options::parse(matches)?;

            Ok(Action::Server(Args {
                port: matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(1323),
                dsn: required_string(matches, ARG_DSN)?,
                reports_dir: PathBuf::from(required_string(matches, ARG_REPORTS_DIR)?),
                assets_dir: PathBuf::from(required_string(matches, ARG_ASSETS_DIR)?),
                session_ttl_seconds: auth_opts.session_ttl_seconds,
                secure_cookie: auth_opts.secure_cookie,
                revoke_sessions_on_logout: auth_opts.revoke_sessions_on_logout,
                argon2: auth_opts.argon2,
            }))
        }
    }
}
