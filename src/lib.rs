//! # Reportal
//!
//! A small report catalogue: signed-in users browse a directory of report
//! files, administrators upload and delete them.
//!
//! ## Sessions
//!
//! Users sign up with a login and password. Passwords are stored as salted
//! Argon2id hashes and never leave the service. Logging in issues an opaque,
//! random session token that is persisted server side and handed to the
//! browser in an `HttpOnly` cookie. Every request resolves that cookie back to
//! a user before any handler runs; an unknown token simply means anonymous.
//!
//! ## Authorization
//!
//! Viewing a report requires a session. Uploading or deleting one requires the
//! `is_admin` flag, which is only set through the `grant-admin` command.

pub mod api;
pub mod auth;
pub mod cli;
pub mod reports;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
