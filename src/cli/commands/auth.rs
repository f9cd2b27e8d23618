use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SECURE_COOKIE: &str = "secure-cookie";
pub const ARG_REVOKE_SESSIONS_ON_LOGOUT: &str = "revoke-sessions-on-logout";
pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";

/// Argon2 costs; `None` falls back to the argon2 crate defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Argon2Costs {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub session_ttl_seconds: i64,
    pub secure_cookie: bool,
    pub revoke_sessions_on_logout: bool,
    pub argon2: Argon2Costs,
}

impl Options {
    /// Parse session and hashing arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(604_800);
        if session_ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_SESSION_TTL_SECONDS} must be positive");
        }

        Ok(Self {
            session_ttl_seconds,
            secure_cookie: matches.get_flag(ARG_SECURE_COOKIE),
            revoke_sessions_on_logout: matches.get_flag(ARG_REVOKE_SESSIONS_ON_LOGOUT),
            argon2: Argon2Costs {
                memory_kib: matches.get_one::<u32>(ARG_ARGON2_MEMORY_KIB).copied(),
                iterations: matches.get_one::<u32>(ARG_ARGON2_ITERATIONS).copied(),
                parallelism: matches.get_one::<u32>(ARG_ARGON2_PARALLELISM).copied(),
            },
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_argon2_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("REPORTAL_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIE)
                .long(ARG_SECURE_COOKIE)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("REPORTAL_SECURE_COOKIE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_REVOKE_SESSIONS_ON_LOGOUT)
                .long(ARG_REVOKE_SESSIONS_ON_LOGOUT)
                .help("Delete the server-side session on logout instead of only clearing the cookie")
                .env("REPORTAL_REVOKE_SESSIONS_ON_LOGOUT")
                .action(ArgAction::SetTrue),
        )
}

fn with_argon2_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2 memory cost in KiB")
                .env("REPORTAL_ARGON2_MEMORY_KIB")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2 iteration count")
                .env("REPORTAL_ARGON2_ITERATIONS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2 degree of parallelism")
                .env("REPORTAL_ARGON2_PARALLELISM")
                .value_parser(clap::value_parser!(u32)),
        )
}
