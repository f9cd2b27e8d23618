pub mod auth;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_REPORTS_DIR: &str = "reports-dir";
pub const ARG_ASSETS_DIR: &str = "assets-dir";
pub const ARG_LOGIN: &str = "login";

pub const CMD_MIGRATE: &str = "migrate";
pub const CMD_GRANT_ADMIN: &str = "grant-admin";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("reportal")
        .about("Report catalogue with session authentication")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("1323")
                .env("REPORTAL_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("SQLite connection string")
                .env("REPORTAL_DSN")
                .default_value("sqlite://db/reportal.db")
                .global(true),
        )
        .arg(
            Arg::new(ARG_REPORTS_DIR)
                .long(ARG_REPORTS_DIR)
                .help("Directory holding report files")
                .env("REPORTAL_REPORTS_DIR")
                .default_value("./reports"),
        )
        .arg(
            Arg::new(ARG_ASSETS_DIR)
                .long(ARG_ASSETS_DIR)
                .help("Directory served under /assets")
                .env("REPORTAL_ASSETS_DIR")
                .default_value("frontend/assets"),
        )
        .subcommand(Command::new(CMD_MIGRATE).about("Apply the database schema and exit"))
        .subcommand(
            Command::new(CMD_GRANT_ADMIN)
                .about("Give an existing user the admin flag")
                .arg(
                    Arg::new(ARG_LOGIN)
                        .long(ARG_LOGIN)
                        .help("Login of the user to promote")
                        .required(true),
                ),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}
