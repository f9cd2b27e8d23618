use clap::{builder::ValueParser, Arg, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Accept either a count (`0..=5`) or a level name from `REPORTAL_LOG_LEVEL`.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("REPORTAL_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Result<u8, String> {
        let command = Command::new("t").arg(
            Arg::new("level")
                .long("level")
                .value_parser(validator_log_level()),
        );
        command
            .try_get_matches_from(["t", "--level", level])
            .map_err(|e| e.to_string())
            .and_then(|m| m.get_one::<u8>("level").copied().ok_or_else(String::new))
    }

    #[test]
    fn accepts_names_and_counts() {
        assert_eq!(parse("info"), Ok(2));
        assert_eq!(parse("TRACE"), Ok(4));
        assert_eq!(parse("3"), Ok(3));
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(parse("loud").is_err());
        assert!(parse("9").is_err());
    }
}
