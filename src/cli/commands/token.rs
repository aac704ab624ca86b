use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";

const DEFAULT_TTL_SECONDS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Options {
    pub secret: SecretString,
    pub ttl: Duration,
}

impl Options {
    /// Parse token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the secret is missing or empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = match matches.get_one::<String>(ARG_TOKEN_SECRET) {
            Some(value) if !value.is_empty() => SecretString::from(value.as_str()),
            _ => anyhow::bail!("missing required argument: --{ARG_TOKEN_SECRET}"),
        };

        let ttl = matches
            .get_one::<u64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_TTL_SECONDS);

        Ok(Self {
            secret,
            ttl: Duration::from_secs(ttl),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Shared secret used to sign and verify identity tokens")
                .long_help(
                    "Shared secret used to sign and verify identity tokens (HMAC-SHA256).\n\nEvery instance that verifies tokens must use the same value. Rotating it invalidates all outstanding tokens.",
                )
                .env("ROOMGATE_TOKEN_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Lifetime of issued tokens in seconds")
                .default_value("3600")
                .env("ROOMGATE_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
