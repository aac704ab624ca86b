//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{token, verify, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let token_opts = token::Options::parse(matches)?;
    let verify_opts = verify::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        token_secret: token_opts.secret,
        token_ttl: token_opts.ttl,
        verify_url: verify_opts.url,
        verify_credentials: verify_opts.credentials,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const VARS: [&str; 7] = [
        "ROOMGATE_PORT",
        "ROOMGATE_TOKEN_SECRET",
        "ROOMGATE_TOKEN_TTL_SECONDS",
        "ROOMGATE_VERIFY_URL",
        "ROOMGATE_VERIFY_SERVICE_SID",
        "ROOMGATE_VERIFY_API_KEY",
        "ROOMGATE_VERIFY_API_SECRET",
    ];

    fn cleared<F: FnOnce()>(f: F) {
        temp_env::with_vars(VARS.map(|name| (name, None::<&str>)), f);
    }

    #[test]
    fn token_secret_required() {
        cleared(|| {
            let matches = crate::cli::commands::new().get_matches_from(vec!["roomgate"]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("missing required argument: --token-secret"));
            }
        });
    }

    #[test]
    fn builds_server_action() {
        cleared(|| {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "roomgate",
                "--port",
                "9000",
                "--token-secret",
                "s3cr3t",
                "--token-ttl-seconds",
                "60",
            ]);
            let action = handler(&matches);
            assert!(action.is_ok());
            if let Ok(Action::Server(args)) = action {
                assert_eq!(args.port, 9000);
                assert_eq!(args.token_ttl, Duration::from_secs(60));
                assert!(args.verify_credentials.is_none());
            }
        });
    }

    #[test]
    fn partial_provider_credentials_rejected() {
        cleared(|| {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "roomgate",
                "--token-secret",
                "s3cr3t",
                "--verify-api-key",
                "SKkey",
            ]);
            assert!(handler(&matches).is_err());
        });
    }
}
