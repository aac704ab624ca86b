use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_VERIFY_URL: &str = "verify-url";
pub const ARG_VERIFY_SERVICE_SID: &str = "verify-service-sid";
pub const ARG_VERIFY_API_KEY: &str = "verify-api-key";
pub const ARG_VERIFY_API_SECRET: &str = "verify-api-secret";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub service_sid: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub url: Url,
    /// `None` when no provider is configured; passcode login then fails closed.
    pub credentials: Option<Credentials>,
}

impl Options {
    /// Parse verification provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or only some credentials are set.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = matches
            .get_one::<String>(ARG_VERIFY_URL)
            .context("missing required argument: --verify-url")?;
        let url = Url::parse(url).with_context(|| format!("invalid --{ARG_VERIFY_URL}: {url}"))?;

        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let service_sid = get_non_empty(ARG_VERIFY_SERVICE_SID);
        let api_key = get_non_empty(ARG_VERIFY_API_KEY);
        let api_secret = get_non_empty(ARG_VERIFY_API_SECRET);

        let credentials = match (service_sid, api_key, api_secret) {
            (None, None, None) => None,
            (Some(service_sid), Some(api_key), Some(api_secret)) => Some(Credentials {
                service_sid,
                api_key,
                api_secret: SecretString::from(api_secret),
            }),
            (service_sid, api_key, api_secret) => {
                let missing: Vec<String> = [
                    (ARG_VERIFY_SERVICE_SID, service_sid.is_none()),
                    (ARG_VERIFY_API_KEY, api_key.is_none()),
                    (ARG_VERIFY_API_SECRET, api_secret.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(arg, _)| format!("--{arg}"))
                .collect();
                anyhow::bail!(
                    "incomplete verification provider credentials, missing: {}",
                    missing.join(", ")
                );
            }
        };

        Ok(Self { url, credentials })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERIFY_URL)
                .long(ARG_VERIFY_URL)
                .help("Base URL of the passcode verification provider")
                .default_value("https://verify.twilio.com")
                .env("ROOMGATE_VERIFY_URL"),
        )
        .arg(
            Arg::new(ARG_VERIFY_SERVICE_SID)
                .long(ARG_VERIFY_SERVICE_SID)
                .help("Verification service SID")
                .env("ROOMGATE_VERIFY_SERVICE_SID"),
        )
        .arg(
            Arg::new(ARG_VERIFY_API_KEY)
                .long(ARG_VERIFY_API_KEY)
                .help("API key used to authenticate with the provider")
                .env("ROOMGATE_VERIFY_API_KEY"),
        )
        .arg(
            Arg::new(ARG_VERIFY_API_SECRET)
                .long(ARG_VERIFY_API_SECRET)
                .help("API secret used to authenticate with the provider")
                .env("ROOMGATE_VERIFY_API_SECRET")
                .hide_env_values(true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn cleared<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("ROOMGATE_VERIFY_URL", None::<&str>),
                ("ROOMGATE_VERIFY_SERVICE_SID", None::<&str>),
                ("ROOMGATE_VERIFY_API_KEY", None::<&str>),
                ("ROOMGATE_VERIFY_API_SECRET", None::<&str>),
            ],
            f,
        );
    }

    fn parse(args: &[&str]) -> anyhow::Result<Options> {
        let mut argv = vec!["roomgate"];
        argv.extend_from_slice(args);
        let matches = with_args(Command::new("roomgate")).try_get_matches_from(argv)?;
        Options::parse(&matches)
    }

    #[test]
    fn no_credentials_is_unconfigured() {
        cleared(|| {
            let options = parse(&[]);
            assert!(options.is_ok());
            if let Ok(options) = options {
                assert_eq!(options.url.as_str(), "https://verify.twilio.com/");
                assert!(options.credentials.is_none());
            }
        });
    }

    #[test]
    fn full_credentials() {
        cleared(|| {
            let options = parse(&[
                "--verify-service-sid",
                "VA123",
                "--verify-api-key",
                "SKkey",
                "--verify-api-secret",
                "shh",
            ]);
            assert!(options.is_ok());
            let credentials = options.ok().and_then(|o| o.credentials);
            assert!(credentials.is_some());
            if let Some(credentials) = credentials {
                assert_eq!(credentials.service_sid, "VA123");
                assert_eq!(credentials.api_key, "SKkey");
                assert_eq!(credentials.api_secret.expose_secret(), "shh");
            }
        });
    }

    #[test]
    fn partial_credentials_rejected() {
        cleared(|| {
            let result = parse(&["--verify-service-sid", "VA123"]);
            assert!(result.is_err());
            if let Err(err) = result {
                let message = err.to_string();
                assert!(message.contains("--verify-api-key"));
                assert!(message.contains("--verify-api-secret"));
                assert!(!message.contains("--verify-service-sid"));
            }
        });
    }

    #[test]
    fn empty_env_values_count_as_unset() {
        temp_env::with_vars(
            [
                ("ROOMGATE_VERIFY_URL", None::<&str>),
                ("ROOMGATE_VERIFY_SERVICE_SID", Some("")),
                ("ROOMGATE_VERIFY_API_KEY", Some(" ")),
                ("ROOMGATE_VERIFY_API_SECRET", None::<&str>),
            ],
            || {
                let options = parse(&[]);
                assert!(options.is_ok_and(|o| o.credentials.is_none()));
            },
        );
    }

    #[test]
    fn invalid_url_rejected() {
        cleared(|| {
            assert!(parse(&["--verify-url", "not a url"]).is_err());
        });
    }
}
