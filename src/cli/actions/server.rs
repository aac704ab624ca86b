use crate::{
    cli::{commands::verify::Credentials, telemetry},
    roomgate::{self, AuthGate, OtpProvider, UnconfiguredProvider, VerifyClient},
    token::{SigningSecret, TokenIssuer, TokenVerifier},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{info, info_span, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub token_secret: SecretString,
    pub token_ttl: Duration,
    pub verify_url: Url,
    pub verify_credentials: Option<Credentials>,
}

/// Wired components of a running server.
pub struct Components {
    pub issuer: Arc<TokenIssuer>,
    pub gate: AuthGate,
    pub otp: Arc<dyn OtpProvider>,
}

/// Build the issuer, gate and passcode provider from parsed arguments.
///
/// # Errors
/// Returns an error if the secret is empty or the provider client cannot be built.
pub fn build(args: &Args) -> Result<Components> {
    let secret = SigningSecret::from_secret_string(&args.token_secret)
        .context("token secret must not be empty")?;

    let issuer = TokenIssuer::new(secret.clone(), args.token_ttl)
        .with_span(info_span!("token.issuer"));
    let verifier = TokenVerifier::new(secret).with_span(info_span!("token.verifier"));
    let gate = AuthGate::new(Arc::new(verifier)).with_span(info_span!("auth.gate"));

    let otp: Arc<dyn OtpProvider> = match &args.verify_credentials {
        Some(credentials) => Arc::new(
            VerifyClient::new(
                args.verify_url.clone(),
                credentials.service_sid.clone(),
                credentials.api_key.clone(),
                credentials.api_secret.clone(),
            )
            .context("Failed to build verification provider client")?,
        ),
        None => {
            warn!("Verification provider not configured, passcode login is disabled");
            Arc::new(UnconfiguredProvider)
        }
    };

    Ok(Components {
        issuer: Arc::new(issuer),
        gate,
        otp,
    })
}

/// Execute the server action.
/// # Errors
/// Returns an error if the components cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let components = build(&args)?;

    info!(
        port = args.port,
        token_ttl_seconds = components.issuer.lifetime().as_secs(),
        "Starting roomgate"
    );

    let result = roomgate::new(
        args.port,
        components.issuer,
        components.gate,
        components.otp,
    )
    .await;

    telemetry::shutdown_tracer();

    result
}
