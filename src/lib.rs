//! # Roomgate
//!
//! `roomgate` issues signed identity tokens and enforces them at the HTTP edge
//! of a video-room service.
//!
//! ## Tokens
//!
//! Tokens are compact HS256 JWTs carrying only `sub`, `iat` and `exp`. They are
//! stateless: any process holding the shared secret can verify them and no
//! revocation list exists. See [`token`].
//!
//! ## Auth Gate
//!
//! Protected routes sit behind [`roomgate::AuthGate`], which reads
//! `Authorization: Bearer <token>`, verifies it and hands the subject to the
//! handler as a [`roomgate::VerifiedIdentity`]. Rejections are `401` with a
//! JSON body and never reach the handler.
//!
//! ## Passcode Login
//!
//! `POST /api/auth/send-otp` and `POST /api/auth/verify-otp` prove control of an
//! email address or phone number through an external verification provider and
//! mint a token for it.

pub mod cli;
pub mod roomgate;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
