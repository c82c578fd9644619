//! Credentials for talking to the conversation service.
//!
//! [`AdminTokenSource`] produces the bearer token used for server-side REST
//! calls, either a configured static token or an RS256 JWT minted from the
//! application's private key. [`DeviceAuthClient`] exchanges device login
//! codes and refresh tokens for client SDK tokens.

mod device;
mod token;

pub use device::{CredentialExchange, DeviceAuthClient, TokenResponse};
pub use token::{AccessControlList, AdminClaims, AdminTokenSource, TokenMinter, DEFAULT_ACL_PATHS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("unable to read private key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("token ttl of {0} seconds is out of range")]
    InvalidTtl(u64),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid login code")]
    InvalidCode,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("auth api returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
