pub use anyhow::{anyhow, bail, ensure, Context, Error, Result};
use thiserror::Error;

/// Describes things that can go wrong while authorizing a request or renewing its upstream session
#[derive(Debug, Error)]
pub enum AuthError {
  // token codec
  #[error("Missing token")]
  MissingToken,
  #[error("Token has expired")]
  TokenExpired,
  #[error("Malformed token")]
  TokenMalformed,

  // session validators
  #[error("Upstream credentials are invalid. Re-link or refresh the upstream session")]
  UpstreamCredentialsInvalid,
  #[error("No upstream session in token")]
  MissingUpstreamCredentials,

  // session refresher
  #[error("Principal not found")]
  PrincipalNotFound,
  #[error("Upstream credentials are not configured for this principal")]
  UpstreamCredentialsNotConfigured,
  #[error("Upstream login was rejected")]
  UpstreamLoginRejected,
  #[error("Session refresh failed: {0}")]
  RefreshFailed(#[source] anyhow::Error),
  #[error("Session refresh timed out")]
  RefreshTimedOut,
}

impl AuthError {
  /// Stable machine readable code returned to clients
  pub fn code(&self) -> &'static str {
    match self {
      AuthError::MissingToken => "missing_token",
      AuthError::TokenExpired => "token_expired",
      AuthError::TokenMalformed => "token_malformed",
      AuthError::UpstreamCredentialsInvalid => "upstream_credentials_invalid",
      AuthError::MissingUpstreamCredentials => "missing_upstream_credentials",
      AuthError::PrincipalNotFound => "principal_not_found",
      AuthError::UpstreamCredentialsNotConfigured => "upstream_credentials_not_configured",
      AuthError::UpstreamLoginRejected => "upstream_login_rejected",
      AuthError::RefreshFailed(_) => "refresh_failed",
      AuthError::RefreshTimedOut => "refresh_timed_out",
    }
  }
}

/// Failures of the credential vault. Messages never carry plaintext.
#[derive(Debug, Error)]
pub enum VaultError {
  #[error("Malformed credential blob")]
  MalformedCredentialBlob,
  #[error("Failed to decrypt credential blob {fingerprint}")]
  DecryptionFailed { fingerprint: String },
  #[error("Failed to encrypt credential")]
  EncryptionFailed,
}
