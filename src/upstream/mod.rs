mod api;
mod automation;

use thiserror::Error;

pub use api::{HttpUpstreamApi, UpstreamApi};
pub use automation::{HttpLoginAutomation, LoginAutomation, MobileLogin, SessionCookie, UpstreamLogin};

/// Material attached to an upstream call
#[derive(Clone, PartialEq, Eq)]
pub enum SessionMaterial {
  /// Browser session obtained by the login automation
  Web { csrf_token: String, session_cookie: String },
  /// Bearer token of the upstream mobile api
  Mobile { token: String },
}

// never print session material itself
impl std::fmt::Debug for SessionMaterial {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SessionMaterial::Web { .. } => f.write_str("SessionMaterial::Web(***)"),
      SessionMaterial::Mobile { .. } => f.write_str("SessionMaterial::Mobile(***)"),
    }
  }
}

/// Describes things that can go wrong in calling the upstream api
#[derive(Debug, Error)]
pub enum UpstreamError {
  #[error("Upstream session has expired (status {0})")]
  SessionExpired(u16),
  #[error("Upstream responded with status {code}")]
  Status { code: u16, body: serde_json::Value },
  #[error("Failed to reach upstream: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("Failed to build upstream url")]
  UrlError,
  #[error("No upstream session in token")]
  NoSession,
}

impl UpstreamError {
  pub fn is_session_expired(&self) -> bool {
    matches!(self, UpstreamError::SessionExpired(_))
  }
}
