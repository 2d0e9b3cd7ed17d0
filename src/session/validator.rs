use crate::{
  error::AuthError,
  log::*,
  token::{is_present as present, Principal, TokenPayload},
};

/// Decides whether a verified token may proceed, normalizing its upstream session on the way
pub trait SessionValidator: Send + Sync + 'static {
  fn validate(&self, payload: TokenPayload) -> Result<TokenPayload, AuthError>;
}

/// Gate of endpoints requiring a working upstream session.
/// An accepted web payload always carries non-empty top-level `csrfToken` and `sessionCookie`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictValidator;

/// Gate of endpoints that must work without a usable upstream session. Never rejects on upstream grounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveValidator;

/// Copy the nested upstream pair onto the top level
fn promote(mut payload: TokenPayload) -> TokenPayload {
  if let Some(session) = payload.upstream_session() {
    let (csrf_token, session_cookie) = (session.csrf_token.clone(), session.session_cookie.clone());
    payload.csrf_token = csrf_token;
    payload.session_cookie = session_cookie;
  }
  payload
}

impl SessionValidator for StrictValidator {
  fn validate(&self, payload: TokenPayload) -> Result<TokenPayload, AuthError> {
    // Legacy direct-session tokens may lack `kind`, so they are checked first.
    // Their embedded pair is trusted as long as the signature holds.
    if payload.has_direct_session() {
      debug!("[{}] Accept legacy direct-session token", payload.subject);
      return Ok(payload);
    }

    match &payload.principal {
      Some(Principal::Internal {
        upstream_session: Some(session),
      }) if session.linked => {
        if session.login_succeeded == Some(true) && present(&session.csrf_token) && present(&session.session_cookie) {
          Ok(promote(payload))
        } else if session.login_succeeded != Some(true) {
          Err(AuthError::UpstreamCredentialsInvalid)
        } else {
          Err(AuthError::MissingUpstreamCredentials)
        }
      }
      Some(Principal::Mobile {
        mobile_session: Some(session),
      }) => {
        if session.login_succeeded == Some(true) && present(&session.token) {
          Ok(payload)
        } else if session.login_succeeded != Some(true) {
          Err(AuthError::UpstreamCredentialsInvalid)
        } else {
          Err(AuthError::MissingUpstreamCredentials)
        }
      }
      Some(Principal::Internal { .. }) | Some(Principal::Mobile { .. }) | None => {
        Err(AuthError::MissingUpstreamCredentials)
      }
    }
  }
}

impl SessionValidator for PermissiveValidator {
  fn validate(&self, payload: TokenPayload) -> Result<TokenPayload, AuthError> {
    if payload.has_direct_session() {
      return Ok(payload);
    }
    match &payload.principal {
      // an explicit failed login is never promoted, an absent flag does not block
      Some(Principal::Internal {
        upstream_session: Some(session),
      }) if session.linked
        && present(&session.csrf_token)
        && present(&session.session_cookie)
        && session.login_succeeded != Some(false) =>
      {
        Ok(promote(payload))
      }
      Some(Principal::Internal { .. }) | Some(Principal::Mobile { .. }) | None => Ok(payload),
    }
  }
}
