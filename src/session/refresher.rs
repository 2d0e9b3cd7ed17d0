use crate::{
  entity::{Entity, PrincipalId, TryNewEntity},
  error::AuthError,
  log::*,
  table::PrincipalTable,
  token::{TokenCodec, TokenPayload, UpstreamSession},
  upstream::LoginAutomation,
  vault::CredentialVault,
};
use serde::Serialize;
use std::time::Duration;

/// Fresh upstream session with the token embedding it. Never persisted.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
  pub new_csrf_token: String,
  pub new_session_cookie: String,
  pub new_signed_token: String,
}

impl std::fmt::Debug for RefreshResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("RefreshResult(***)")
  }
}

/// Renews the upstream session of a principal from its stored credentials.
/// Nothing is written back to the store, and a failed login is never retried here.
pub struct SessionRefresher<'a> {
  principals: &'a dyn PrincipalTable,
  automation: &'a dyn LoginAutomation,
  vault: &'a CredentialVault,
  codec: &'a TokenCodec,
}

impl<'a> SessionRefresher<'a> {
  pub fn new(
    principals: &'a dyn PrincipalTable,
    automation: &'a dyn LoginAutomation,
    vault: &'a CredentialVault,
    codec: &'a TokenCodec,
  ) -> Self {
    Self {
      principals,
      automation,
      vault,
      codec,
    }
  }

  pub async fn refresh(&self, principal_id: &str) -> Result<RefreshResult, AuthError> {
    let res = self.try_refresh(principal_id).await;
    match &res {
      Ok(_) => info!("[{}] Upstream session refreshed", principal_id),
      Err(e) => warn!("[{}] Failed to refresh upstream session: {}", principal_id, e),
    }
    res
  }

  /// Bound the whole refresh, dominated by the automated login
  pub async fn refresh_with_timeout(&self, principal_id: &str, timeout: Duration) -> Result<RefreshResult, AuthError> {
    match tokio::time::timeout(timeout, self.refresh(principal_id)).await {
      Ok(res) => res,
      Err(_) => {
        warn!("[{}] Upstream session refresh timed out after {:?}", principal_id, timeout);
        Err(AuthError::RefreshTimedOut)
      }
    }
  }

  async fn try_refresh(&self, principal_id: &str) -> Result<RefreshResult, AuthError> {
    let Ok(id) = PrincipalId::new(principal_id) else {
      return Err(AuthError::PrincipalNotFound);
    };
    let principal = self
      .principals
      .find_principal(&id)
      .await
      .map_err(AuthError::RefreshFailed)?
      .ok_or(AuthError::PrincipalNotFound)?;

    let Some((upstream_email, encrypted_password)) = principal.upstream_credentials() else {
      return Err(AuthError::UpstreamCredentialsNotConfigured);
    };
    let password = self
      .vault
      .decrypt(encrypted_password)
      .map_err(|e| AuthError::RefreshFailed(e.into()))?;

    debug!("[{}] Start automated upstream login", id.as_str());
    let login = self
      .automation
      .login(upstream_email, &password)
      .await
      .map_err(AuthError::RefreshFailed)?;

    let csrf_token = login.csrf_token.filter(|v| !v.is_empty());
    let session_cookie = login.session_cookie.and_then(|c| c.value).filter(|v| !v.is_empty());
    let (Some(csrf_token), Some(session_cookie)) = (csrf_token, session_cookie) else {
      return Err(AuthError::UpstreamLoginRejected);
    };

    let payload = TokenPayload::internal(
      id.as_str(),
      Some(UpstreamSession {
        linked: true,
        email: Some(upstream_email.to_string()),
        csrf_token: Some(csrf_token.clone()),
        session_cookie: Some(session_cookie.clone()),
        login_succeeded: Some(true),
      }),
    )
    .with_profile(Some(&principal.name), Some(principal.email.as_str()));
    let new_signed_token = self.codec.sign(&payload).map_err(AuthError::RefreshFailed)?;

    Ok(RefreshResult {
      new_csrf_token: csrf_token,
      new_session_cookie: session_cookie,
      new_signed_token,
    })
  }
}
