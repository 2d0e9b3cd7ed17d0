use super::{RefreshSlot, SessionRefresher};
use crate::{
  log::*,
  token::TokenPayload,
  upstream::{SessionMaterial, UpstreamError},
};
use std::{future::Future, time::Duration};

/// Run an upstream call with the session embedded in the token.
/// When the upstream reports an expired session, refresh it once, publish the new token to the
/// request's slot and replay the call with the fresh session.
/// If the refresh fails, the original upstream error is returned.
pub async fn with_session_refresh<F, Fut, T>(
  refresher: &SessionRefresher<'_>,
  timeout: Duration,
  payload: &TokenPayload,
  slot: &RefreshSlot,
  op: F,
) -> Result<T, UpstreamError>
where
  F: Fn(SessionMaterial) -> Fut,
  Fut: Future<Output = Result<T, UpstreamError>>,
{
  let Some(session) = payload.session_material() else {
    return Err(UpstreamError::NoSession);
  };

  let err = match op(session).await {
    Ok(res) => return Ok(res),
    Err(e) => e,
  };
  // mobile principals have no stored credentials to log in with
  if !err.is_session_expired() || payload.is_mobile() {
    return Err(err);
  }

  info!("[{}] Upstream session expired. Try to refresh", payload.subject);
  match refresher.refresh_with_timeout(&payload.subject, timeout).await {
    Ok(result) => {
      slot.set(result.new_signed_token);
      op(SessionMaterial::Web {
        csrf_token: result.new_csrf_token,
        session_cookie: result.new_session_cookie,
      })
      .await
    }
    Err(e) => {
      warn!("[{}] Refresh did not recover upstream session: {}", payload.subject, e);
      Err(err)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::Entity,
    mock::{linked_principal, MockAutomation, MockPrincipalTable, MockUpstreamApi},
    session::{StrictValidator, SessionValidator},
    token::{MobileSession, TokenCodec, UpstreamSession},
    upstream::UpstreamApi,
    vault::CredentialVault,
  };
  use reqwest::Method;

  const TIMEOUT: Duration = Duration::from_secs(5);

  struct Fixture {
    vault: CredentialVault,
    codec: TokenCodec,
    table: MockPrincipalTable,
    payload: TokenPayload,
  }

  fn fixture(csrf_token: &str) -> Fixture {
    let vault = CredentialVault::new("credential-secret");
    let codec = TokenCodec::new("signing-secret", chrono::Duration::minutes(60));
    let principal = linked_principal("p2@example.com", "op@upstream.example.com", "upstream-password", &vault);
    let payload = StrictValidator
      .validate(TokenPayload::internal(
        principal.id.as_str(),
        Some(UpstreamSession {
          linked: true,
          email: Some("op@upstream.example.com".to_string()),
          csrf_token: Some(csrf_token.to_string()),
          session_cookie: Some("old-cookie".to_string()),
          login_succeeded: Some(true),
        }),
      ))
      .unwrap();
    Fixture {
      vault,
      codec,
      table: MockPrincipalTable::with(vec![principal]),
      payload,
    }
  }

  #[tokio::test]
  async fn live_session_is_used_without_refresh() {
    let f = fixture("live");
    let automation = MockAutomation::succeeding("abc", "xyz");
    let api = MockUpstreamApi::expiring(&["stale"]);
    let refresher = SessionRefresher::new(&f.table, &automation, &f.vault, &f.codec);
    let slot = RefreshSlot::default();

    let res = with_session_refresh(&refresher, TIMEOUT, &f.payload, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await
    .unwrap();
    assert_eq!(res["session"], "web:live");
    assert_eq!(automation.calls(), 0);
    assert!(!slot.is_set());
  }

  #[tokio::test]
  async fn expired_session_is_refreshed_and_replayed_once() {
    let f = fixture("stale");
    let automation = MockAutomation::succeeding("abc", "xyz");
    let api = MockUpstreamApi::expiring(&["stale"]);
    let refresher = SessionRefresher::new(&f.table, &automation, &f.vault, &f.codec);
    let slot = RefreshSlot::default();

    let res = with_session_refresh(&refresher, TIMEOUT, &f.payload, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await
    .unwrap();
    assert_eq!(res["session"], "web:abc");
    assert_eq!(automation.calls(), 1);
    assert_eq!(api.calls().len(), 2);

    let renewed = f.codec.verify(&slot.get().unwrap()).unwrap();
    assert_eq!(renewed.subject, f.payload.subject);
    assert_eq!(
      renewed.upstream_session().unwrap().csrf_token.as_deref(),
      Some("abc")
    );
  }

  #[tokio::test]
  async fn failed_refresh_surfaces_original_error() {
    let f = fixture("stale");
    let automation = MockAutomation::failing();
    let api = MockUpstreamApi::expiring(&["stale"]);
    let refresher = SessionRefresher::new(&f.table, &automation, &f.vault, &f.codec);
    let slot = RefreshSlot::default();

    let res = with_session_refresh(&refresher, TIMEOUT, &f.payload, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await;
    assert!(matches!(res, Err(UpstreamError::SessionExpired(401))));
    assert_eq!(automation.calls(), 1);
    assert_eq!(api.calls().len(), 1);
    assert!(!slot.is_set());
  }

  #[tokio::test]
  async fn other_upstream_errors_are_not_refreshed() {
    let f = fixture("live");
    let automation = MockAutomation::succeeding("abc", "xyz");
    let api = MockUpstreamApi::failing_with(500);
    let refresher = SessionRefresher::new(&f.table, &automation, &f.vault, &f.codec);
    let slot = RefreshSlot::default();

    let res = with_session_refresh(&refresher, TIMEOUT, &f.payload, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await;
    assert!(matches!(res, Err(UpstreamError::Status { code: 500, .. })));
    assert_eq!(automation.calls(), 0);
  }

  #[tokio::test]
  async fn mobile_and_sessionless_tokens() {
    let f = fixture("live");
    let automation = MockAutomation::succeeding("abc", "xyz");
    let api = MockUpstreamApi::default();
    let refresher = SessionRefresher::new(&f.table, &automation, &f.vault, &f.codec);
    let slot = RefreshSlot::default();

    let mobile = TokenPayload::mobile(
      "op@upstream.example.com",
      MobileSession {
        token: Some("mobile-token".to_string()),
        login_succeeded: Some(true),
        ..Default::default()
      },
    );
    let res = with_session_refresh(&refresher, TIMEOUT, &mobile, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await
    .unwrap();
    assert_eq!(res["session"], "mobile:mobile-token");

    let sessionless = TokenPayload::internal("p1", None);
    let res = with_session_refresh(&refresher, TIMEOUT, &sessionless, &slot, |session| {
      let api = &api;
      async move { api.request(Method::GET, "api/v1/orders", None, &session).await }
    })
    .await;
    assert!(matches!(res, Err(UpstreamError::NoSession)));
    assert_eq!(automation.calls(), 0);
  }
}
