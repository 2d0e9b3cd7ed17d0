//! Hand-written doubles of the external ports for unit and router tests
use crate::{
  entity::*,
  error::*,
  table::PrincipalTable,
  upstream::{LoginAutomation, MobileLogin, SessionCookie, SessionMaterial, UpstreamApi, UpstreamError, UpstreamLogin},
  vault::CredentialVault,
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  },
  time::Duration,
};

pub(crate) fn unlinked_principal(email: &str) -> PrincipalRecord {
  PrincipalRecord::new(
    "Field Operator",
    &Email::new(email).unwrap(),
    &Password::new("password").unwrap(),
    None,
  )
  .unwrap()
}

pub(crate) fn linked_principal(
  email: &str,
  upstream_email: &str,
  upstream_password: &str,
  vault: &CredentialVault,
) -> PrincipalRecord {
  let mut principal = unlinked_principal(email);
  principal.upstream_email = Some(upstream_email.to_string());
  principal.upstream_password_encrypted = Some(vault.encrypt(upstream_password).unwrap());
  principal
}

#[derive(Default)]
pub(crate) struct MockPrincipalTable {
  inner: Mutex<HashMap<String, PrincipalRecord>>,
}

impl MockPrincipalTable {
  pub(crate) fn with(principals: Vec<PrincipalRecord>) -> Self {
    let inner = principals
      .into_iter()
      .map(|p| (p.id.as_str().to_string(), p))
      .collect::<HashMap<_, _>>();
    Self {
      inner: Mutex::new(inner),
    }
  }
}

#[async_trait]
impl PrincipalTable for MockPrincipalTable {
  async fn add(&self, principal: &PrincipalRecord) -> Result<()> {
    let mut lock = self.inner.lock().unwrap();
    ensure!(
      !lock.values().any(|p| p.email == principal.email),
      "UNIQUE constraint failed: principals.email"
    );
    lock.insert(principal.id.as_str().to_string(), principal.clone());
    Ok(())
  }
  async fn find_principal(&self, id: &PrincipalId) -> Result<Option<PrincipalRecord>> {
    Ok(self.inner.lock().unwrap().get(id.as_str()).cloned())
  }
  async fn find_by_email(&self, email: &Email) -> Result<Option<PrincipalRecord>> {
    let lock = self.inner.lock().unwrap();
    Ok(lock.values().find(|p| &p.email == email).cloned())
  }
  async fn update_upstream_credentials<'a>(
    &self,
    id: &PrincipalId,
    upstream_email: Option<&'a str>,
    upstream_password_encrypted: Option<&'a str>,
  ) -> Result<()> {
    let mut lock = self.inner.lock().unwrap();
    let Some(principal) = lock.get_mut(id.as_str()) else {
      bail!("No principal updated");
    };
    principal.upstream_email = upstream_email.map(|s| s.to_string());
    principal.upstream_password_encrypted = upstream_password_encrypted.map(|s| s.to_string());
    Ok(())
  }
}

/// Login automation answering a fixed result, or failing when none is given
#[derive(Default)]
pub(crate) struct MockAutomation {
  login: Option<UpstreamLogin>,
  mobile: Option<MobileLogin>,
  delay: Option<Duration>,
  calls: AtomicUsize,
  seen: Mutex<Vec<(String, String)>>,
}

impl MockAutomation {
  pub(crate) fn succeeding(csrf_token: &str, session_cookie: &str) -> Self {
    Self::returning(UpstreamLogin {
      csrf_token: Some(csrf_token.to_string()),
      session_cookie: Some(SessionCookie {
        value: Some(session_cookie.to_string()),
      }),
    })
  }
  pub(crate) fn returning(login: UpstreamLogin) -> Self {
    Self {
      login: Some(login),
      ..Default::default()
    }
  }
  pub(crate) fn failing() -> Self {
    Self::default()
  }
  pub(crate) fn with_mobile(mut self, mobile: MobileLogin) -> Self {
    self.mobile = Some(mobile);
    self
  }
  pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }
  pub(crate) fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
  pub(crate) fn last_credentials(&self) -> Option<(String, String)> {
    self.seen.lock().unwrap().last().cloned()
  }

  async fn record(&self, email: &str, password: &str) {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self
      .seen
      .lock()
      .unwrap()
      .push((email.to_string(), password.to_string()));
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
  }
}

#[async_trait]
impl LoginAutomation for MockAutomation {
  async fn login(&self, email: &str, password: &str) -> Result<UpstreamLogin> {
    self.record(email, password).await;
    self.login.clone().ok_or_else(|| anyhow!("automation failed"))
  }
  async fn mobile_login(&self, email: &str, password: &str) -> Result<MobileLogin> {
    self.record(email, password).await;
    self.mobile.clone().ok_or_else(|| anyhow!("automation failed"))
  }
}

/// Upstream api echoing requests. Web sessions whose csrf token is listed as expired get a 401.
#[derive(Default)]
pub(crate) struct MockUpstreamApi {
  expired_csrf_tokens: Vec<String>,
  failing_status: Option<u16>,
  calls: Mutex<Vec<(Method, String, SessionMaterial)>>,
}

impl MockUpstreamApi {
  pub(crate) fn expiring(csrf_tokens: &[&str]) -> Self {
    Self {
      expired_csrf_tokens: csrf_tokens.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }
  pub(crate) fn failing_with(code: u16) -> Self {
    Self {
      failing_status: Some(code),
      ..Default::default()
    }
  }
  pub(crate) fn calls(&self) -> Vec<(Method, String, SessionMaterial)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl UpstreamApi for MockUpstreamApi {
  async fn request(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
    session: &SessionMaterial,
  ) -> std::result::Result<Value, UpstreamError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((method.clone(), path.to_string(), session.clone()));
    if let Some(code) = self.failing_status {
      return Err(UpstreamError::Status {
        code,
        body: json!({ "error": "upstream failure" }),
      });
    }
    let session = match session {
      SessionMaterial::Web { csrf_token, .. } if self.expired_csrf_tokens.contains(csrf_token) => {
        return Err(UpstreamError::SessionExpired(401));
      }
      SessionMaterial::Web { csrf_token, .. } => format!("web:{}", csrf_token),
      SessionMaterial::Mobile { token } => format!("mobile:{}", token),
    };
    Ok(json!({
      "method": method.as_str(),
      "path": path,
      "body": body.cloned(),
      "session": session,
    }))
  }
}
