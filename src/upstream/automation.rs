use crate::{constants::*, error::*, log::*};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Result of an automated browser login against the upstream
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamLogin {
  #[serde(default)]
  pub csrf_token: Option<String>,
  #[serde(default)]
  pub session_cookie: Option<SessionCookie>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionCookie {
  #[serde(default)]
  pub value: Option<String>,
}

/// Result of a login against the upstream mobile api
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileLogin {
  #[serde(default)]
  pub token: Option<String>,
  #[serde(default)]
  pub principal_info: Option<Value>,
  #[serde(default)]
  pub tenant_info: Option<Value>,
}

/// Port to the external login automation. Calls may be slow and fail for reasons outside this gateway.
#[async_trait]
pub trait LoginAutomation: Send + Sync {
  async fn login(&self, email: &str, password: &str) -> Result<UpstreamLogin>;
  async fn mobile_login(&self, email: &str, password: &str) -> Result<MobileLogin>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
  email: &'a str,
  password: &'a str,
}

/// Login automation service reached over http
pub struct HttpLoginAutomation {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpLoginAutomation {
  pub fn new(base_url: &Url) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(UPSTREAM_HTTP_TIMEOUT_SECS * 4))
      .build()?;
    Ok(Self {
      client,
      base_url: base_url.to_owned(),
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    let mut endpoint = self.base_url.clone();
    endpoint
      .path_segments_mut()
      .map_err(|_| anyhow!("Automation url cannot be a base"))?
      .pop_if_empty()
      .extend(path.split('/'));
    Ok(endpoint)
  }

  async fn post_login<R>(&self, path: &str, email: &str, password: &str) -> Result<R>
  where
    R: serde::de::DeserializeOwned,
  {
    let endpoint = self.endpoint(path)?;
    debug!("Call login automation at {}", endpoint);
    let res = self
      .client
      .post(endpoint)
      .json(&LoginRequest { email, password })
      .send()
      .await?;
    if !res.status().is_success() {
      bail!("Login automation responded with status {}", res.status().as_u16());
    }
    let json_res = res.json::<R>().await?;
    Ok(json_res)
  }
}

#[async_trait]
impl LoginAutomation for HttpLoginAutomation {
  async fn login(&self, email: &str, password: &str) -> Result<UpstreamLogin> {
    self.post_login(AUTOMATION_LOGIN_PATH, email, password).await
  }

  async fn mobile_login(&self, email: &str, password: &str) -> Result<MobileLogin> {
    self.post_login(AUTOMATION_MOBILE_LOGIN_PATH, email, password).await
  }
}
