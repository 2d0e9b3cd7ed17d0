use super::{SessionMaterial, UpstreamError};
use crate::{constants::*, error::*};
use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Port to the upstream field-service api
#[async_trait]
pub trait UpstreamApi: Send + Sync {
  /// Call `path` (relative to the upstream base, may carry a query) with the given session
  async fn request(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
    session: &SessionMaterial,
  ) -> Result<Value, UpstreamError>;
}

pub struct HttpUpstreamApi {
  client: reqwest::Client,
  base_url: Url,
  cookie_name: String,
}

impl HttpUpstreamApi {
  pub fn new(base_url: &Url, cookie_name: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(UPSTREAM_HTTP_TIMEOUT_SECS))
      .build()?;
    // a base without trailing slash would lose its last segment on join
    let mut base_url = base_url.to_owned();
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }
    Ok(Self {
      client,
      base_url,
      cookie_name: cookie_name.to_string(),
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|_| UpstreamError::UrlError)
  }
}

/// Statuses by which the upstream tells its session is gone
fn is_session_expired_status(status: StatusCode) -> bool {
  matches!(status.as_u16(), 401 | 403 | 419)
}

#[async_trait]
impl UpstreamApi for HttpUpstreamApi {
  async fn request(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
    session: &SessionMaterial,
  ) -> Result<Value, UpstreamError> {
    let endpoint = self.endpoint(path)?;
    let mut req = self.client.request(method, endpoint);
    req = match session {
      SessionMaterial::Web {
        csrf_token,
        session_cookie,
      } => req
        .header(header::COOKIE, format!("{}={}", self.cookie_name, session_cookie))
        .header(CSRF_TOKEN_HEADER, csrf_token),
      SessionMaterial::Mobile { token } => req.bearer_auth(token),
    };
    if let Some(body) = body {
      req = req.json(body);
    }

    let res = req.send().await?;
    let status = res.status();
    if is_session_expired_status(status) {
      return Err(UpstreamError::SessionExpired(status.as_u16()));
    }
    let text = res.text().await?;
    let value = if text.is_empty() {
      Value::Null
    } else {
      serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    if !status.is_success() {
      return Err(UpstreamError::Status {
        code: status.as_u16(),
        body: value,
      });
    }
    Ok(value)
  }
}
