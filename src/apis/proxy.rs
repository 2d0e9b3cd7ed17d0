use crate::{
  log::*,
  session::{with_session_refresh, RefreshSlot},
  state::AppState,
  token::TokenPayload,
  upstream::UpstreamError,
};
use axum::{
  body::Bytes,
  extract::{Path, RawQuery, State},
  http::{Method, StatusCode},
  response::{IntoResponse, Response},
  Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug)]
pub enum ProxyError {
  InvalidRequest,
  Upstream(UpstreamError),
}
impl IntoResponse for ProxyError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ProxyError::InvalidRequest => (StatusCode::BAD_REQUEST, json!({ "error": "Invalid request" })),
      ProxyError::Upstream(UpstreamError::SessionExpired(_)) => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "Upstream session expired", "code": "upstream_session_expired" }),
      ),
      ProxyError::Upstream(UpstreamError::NoSession) => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "No upstream session in token", "code": "missing_upstream_credentials" }),
      ),
      // upstream errors are relayed as they are
      ProxyError::Upstream(UpstreamError::Status { code, body }) => (
        StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
        body,
      ),
      ProxyError::Upstream(UpstreamError::UrlError) => (StatusCode::BAD_REQUEST, json!({ "error": "Invalid path" })),
      ProxyError::Upstream(UpstreamError::Transport(_)) => {
        (StatusCode::BAD_GATEWAY, json!({ "error": "Failed to reach upstream" }))
      }
    };
    (status, Json(body)).into_response()
  }
}

/// Forward the call to the upstream with the session embedded in the token
pub async fn proxy(
  State(state): State<Arc<AppState>>,
  Extension(payload): Extension<TokenPayload>,
  Extension(slot): Extension<RefreshSlot>,
  method: Method,
  Path(path): Path<String>,
  RawQuery(query): RawQuery,
  body: Bytes,
) -> Result<Json<Value>, ProxyError> {
  let body: Option<Value> = if body.is_empty() {
    None
  } else {
    let Ok(value) = serde_json::from_slice(&body) else {
      return Err(ProxyError::InvalidRequest);
    };
    Some(value)
  };
  let target = match query {
    Some(query) => format!("{}?{}", path, query),
    None => path,
  };
  debug!("[{}] Proxy {} {}", payload.subject, method, target);

  let refresher = state.refresher();
  let api = state.upstream.api.as_ref();
  let (target, body) = (target.as_str(), body.as_ref());
  let res = with_session_refresh(&refresher, state.upstream.refresh_timeout, &payload, &slot, |session| {
    let method = method.clone();
    async move { api.request(method, target, body, &session).await }
  })
  .await;

  match res {
    Ok(value) => Ok(Json(value)),
    Err(e) => {
      warn!("[{}] Upstream call failed: {}", payload.subject, e);
      Err(ProxyError::Upstream(e))
    }
  }
}
