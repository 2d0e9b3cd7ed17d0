use super::{request::CredentialRequest, response::TokensResponse};
use crate::{
  entity::Entity,
  log::*,
  state::AppState,
  token::{MobileSession, TokenPayload},
};
use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug)]
pub enum MobileTokensError {
  InvalidRequest,
  UpstreamLoginFailed,
  UpstreamLoginRejected,
  TokenCreationFailed,
}
impl IntoResponse for MobileTokensError {
  fn into_response(self) -> Response {
    let (status, error_message) = match self {
      MobileTokensError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
      MobileTokensError::UpstreamLoginFailed => (StatusCode::UNAUTHORIZED, "Upstream login failed"),
      MobileTokensError::UpstreamLoginRejected => (StatusCode::UNAUTHORIZED, "Upstream login was rejected"),
      MobileTokensError::TokenCreationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation failed"),
    };
    let body = Json(json!({
        "error": error_message,
    }));
    (status, body).into_response()
  }
}

/// Login of a mobile principal directly with its upstream account. Nothing is stored.
pub async fn mobile_tokens(
  State(state): State<Arc<AppState>>,
  Json(input): Json<CredentialRequest>,
) -> Result<Json<TokensResponse>, MobileTokensError> {
  let (Ok(email), Ok(password)) = (input.email(), input.password()) else {
    return Err(MobileTokensError::InvalidRequest);
  };

  let login = tokio::time::timeout(
    state.upstream.refresh_timeout,
    state.upstream.automation.mobile_login(email.as_str(), password.as_str()),
  )
  .await;
  let login = match login {
    Ok(Ok(login)) => login,
    Ok(Err(e)) => {
      warn!("[{}] Mobile login failed: {}", email.as_str(), e);
      return Err(MobileTokensError::UpstreamLoginFailed);
    }
    Err(_) => {
      warn!("[{}] Mobile login timed out", email.as_str());
      return Err(MobileTokensError::UpstreamLoginFailed);
    }
  };
  let Some(mobile_token) = login.token.filter(|t| !t.is_empty()) else {
    warn!("[{}] Mobile login returned no token", email.as_str());
    return Err(MobileTokensError::UpstreamLoginRejected);
  };

  let payload = TokenPayload::mobile(
    email.as_str(),
    MobileSession {
      token: Some(mobile_token),
      principal_info: login.principal_info,
      tenant_info: login.tenant_info,
      login_succeeded: Some(true),
    },
  )
  .with_profile(None, Some(email.as_str()));
  let Ok(token) = state.crypto.codec.sign(&payload) else {
    return Err(MobileTokensError::TokenCreationFailed);
  };
  info!("[{}] Issued a mobile token", email.as_str());

  Ok(Json(TokensResponse::new(token, &payload, "ok. mobile login.")))
}
