use super::{request::CredentialRequest, response::TokensResponse};
use crate::{
  entity::Entity,
  log::*,
  state::AppState,
  table::PrincipalTable,
  token::{TokenPayload, UpstreamSession},
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
pub enum GetTokensError {
  TokenCreationFailed,
  InvalidPassword,
  Argon2Failure,
  UnauthorizedPrincipal,
  InvalidRequest,
}
impl IntoResponse for GetTokensError {
  fn into_response(self) -> Response {
    let (status, error_message) = match self {
      GetTokensError::TokenCreationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation failed"),
      GetTokensError::InvalidPassword => (StatusCode::UNAUTHORIZED, "Unauthorized"),
      GetTokensError::Argon2Failure => (StatusCode::INTERNAL_SERVER_ERROR, "Something failed in authentication"),
      GetTokensError::UnauthorizedPrincipal => (StatusCode::UNAUTHORIZED, "Unauthorized"),
      GetTokensError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
    };
    let body = Json(json!({
        "error": error_message,
    }));
    (status, body).into_response()
  }
}

/// Internal login. A linked principal gets a fresh upstream session embedded when the automated login succeeds.
pub async fn get_tokens(
  State(state): State<Arc<AppState>>,
  Json(input): Json<CredentialRequest>,
) -> Result<Json<TokensResponse>, GetTokensError> {
  let (Ok(email), Ok(password)) = (input.email(), input.password()) else {
    return Err(GetTokensError::InvalidRequest);
  };

  let Ok(principal) = state.table.principal.find_by_email(&email).await else {
    return Err(GetTokensError::TokenCreationFailed);
  };
  let Some(principal) = principal else {
    return Err(GetTokensError::UnauthorizedPrincipal);
  };

  let Ok(password_verified) = password.verify(&principal.encoded_hash) else {
    return Err(GetTokensError::Argon2Failure);
  };
  if !password_verified {
    return Err(GetTokensError::InvalidPassword);
  }
  debug!("[{}] Verified by password", principal.id);

  let (token, message) = match &principal.upstream_email {
    Some(upstream_email) if principal.is_upstream_linked() => {
      let refreshed = state
        .refresher()
        .refresh_with_timeout(principal.id.as_str(), state.upstream.refresh_timeout)
        .await;
      match refreshed {
        Ok(result) => (result.new_signed_token, "ok. login with upstream session."),
        Err(e) => {
          // the principal can still use endpoints not requiring the upstream
          warn!("[{}] Login without upstream session: {}", principal.id, e);
          let payload = TokenPayload::internal(
            principal.id.as_str(),
            Some(UpstreamSession {
              linked: true,
              email: Some(upstream_email.clone()),
              login_succeeded: Some(false),
              ..Default::default()
            }),
          )
          .with_profile(Some(&principal.name), Some(principal.email.as_str()));
          let Ok(token) = state.crypto.codec.sign(&payload) else {
            return Err(GetTokensError::TokenCreationFailed);
          };
          (token, "ok. login without upstream session.")
        }
      }
    }
    _ => {
      let payload = TokenPayload::internal(principal.id.as_str(), Some(UpstreamSession::default()))
        .with_profile(Some(&principal.name), Some(principal.email.as_str()));
      let Ok(token) = state.crypto.codec.sign(&payload) else {
        return Err(GetTokensError::TokenCreationFailed);
      };
      (token, "ok. login.")
    }
  };

  let Ok(payload) = state.crypto.codec.verify(&token) else {
    return Err(GetTokensError::TokenCreationFailed);
  };
  info!("[{}] Issued a token", principal.id);

  Ok(Json(TokensResponse::new(token, &payload, message)))
}
