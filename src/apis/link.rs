use super::{request::CredentialRequest, response::TokensResponse};
use crate::{
  entity::{Entity, PrincipalId, PrincipalRecord, TryNewEntity},
  error::AuthError,
  log::*,
  session::RefreshSlot,
  state::AppState,
  table::PrincipalTable,
  token::{TokenPayload, UpstreamSession},
};
use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Extension, Json,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug)]
pub enum LinkError {
  InvalidRequest,
  NotInternalPrincipal,
  PrincipalNotFound,
  StoreFailed,
  TokenCreationFailed,
  UpstreamLoginFailed(AuthError),
}
impl IntoResponse for LinkError {
  fn into_response(self) -> Response {
    let (status, error_message) = match self {
      LinkError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
      LinkError::NotInternalPrincipal => (StatusCode::FORBIDDEN, "Only internal principals can link upstream accounts"),
      LinkError::PrincipalNotFound => (StatusCode::NOT_FOUND, "Principal not found"),
      LinkError::StoreFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upstream credentials"),
      LinkError::TokenCreationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation failed"),
      // surfaced as an authorization failure with its code
      LinkError::UpstreamLoginFailed(e) => return e.into_response(),
    };
    let body = Json(json!({
        "error": error_message,
    }));
    (status, body).into_response()
  }
}

async fn internal_principal(state: &AppState, payload: &TokenPayload) -> Result<PrincipalRecord, LinkError> {
  if !payload.is_internal() {
    return Err(LinkError::NotInternalPrincipal);
  }
  let Ok(id) = PrincipalId::new(payload.subject.as_str()) else {
    return Err(LinkError::PrincipalNotFound);
  };
  match state.table.principal.find_principal(&id).await {
    Ok(Some(principal)) => Ok(principal),
    Ok(None) => Err(LinkError::PrincipalNotFound),
    Err(e) => {
      error!("[{}] Failed to look up principal: {}", id, e);
      Err(LinkError::StoreFailed)
    }
  }
}

/// Store encrypted upstream credentials and log in with them right away.
/// When the login fails the previously stored credentials are put back.
pub async fn link(
  State(state): State<Arc<AppState>>,
  Extension(payload): Extension<TokenPayload>,
  Extension(slot): Extension<RefreshSlot>,
  Json(input): Json<CredentialRequest>,
) -> Result<Json<TokensResponse>, LinkError> {
  let (Ok(upstream_email), Ok(upstream_password)) = (input.email(), input.password()) else {
    return Err(LinkError::InvalidRequest);
  };
  let principal = internal_principal(&state, &payload).await?;

  let Ok(encrypted) = state.crypto.vault.encrypt(upstream_password.as_str()) else {
    return Err(LinkError::StoreFailed);
  };
  let table = &state.table.principal;
  if let Err(e) = table
    .update_upstream_credentials(&principal.id, Some(upstream_email.as_str()), Some(encrypted.as_str()))
    .await
  {
    error!("[{}] Failed to store upstream credentials: {}", principal.id, e);
    return Err(LinkError::StoreFailed);
  }

  let refreshed = state
    .refresher()
    .refresh_with_timeout(principal.id.as_str(), state.upstream.refresh_timeout)
    .await;
  let result = match refreshed {
    Ok(result) => result,
    Err(e) => {
      if let Err(restore_err) = table
        .update_upstream_credentials(
          &principal.id,
          principal.upstream_email.as_deref(),
          principal.upstream_password_encrypted.as_deref(),
        )
        .await
      {
        error!(
          "[{}] Failed to restore previous upstream credentials: {}",
          principal.id, restore_err
        );
      }
      return Err(LinkError::UpstreamLoginFailed(e));
    }
  };
  info!("[{}] Linked an upstream account", principal.id);

  slot.set(result.new_signed_token.clone());
  let Ok(new_payload) = state.crypto.codec.verify(&result.new_signed_token) else {
    return Err(LinkError::TokenCreationFailed);
  };
  Ok(Json(TokensResponse::new(
    result.new_signed_token,
    &new_payload,
    "ok. upstream account linked.",
  )))
}

/// Clear stored upstream credentials and issue a token without upstream session
pub async fn unlink(
  State(state): State<Arc<AppState>>,
  Extension(payload): Extension<TokenPayload>,
) -> Result<Json<TokensResponse>, LinkError> {
  let principal = internal_principal(&state, &payload).await?;
  if let Err(e) = state
    .table
    .principal
    .update_upstream_credentials(&principal.id, None, None)
    .await
  {
    error!("[{}] Failed to clear upstream credentials: {}", principal.id, e);
    return Err(LinkError::StoreFailed);
  }
  info!("[{}] Unlinked the upstream account", principal.id);

  let new_payload = TokenPayload::internal(principal.id.as_str(), Some(UpstreamSession::default()))
    .with_profile(Some(&principal.name), Some(principal.email.as_str()));
  let Ok(token) = state.crypto.codec.sign(&new_payload) else {
    return Err(LinkError::TokenCreationFailed);
  };
  Ok(Json(TokensResponse::new(token, &new_payload, "ok. upstream account unlinked.")))
}
