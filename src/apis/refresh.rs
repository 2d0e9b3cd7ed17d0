use crate::{
  error::AuthError,
  session::{RefreshResult, RefreshSlot},
  state::AppState,
  token::TokenPayload,
};
use axum::{extract::State, Extension, Json};
use std::sync::Arc;

/// Explicit renewal of the upstream session of an internal principal
pub async fn refresh(
  State(state): State<Arc<AppState>>,
  Extension(payload): Extension<TokenPayload>,
  Extension(slot): Extension<RefreshSlot>,
) -> Result<Json<RefreshResult>, AuthError> {
  if payload.is_mobile() {
    return Err(AuthError::UpstreamCredentialsNotConfigured);
  }
  let result = state
    .refresher()
    .refresh_with_timeout(&payload.subject, state.upstream.refresh_timeout)
    .await?;
  slot.set(result.new_signed_token.clone());
  Ok(Json(result))
}
