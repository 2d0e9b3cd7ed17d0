use super::response::{kind_of, ProfileResponse};
use crate::{
  entity::{Entity, PrincipalId, TryNewEntity},
  log::*,
  session::{with_session_refresh, RefreshSlot},
  state::AppState,
  table::PrincipalTable,
  token::TokenPayload,
};
use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Extension, Json,
};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug)]
pub enum MeError {
  PrincipalNotFound,
  LookupFailed,
}
impl IntoResponse for MeError {
  fn into_response(self) -> Response {
    let (status, error_message) = match self {
      MeError::PrincipalNotFound => (StatusCode::NOT_FOUND, "Principal not found"),
      MeError::LookupFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to look up principal"),
    };
    let body = Json(json!({
        "error": error_message,
    }));
    (status, body).into_response()
  }
}

/// Profile of the caller, enriched from the upstream on a best-effort basis
pub async fn me(
  State(state): State<Arc<AppState>>,
  Extension(payload): Extension<TokenPayload>,
  Extension(slot): Extension<RefreshSlot>,
) -> Result<Json<ProfileResponse>, MeError> {
  if let Some(mobile) = payload.mobile_session() {
    return Ok(Json(ProfileResponse {
      subject: payload.subject.clone(),
      kind: kind_of(&payload),
      email: payload.contact_email.clone(),
      upstream_profile: mobile.principal_info.clone(),
      tenant_info: mobile.tenant_info.clone(),
      ..Default::default()
    }));
  }

  let Ok(id) = PrincipalId::new(payload.subject.as_str()) else {
    return Err(MeError::PrincipalNotFound);
  };
  let principal = match state.table.principal.find_principal(&id).await {
    Ok(Some(principal)) => principal,
    Ok(None) => return Err(MeError::PrincipalNotFound),
    Err(e) => {
      error!("[{}] Failed to look up principal: {}", id, e);
      return Err(MeError::LookupFailed);
    }
  };

  let upstream_profile = if payload.has_direct_session() {
    let refresher = state.refresher();
    let api = state.upstream.api.as_ref();
    let profile_path = state.upstream.profile_path.as_str();
    let res = with_session_refresh(&refresher, state.upstream.refresh_timeout, &payload, &slot, |session| async move {
      api.request(Method::GET, profile_path, None, &session).await
    })
    .await;
    match res {
      Ok(profile) => Some(profile),
      Err(e) => {
        debug!("[{}] Profile served without upstream enrichment: {}", id, e);
        None
      }
    }
  } else {
    None
  };

  Ok(Json(ProfileResponse {
    subject: payload.subject.clone(),
    kind: kind_of(&payload),
    name: Some(principal.name.clone()),
    email: Some(principal.email.as_str().to_string()),
    position: principal.position.clone(),
    upstream_linked: principal.is_upstream_linked(),
    upstream_profile,
    tenant_info: None,
  }))
}
