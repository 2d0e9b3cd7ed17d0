use super::{request::RegisterRequest, response::RegisterResponse};
use crate::{
  entity::{Entity, PrincipalRecord},
  log::*,
  state::AppState,
  table::PrincipalTable,
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
pub enum RegisterError {
  InvalidRequest,
  DuplicatedEmail,
  RegistrationFailed,
}
impl IntoResponse for RegisterError {
  fn into_response(self) -> Response {
    let (status, error_message) = match self {
      RegisterError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
      RegisterError::DuplicatedEmail => (StatusCode::CONFLICT, "Email is already registered"),
      RegisterError::RegistrationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Registration failed"),
    };
    let body = Json(json!({
        "error": error_message,
    }));
    (status, body).into_response()
  }
}

pub async fn register(
  State(state): State<Arc<AppState>>,
  Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), RegisterError> {
  let (Ok(email), Ok(password)) = (input.email(), input.password()) else {
    return Err(RegisterError::InvalidRequest);
  };
  if input.name.trim().is_empty() {
    return Err(RegisterError::InvalidRequest);
  }

  let Ok(existing) = state.table.principal.find_by_email(&email).await else {
    return Err(RegisterError::RegistrationFailed);
  };
  if existing.is_some() {
    debug!("{} is already registered", email.as_str());
    return Err(RegisterError::DuplicatedEmail);
  }

  let Ok(principal) = PrincipalRecord::new(&input.name, &email, &password, input.position.as_deref()) else {
    return Err(RegisterError::RegistrationFailed);
  };
  if let Err(e) = state.table.principal.add(&principal).await {
    error!("Failed to store principal: {}", e);
    return Err(RegisterError::RegistrationFailed);
  }
  info!("[{}] Registered a principal", principal.id);

  Ok((StatusCode::CREATED, Json(RegisterResponse::from(&principal))))
}
