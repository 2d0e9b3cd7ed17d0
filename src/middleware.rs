use crate::{
  constants::NEW_AUTH_TOKEN_HEADER,
  error::AuthError,
  log::*,
  session::{PermissiveValidator, RefreshSlot, SessionValidator, StrictValidator},
  state::AppState,
  token::{TokenCodec, TokenPayload},
};
use axum::{
  extract::{Request, State},
  http::{header, HeaderMap, HeaderValue, StatusCode},
  middleware::Next,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use std::sync::Arc;

impl IntoResponse for AuthError {
  fn into_response(self) -> Response {
    let body = Json(json!({
        "error": self.to_string(),
        "code": self.code(),
    }));
    (StatusCode::UNAUTHORIZED, body).into_response()
  }
}

/// Outermost layer. Gives every request an empty refresh slot and,
/// once the handler chain completes, attaches the renewed token if any.
pub async fn finalize_refresh(mut request: Request, next: Next) -> Response {
  let slot = RefreshSlot::default();
  request.extensions_mut().insert(slot.clone());

  let mut response = next.run(request).await;
  if let Some(token) = slot.get() {
    match HeaderValue::from_str(&token) {
      Ok(value) => {
        response.headers_mut().insert(NEW_AUTH_TOKEN_HEADER, value);
      }
      Err(_) => error!("Renewed token cannot be carried in a header"),
    }
  }
  response
}

/// Endpoints requiring a working upstream session
pub async fn strict_session(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
  authorize(&state, &StrictValidator, request, next).await
}

/// Endpoints working with or without an upstream session
pub async fn permissive_session(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
  authorize(&state, &PermissiveValidator, request, next).await
}

async fn authorize<V>(state: &AppState, validator: &V, mut request: Request, next: Next) -> Response
where
  V: SessionValidator,
{
  match check_session(&state.crypto.codec, validator, request.headers()) {
    Ok(payload) => {
      debug!("[{}] Authorized {}", payload.subject, request.uri().path());
      request.extensions_mut().insert::<TokenPayload>(payload);
      next.run(request).await
    }
    Err(Rejection { subject: Some(subject), error }) => {
      debug!("[{}] Rejected {}: {}", subject, request.uri().path(), error);
      error.into_response()
    }
    Err(Rejection { subject: None, error }) => {
      debug!("Rejected {}: {}", request.uri().path(), error);
      error.into_response()
    }
  }
}

/// Subject is known once the token itself has been verified
struct Rejection {
  subject: Option<String>,
  error: AuthError,
}

fn check_session<V>(codec: &TokenCodec, validator: &V, headers: &HeaderMap) -> Result<TokenPayload, Rejection>
where
  V: SessionValidator,
{
  let payload = bearer_token(headers)
    .and_then(|token| codec.verify(token))
    .map_err(|error| Rejection { subject: None, error })?;
  let subject = payload.subject.clone();
  validator.validate(payload).map_err(|error| Rejection {
    subject: Some(subject),
    error,
  })
}

/// `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
  let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
    return Err(AuthError::MissingToken);
  };
  let Ok(auth_header) = auth_header.to_str() else {
    return Err(AuthError::TokenMalformed);
  };
  match auth_header.split_once(' ') {
    Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => Ok(token.trim()),
    _ => Err(AuthError::MissingToken),
  }
}
