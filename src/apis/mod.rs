mod get_tokens;
mod health_check;
mod link;
mod me;
mod mobile_tokens;
mod proxy;
mod refresh;
mod register;
mod request;
mod response;

use crate::{
  middleware::{finalize_refresh, permissive_session, strict_session},
  state::AppState,
};
use axum::{
  middleware::{from_fn, from_fn_with_state},
  routing::{get, post},
  Router,
};
use std::sync::Arc;

pub use get_tokens::get_tokens;
pub use health_check::health_check;
pub use link::{link, unlink};
pub use me::me;
pub use mobile_tokens::mobile_tokens;
pub use proxy::proxy;
pub use refresh::refresh;
pub use register::register;

/// Routes nested under /v1.0, each group behind its session validator
pub fn build_router(shared_state: Arc<AppState>) -> Router {
  let public_routes = Router::new()
    .route("/register", post(register))
    .route("/tokens", post(get_tokens))
    .route("/mobile/tokens", post(mobile_tokens));

  let permissive_routes = Router::new()
    .route("/me", get(me))
    .route("/upstream/link", post(link))
    .route("/upstream/unlink", post(unlink))
    .route("/upstream/refresh", post(refresh))
    .route_layer(from_fn_with_state(shared_state.clone(), permissive_session));

  let strict_routes = Router::new()
    .route("/proxy/*path", get(proxy).post(proxy))
    .route_layer(from_fn_with_state(shared_state.clone(), strict_session));

  let api_routes = public_routes
    .merge(permissive_routes)
    .merge(strict_routes)
    .with_state(shared_state);

  Router::new()
    .route("/health", get(health_check))
    .nest("/v1.0", api_routes)
    .layer(from_fn(finalize_refresh))
}
