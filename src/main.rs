mod apis;
mod argon2;
mod config;
mod constants;
mod entity;
mod error;
mod log;
mod middleware;
#[cfg(test)]
mod mock;
mod session;
mod state;
mod table;
mod token;
mod upstream;
mod vault;

use crate::{apis::build_router, constants::*, error::*, log::*, state::AppState};
use config::parse_opts;
use std::sync::Arc;
use tokio::runtime::Builder;

fn main() -> Result<()> {
  init_logger();

  let mut runtime_builder = Builder::new_multi_thread();
  runtime_builder.enable_all();
  runtime_builder.thread_name(THREAD_NAME);
  let runtime = runtime_builder.build()?;

  runtime.block_on(async {
    match parse_opts().await {
      Ok(Some(shared_state)) => {
        serve(Arc::new(shared_state)).await;
      }
      Ok(None) => {
        warn!("Nothing to serve");
      }
      Err(e) => {
        error!("{e}");
      }
    };
  });

  Ok(())
}

async fn serve(shared_state: Arc<AppState>) {
  let addr = shared_state.listen_socket;
  let tcp_listener = match tokio::net::TcpListener::bind(&addr).await {
    Ok(listener) => listener,
    Err(e) => {
      error!("Failed to bind {}: {e}", &addr);
      return;
    }
  };
  info!("Listening on {}", &addr);

  let router = build_router(shared_state);
  let server = axum::serve(tcp_listener, router);

  if let Err(e) = server.await {
    error!("Server is down!: {e}");
  }
}
