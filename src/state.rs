use crate::{
  session::SessionRefresher,
  table::SqlitePrincipalTable,
  token::TokenCodec,
  upstream::{LoginAutomation, UpstreamApi},
  vault::CredentialVault,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};

pub struct CryptoState {
  pub codec: TokenCodec,
  pub vault: CredentialVault,
}

pub struct TableState {
  pub principal: SqlitePrincipalTable,
}

pub struct UpstreamState {
  pub api: Arc<dyn UpstreamApi>,
  pub automation: Arc<dyn LoginAutomation>,
  /// Upper bound of a whole session refresh
  pub refresh_timeout: Duration,
  /// Upstream path queried to enrich the profile
  pub profile_path: String,
}

pub struct AppState {
  pub listen_socket: SocketAddr,
  pub crypto: CryptoState,
  pub table: TableState,
  pub upstream: UpstreamState,
}

impl AppState {
  pub fn refresher(&self) -> SessionRefresher<'_> {
    SessionRefresher::new(
      &self.table.principal,
      self.upstream.automation.as_ref(),
      &self.crypto.vault,
      &self.crypto.codec,
    )
  }
}
