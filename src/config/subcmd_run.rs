use super::{verify_url, ClapSubCommand};
use crate::{
  constants::*,
  error::*,
  log::*,
  state::{AppState, CryptoState, TableState, UpstreamState},
  table::setup_sqlite,
  token::TokenCodec,
  upstream::{HttpLoginAutomation, HttpUpstreamApi},
  vault::CredentialVault,
};
use async_trait::async_trait;
use clap::{Arg, ArgMatches, Command};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use url::Url;

pub(super) struct Run {}

#[async_trait]
impl ClapSubCommand for Run {
  fn subcmd() -> Command {
    Command::new("run")
      .arg(
        Arg::new("listen_address")
          .short('l')
          .long("listen-address")
          .value_name("ADDRESS")
          .default_value(DEFAULT_ADDRESS)
          .help("Listen address"),
      )
      .arg(
        Arg::new("port")
          .short('p')
          .long("port")
          .value_name("PORT")
          .default_value(DEFAULT_PORT)
          .help("Listen port"),
      )
      .arg(
        Arg::new("db_file_path")
          .short('d')
          .long("db-file-path")
          .value_name("PATH")
          .default_value(DB_FILE_PATH)
          .help("SQLite database file path"),
      )
      .arg(
        Arg::new("token_ttl_mins")
          .short('t')
          .long("token-ttl-mins")
          .value_name("MINUTES")
          .value_parser(clap::value_parser!(u32).range(1..))
          .default_value(DEFAULT_TOKEN_TTL_MINS)
          .help("Validity of issued tokens in minutes"),
      )
      .arg(
        Arg::new("upstream_url")
          .short('u')
          .long("upstream-url")
          .required(true)
          .value_parser(verify_url)
          .value_name("URL")
          .help("Base url of the upstream api like \"https://upstream.example.com\""),
      )
      .arg(
        Arg::new("upstream_profile_path")
          .long("upstream-profile-path")
          .value_name("PATH")
          .default_value(DEFAULT_UPSTREAM_PROFILE_PATH)
          .help("Upstream path returning the profile of the logged-in account"),
      )
      .arg(
        Arg::new("session_cookie_name")
          .long("session-cookie-name")
          .value_name("NAME")
          .default_value(DEFAULT_SESSION_COOKIE_NAME)
          .help("Name of the upstream session cookie"),
      )
      .arg(
        Arg::new("automation_url")
          .short('a')
          .long("automation-url")
          .required(true)
          .value_parser(verify_url)
          .value_name("URL")
          .help("Base url of the login automation service"),
      )
      .arg(
        Arg::new("refresh_timeout_secs")
          .long("refresh-timeout-secs")
          .value_name("SECONDS")
          .value_parser(clap::value_parser!(u64).range(1..))
          .default_value(DEFAULT_REFRESH_TIMEOUT_SECS)
          .help("Upper bound of an upstream session refresh in seconds"),
      )
      .arg(
        Arg::new("jwt_secret")
          .long("jwt-secret")
          .value_name("SECRET")
          .env(JWT_SECRET_VAR)
          .hide_env_values(true)
          .required(true)
          .help("Secret to sign internal tokens"),
      )
      .arg(
        Arg::new("credential_secret")
          .long("credential-secret")
          .value_name("SECRET")
          .env(CREDENTIAL_SECRET_VAR)
          .hide_env_values(true)
          .help("Secret to encrypt stored upstream passwords. Falls back to the token signing secret"),
      )
  }

  async fn exec_matches(sub_m: &ArgMatches) -> Result<Option<crate::AppState>> {
    let Some(address) = sub_m.get_one::<String>("listen_address") else {
      bail!("Listen address must be specified");
    };
    let Some(port) = sub_m.get_one::<String>("port") else {
      bail!("Port must be specified");
    };
    let listen_socket = format!("{}:{}", address, port).parse::<SocketAddr>()?;

    let Some(jwt_secret) = sub_m.get_one::<String>("jwt_secret") else {
      bail!("{} must be specified", JWT_SECRET_VAR);
    };
    ensure!(!jwt_secret.is_empty(), "{} must not be empty", JWT_SECRET_VAR);
    let credential_secret = match sub_m.get_one::<String>("credential_secret") {
      Some(s) if !s.is_empty() => s,
      _ => {
        warn!(
          "{} is not set. Stored upstream passwords are encrypted with {}",
          CREDENTIAL_SECRET_VAR, JWT_SECRET_VAR
        );
        jwt_secret
      }
    };

    let Some(token_ttl_mins) = sub_m.get_one::<u32>("token_ttl_mins") else {
      bail!("Token ttl must be specified");
    };
    let Some(refresh_timeout_secs) = sub_m.get_one::<u64>("refresh_timeout_secs") else {
      bail!("Refresh timeout must be specified");
    };

    let Some(upstream_url) = sub_m.get_one::<String>("upstream_url") else {
      bail!("Upstream url must be specified");
    };
    let Some(automation_url) = sub_m.get_one::<String>("automation_url") else {
      bail!("Automation url must be specified");
    };
    let (Some(profile_path), Some(cookie_name)) = (
      sub_m.get_one::<String>("upstream_profile_path"),
      sub_m.get_one::<String>("session_cookie_name"),
    ) else {
      bail!("Upstream profile path and session cookie name must be specified");
    };

    let db_file_path: String = match sub_m.get_one::<String>("db_file_path") {
      Some(p) => p.to_string(),
      None => {
        bail!("Database path must be specified");
      }
    };
    let principal = setup_sqlite(&format!("sqlite:{}", db_file_path)).await?;

    let api = HttpUpstreamApi::new(&Url::parse(upstream_url)?, cookie_name)?;
    let automation = HttpLoginAutomation::new(&Url::parse(automation_url)?)?;
    info!("Upstream: {}, login automation: {}", upstream_url, automation_url);

    Ok(Some(AppState {
      listen_socket,
      crypto: CryptoState {
        codec: TokenCodec::new(jwt_secret, chrono::Duration::minutes(*token_ttl_mins as i64)),
        vault: CredentialVault::new(credential_secret),
      },
      table: TableState { principal },
      upstream: UpstreamState {
        api: Arc::new(api),
        automation: Arc::new(automation),
        refresh_timeout: Duration::from_secs(*refresh_timeout_secs),
        profile_path: profile_path.to_string(),
      },
    }))
  }
}
