pub const THREAD_NAME: &str = "upstream_session_gateway";

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: &str = "3000";

// Secrets are only read from the environment
/// Environment variable holding the HMAC secret of internal tokens
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";
/// Environment variable holding the secret of the credential vault. Falls back to JWT_SECRET.
pub const CREDENTIAL_SECRET_VAR: &str = "CREDENTIAL_SECRET";

// Database settings
pub const DB_FILE_PATH: &str = "./principals.db";
pub const PRINCIPAL_TABLE_NAME: &str = "principals";

// Argon2 password hashing params for internal login passwords
use argon2::{Config, Variant, Version};
pub const ARGON2_CONFIG: Config = Config {
  variant: Variant::Argon2id,
  version: Version::Version13,
  mem_cost: 4096,
  time_cost: 3,
  lanes: 4,
  secret: &[],
  ad: &[],
  hash_length: 32,
};
pub const ARGON2_SALT_LEN: usize = 32;

// Token settings
/// Default validity of internal tokens in minutes
pub const DEFAULT_TOKEN_TTL_MINS: &str = "60";
/// Response header carrying a token renewed during the request
pub const NEW_AUTH_TOKEN_HEADER: &str = "x-new-auth-token";

// Credential vault
/// AES block size, i.e., IV length of AES-256-CBC
pub const VAULT_IV_LEN: usize = 16;

// Upstream and login automation
pub const DEFAULT_UPSTREAM_PROFILE_PATH: &str = "api/v1/me";
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "session";
pub const CSRF_TOKEN_HEADER: &str = "x-csrf-token";
/// Upper bound of a whole session refresh, i.e., the automated browser login
pub const DEFAULT_REFRESH_TIMEOUT_SECS: &str = "60";
/// Timeout of a single proxied upstream API call
pub const UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 30;
pub const AUTOMATION_LOGIN_PATH: &str = "login";
pub const AUTOMATION_MOBILE_LOGIN_PATH: &str = "mobile/login";
