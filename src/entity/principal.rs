use super::{EncodedHash, Email, Password, PrincipalId};
use crate::error::*;

/// Internal principal as persisted in the identity store.
/// The upstream pair is set when the principal links an upstream account and cleared on unlink.
#[derive(Clone)]
pub struct PrincipalRecord {
  pub id: PrincipalId,
  pub name: String,
  pub email: Email,
  pub position: Option<String>,
  pub encoded_hash: EncodedHash, // including salt and argon2 config
  pub upstream_email: Option<String>,
  pub upstream_password_encrypted: Option<String>,
}

impl PrincipalRecord {
  pub fn new(name: &str, email: &Email, password: &Password, position: Option<&str>) -> Result<Self> {
    ensure!(!name.trim().is_empty(), "Name must not be empty");
    Ok(Self {
      id: PrincipalId::generate(),
      name: name.trim().to_string(),
      email: email.to_owned(),
      position: position.map(|p| p.to_string()),
      encoded_hash: EncodedHash::generate(password)?,
      upstream_email: None,
      upstream_password_encrypted: None,
    })
  }

  /// Upstream email and encrypted password, only when both are configured
  pub fn upstream_credentials(&self) -> Option<(&str, &str)> {
    match (&self.upstream_email, &self.upstream_password_encrypted) {
      (Some(email), Some(blob)) if !email.is_empty() && !blob.is_empty() => Some((email.as_str(), blob.as_str())),
      _ => None,
    }
  }

  pub fn is_upstream_linked(&self) -> bool {
    self.upstream_credentials().is_some()
  }
}

impl std::fmt::Debug for PrincipalRecord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PrincipalRecord")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("email", &self.email)
      .field("position", &self.position)
      .field("upstream_linked", &self.is_upstream_linked())
      .finish()
  }
}
