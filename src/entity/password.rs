use super::{EncodedHash, Entity, TryNewEntity};
use crate::{argon2::*, error::*};
use std::borrow::Cow;
use validator::Validate;

#[derive(Clone, Validate)]
pub struct Password {
  #[validate(length(min = 1))]
  value: String,
}
impl<'a, T: Into<Cow<'a, str>>> TryNewEntity<T> for Password {
  fn new(password: T) -> Result<Self> {
    let value = password.into().to_string();
    let object = Self { value };
    object.validate()?;
    Ok(object)
  }
}
impl Entity for Password {
  fn as_str(&self) -> &str {
    &self.value
  }
  fn into_string(self) -> String {
    self.value
  }
}
impl Password {
  pub fn hash(&self) -> Result<String> {
    generate_argon2(self.as_str())
  }
  pub fn verify(&self, encoded_hash: &EncodedHash) -> Result<bool> {
    verify_argon2(self.as_str(), encoded_hash.as_str())
  }
}
// never print the password itself
impl std::fmt::Debug for Password {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("Password(***)")
  }
}
