use super::{Entity, TryNewEntity};
use crate::error::*;
use std::borrow::Cow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Validate)]
pub struct PrincipalId {
  #[validate(length(min = 1))]
  value: String,
}
impl<'a, T: Into<Cow<'a, str>>> TryNewEntity<T> for PrincipalId {
  fn new(id: T) -> Result<Self> {
    let value = id.into().to_string();
    let object = Self { value };
    object.validate()?;
    Ok(object)
  }
}
impl Entity for PrincipalId {
  fn as_str(&self) -> &str {
    &self.value
  }
  fn into_string(self) -> String {
    self.value
  }
}
impl PrincipalId {
  pub fn generate() -> Self {
    Self {
      value: Uuid::new_v4().to_string(),
    }
  }
}
impl std::fmt::Display for PrincipalId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
