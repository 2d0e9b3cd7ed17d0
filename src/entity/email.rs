use super::{Entity, TryNewEntity};
use crate::error::*;
use std::borrow::Cow;
use validator::Validate;

#[derive(Debug, Clone, Eq, PartialEq, Validate)]
pub struct Email {
  #[validate(length(min = 3), email)]
  value: String,
}
impl<'a, T: Into<Cow<'a, str>>> TryNewEntity<T> for Email {
  fn new(email: T) -> Result<Self> {
    let value = email.into().trim().to_ascii_lowercase();
    let object = Self { value };
    object.validate()?;
    Ok(object)
  }
}
impl Entity for Email {
  fn as_str(&self) -> &str {
    &self.value
  }
  fn into_string(self) -> String {
    self.value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_is_normalized() {
    let email = Email::new("  Operator@Example.COM ").unwrap();
    assert_eq!(email.as_str(), "operator@example.com");
  }

  #[test]
  fn invalid_email_is_rejected() {
    assert!(Email::new("not-an-email").is_err());
    assert!(Email::new("   ").is_err());
  }
}
