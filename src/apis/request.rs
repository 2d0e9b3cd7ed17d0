use crate::{
  entity::{Email, Password, TryNewEntity},
  error::*,
};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct RegisterRequest {
  pub name: String,
  pub email: String,
  pub password: String,
  pub position: Option<String>,
}
impl RegisterRequest {
  pub fn email(&self) -> Result<Email> {
    Email::new(&self.email)
  }
  pub fn password(&self) -> Result<Password> {
    Password::new(&self.password)
  }
}

/// Email and password pair, for both internal and upstream accounts
#[derive(Deserialize, Clone)]
pub struct CredentialRequest {
  pub email: String,
  pub password: String,
}
impl CredentialRequest {
  pub fn email(&self) -> Result<Email> {
    Email::new(&self.email)
  }
  pub fn password(&self) -> Result<Password> {
    Password::new(&self.password)
  }
}
