use crate::{
  entity::{Entity, PrincipalRecord},
  token::{Principal, TokenPayload},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
  pub id: String,
  pub name: String,
  pub email: String,
  pub position: Option<String>,
  pub message: String,
}

impl From<&PrincipalRecord> for RegisterResponse {
  fn from(principal: &PrincipalRecord) -> Self {
    Self {
      id: principal.id.as_str().to_string(),
      name: principal.name.clone(),
      email: principal.email.as_str().to_string(),
      position: principal.position.clone(),
      message: "ok. registered.".to_string(),
    }
  }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokensResponse {
  pub token: String,
  pub subject: String,
  pub kind: &'static str,
  pub linked: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub login_succeeded: Option<bool>,
  pub message: String,
}

impl TokensResponse {
  pub fn new(token: String, payload: &TokenPayload, message: &str) -> Self {
    let (linked, login_succeeded) = match &payload.principal {
      Some(Principal::Internal { upstream_session }) => upstream_session
        .as_ref()
        .map(|s| (s.linked, s.login_succeeded))
        .unwrap_or((false, None)),
      Some(Principal::Mobile { mobile_session }) => (false, mobile_session.as_ref().and_then(|s| s.login_succeeded)),
      None => (false, None),
    };
    Self {
      token,
      subject: payload.subject.clone(),
      kind: kind_of(payload),
      linked,
      login_succeeded,
      message: message.to_string(),
    }
  }
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
  pub subject: String,
  pub kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub position: Option<String>,
  pub upstream_linked: bool,
  /// Upstream view of the principal, when it could be fetched
  pub upstream_profile: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tenant_info: Option<Value>,
}

pub fn kind_of(payload: &TokenPayload) -> &'static str {
  match payload.principal {
    Some(Principal::Internal { .. }) => "internal",
    Some(Principal::Mobile { .. }) => "mobile",
    None => "legacy",
  }
}
