use crate::{error::*, upstream::SessionMaterial};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Custom claims of an internal token.
/// `csrfToken`/`sessionCookie` at the top level are the directly usable upstream session,
/// either promoted by a session validator or carried by a legacy token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTokenPayload")]
pub struct TokenPayload {
  #[serde(rename = "sub")]
  pub subject: String,
  /// `None` for legacy tokens issued without a `kind`
  #[serde(flatten)]
  pub principal: Option<Principal>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contact_email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub csrf_token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub session_cookie: Option<String>,
  /// Filled from the registered claims on verification
  #[serde(skip)]
  pub issued_at: Option<DateTime<Utc>>,
  #[serde(skip)]
  pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
  Internal {
    #[serde(rename = "upstreamSession", default, skip_serializing_if = "Option::is_none")]
    upstream_session: Option<UpstreamSession>,
  },
  Mobile {
    #[serde(rename = "mobileSession", default, skip_serializing_if = "Option::is_none")]
    mobile_session: Option<MobileSession>,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSession {
  pub linked: bool,
  #[serde(default, alias = "contactEmail", skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub csrf_token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub session_cookie: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub login_succeeded: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileSession {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub token: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub principal_info: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tenant_info: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub login_succeeded: Option<bool>,
}

/// Wire form of the custom claims. Only an absent `kind` denotes a legacy token;
/// an unknown kind or a broken nested session fails the whole token.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenPayload {
  #[serde(rename = "sub")]
  subject: String,
  #[serde(default)]
  kind: Option<PrincipalKind>,
  #[serde(default)]
  upstream_session: Option<UpstreamSession>,
  #[serde(default)]
  mobile_session: Option<MobileSession>,
  #[serde(default)]
  display_name: Option<String>,
  #[serde(default)]
  contact_email: Option<String>,
  #[serde(default)]
  csrf_token: Option<String>,
  #[serde(default)]
  session_cookie: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum PrincipalKind {
  Internal,
  Mobile,
}

impl TryFrom<RawTokenPayload> for TokenPayload {
  type Error = Error;

  fn try_from(raw: RawTokenPayload) -> Result<Self> {
    let principal = match (raw.kind, raw.upstream_session, raw.mobile_session) {
      (None, None, None) => None,
      (Some(PrincipalKind::Internal), upstream_session, None) => Some(Principal::Internal { upstream_session }),
      (Some(PrincipalKind::Mobile), None, mobile_session) => Some(Principal::Mobile { mobile_session }),
      (None, _, _) => bail!("Session claims without principal kind"),
      (Some(_), _, _) => bail!("Session claims do not match principal kind"),
    };
    Ok(Self {
      subject: raw.subject,
      principal,
      display_name: raw.display_name,
      contact_email: raw.contact_email,
      csrf_token: raw.csrf_token,
      session_cookie: raw.session_cookie,
      issued_at: None,
      expires_at: None,
    })
  }
}

/// Some and non-empty
pub(crate) fn is_present(value: &Option<String>) -> bool {
  value.as_deref().is_some_and(|v| !v.is_empty())
}

impl TokenPayload {
  pub fn internal(subject: &str, upstream_session: Option<UpstreamSession>) -> Self {
    Self {
      subject: subject.to_string(),
      principal: Some(Principal::Internal { upstream_session }),
      display_name: None,
      contact_email: None,
      csrf_token: None,
      session_cookie: None,
      issued_at: None,
      expires_at: None,
    }
  }

  pub fn mobile(subject: &str, mobile_session: MobileSession) -> Self {
    Self {
      principal: Some(Principal::Mobile {
        mobile_session: Some(mobile_session),
      }),
      ..Self::internal(subject, None)
    }
  }

  pub fn with_profile(mut self, display_name: Option<&str>, contact_email: Option<&str>) -> Self {
    self.display_name = display_name.map(|s| s.to_string());
    self.contact_email = contact_email.map(|s| s.to_string());
    self
  }

  pub fn upstream_session(&self) -> Option<&UpstreamSession> {
    match &self.principal {
      Some(Principal::Internal { upstream_session }) => upstream_session.as_ref(),
      _ => None,
    }
  }

  pub fn mobile_session(&self) -> Option<&MobileSession> {
    match &self.principal {
      Some(Principal::Mobile { mobile_session }) => mobile_session.as_ref(),
      _ => None,
    }
  }

  pub fn is_internal(&self) -> bool {
    matches!(self.principal, Some(Principal::Internal { .. }))
  }

  pub fn is_mobile(&self) -> bool {
    matches!(self.principal, Some(Principal::Mobile { .. }))
  }

  /// Top-level pair present, i.e., usable for upstream calls as a web session
  pub fn has_direct_session(&self) -> bool {
    is_present(&self.csrf_token) && is_present(&self.session_cookie)
  }

  /// Session material to call the upstream with, if any.
  /// A directly usable pair wins over the mobile token.
  pub fn session_material(&self) -> Option<SessionMaterial> {
    if let (Some(csrf_token), Some(session_cookie)) = (&self.csrf_token, &self.session_cookie) {
      if self.has_direct_session() {
        return Some(SessionMaterial::Web {
          csrf_token: csrf_token.clone(),
          session_cookie: session_cookie.clone(),
        });
      }
    }
    let mobile = self.mobile_session()?;
    match &mobile.token {
      Some(token) if !token.is_empty() => Some(SessionMaterial::Mobile { token: token.clone() }),
      _ => None,
    }
  }
}
