use super::TokenPayload;
use crate::error::*;
use chrono::{DateTime, Duration, Utc};
use jwt_compact::{
  alg::{Hs256, Hs256Key},
  AlgorithmExt, Claims, Header, TimeOptions, UntrustedToken, ValidationError,
};

/// Signs and verifies internal tokens with HS256 and a single symmetric secret
pub struct TokenCodec {
  key: Hs256Key,
  ttl: Duration,
}

impl TokenCodec {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      key: Hs256Key::new(secret.as_bytes()),
      ttl,
    }
  }

  /// Sign the payload with `iat = now` and `exp = now + ttl`
  pub fn sign(&self, payload: &TokenPayload) -> Result<String> {
    self.sign_at(payload, Utc::now())
  }

  /// Verify signature, structure and expiry. No leeway is given to expiry.
  pub fn verify(&self, token: &str) -> std::result::Result<TokenPayload, AuthError> {
    self.verify_at(token, Utc::now())
  }

  pub(crate) fn sign_at(&self, payload: &TokenPayload, now: DateTime<Utc>) -> Result<String> {
    let time_options = TimeOptions::new(Duration::zero(), move || now);
    let claims = Claims::new(payload).set_duration_and_issuance(&time_options, self.ttl);
    let token = Hs256
      .token(&Header::empty(), &claims, &self.key)
      .map_err(|e| anyhow!("Failed to sign token: {}", e))?;
    Ok(token)
  }

  pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<TokenPayload, AuthError> {
    let untrusted = UntrustedToken::new(token).map_err(|_| AuthError::TokenMalformed)?;
    let verified = Hs256
      .validator::<TokenPayload>(&self.key)
      .validate(&untrusted)
      .map_err(|_| AuthError::TokenMalformed)?;

    let time_options = TimeOptions::new(Duration::zero(), move || now);
    let claims = verified.claims();
    claims.validate_expiration(&time_options).map_err(|e| match e {
      ValidationError::Expired => AuthError::TokenExpired,
      _ => AuthError::TokenMalformed,
    })?;

    let mut payload = claims.custom.clone();
    payload.issued_at = claims.issued_at;
    payload.expires_at = claims.expiration;
    Ok(payload)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::UpstreamSession;

  fn codec() -> TokenCodec {
    TokenCodec::new("test-signing-secret", Duration::minutes(60))
  }

  fn linked_payload() -> TokenPayload {
    TokenPayload::internal(
      "p2",
      Some(UpstreamSession {
        linked: true,
        email: Some("op@upstream.example.com".to_string()),
        csrf_token: Some("abc".to_string()),
        session_cookie: Some("xyz".to_string()),
        login_succeeded: Some(true),
      }),
    )
  }

  #[test]
  fn sign_then_verify_before_expiry() {
    let codec = codec();
    let payload = linked_payload();
    let token = codec.sign(&payload).unwrap();

    let verified = codec.verify(&token).unwrap();
    assert_eq!(verified.subject, payload.subject);
    assert_eq!(verified.principal, payload.principal);
    let issued_at = verified.issued_at.unwrap();
    let expires_at = verified.expires_at.unwrap();
    assert_eq!(expires_at - issued_at, Duration::minutes(60));
  }

  #[test]
  fn expired_token_is_rejected() {
    let codec = codec();
    let issued = Utc::now() - Duration::minutes(61);
    let token = codec.sign_at(&linked_payload(), issued).unwrap();

    assert!(matches!(codec.verify(&token), Err(AuthError::TokenExpired)));
    // still valid right before expiry
    assert!(codec.verify_at(&token, issued + Duration::minutes(59)).is_ok());
  }

  #[test]
  fn tampered_or_foreign_token_is_malformed() {
    let token = codec().sign(&linked_payload()).unwrap();

    let other = TokenCodec::new("another-secret", Duration::minutes(60));
    assert!(matches!(other.verify(&token), Err(AuthError::TokenMalformed)));
    assert!(matches!(codec().verify("not.a.token"), Err(AuthError::TokenMalformed)));
    assert!(matches!(codec().verify(""), Err(AuthError::TokenMalformed)));

    let mut tampered = token.clone();
    tampered.pop();
    tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
    assert!(matches!(codec().verify(&tampered), Err(AuthError::TokenMalformed)));
  }

  #[test]
  fn legacy_token_round_trips() {
    let codec = codec();
    let mut legacy = TokenPayload::internal("legacy", None);
    legacy.principal = None;
    legacy.csrf_token = Some("abc".to_string());
    legacy.session_cookie = Some("xyz".to_string());

    let verified = codec.verify(&codec.sign(&legacy).unwrap()).unwrap();
    assert!(verified.principal.is_none());
    assert!(verified.has_direct_session());
  }

  #[test]
  fn signed_token_with_broken_principal_is_malformed() {
    let codec = codec();
    let sign_raw = |custom: serde_json::Value| {
      let time_options = TimeOptions::new(Duration::zero(), Utc::now);
      let claims = Claims::new(custom).set_duration_and_issuance(&time_options, Duration::minutes(60));
      Hs256
        .token(&Header::empty(), &claims, &Hs256Key::new(b"test-signing-secret"))
        .unwrap()
    };

    let unknown_kind = sign_raw(serde_json::json!({ "sub": "x", "kind": "admin", "csrfToken": "a", "sessionCookie": "b" }));
    assert!(matches!(codec.verify(&unknown_kind), Err(AuthError::TokenMalformed)));

    let no_linked_flag = sign_raw(serde_json::json!({
      "sub": "x",
      "kind": "internal",
      "upstreamSession": { "csrfToken": "a" }
    }));
    assert!(matches!(codec.verify(&no_linked_flag), Err(AuthError::TokenMalformed)));
  }
}
