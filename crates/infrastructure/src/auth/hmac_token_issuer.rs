use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use knockgate_application::ports::SessionTokenIssuer;
use knockgate_domain::{DomainError, Session, SessionId};
use ring::hmac;

/// Opaque session tokens signed with HMAC-SHA256 (C14). Chosen over JWT:
/// the gateway only ever needs to round-trip a session id to itself, so a
/// signed opaque blob avoids pulling in a JWT library and its header/claims
/// surface for a single claim (see DESIGN.md "HMAC vs JWT").
///
/// Wire format: `base64url(payload) + "." + base64url(signature)`, where
/// `payload` is `{session_id}.{expires_at_unix_secs}` as UTF-8.
pub struct HmacTokenIssuer {
    key: hmac::Key,
}

impl HmacTokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret),
        }
    }
}

impl SessionTokenIssuer for HmacTokenIssuer {
    fn issue(&self, session: &Session) -> Result<String, DomainError> {
        let payload = format!("{}.{}", session.session_id, session.expires_at.timestamp());
        let signature = hmac::sign(&self.key, payload.as_bytes());
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        ))
    }

    fn verify(&self, token: &str) -> Option<SessionId> {
        let (payload_b64, sig_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;

        hmac::verify(&self.key, &payload, &signature).ok()?;

        let payload = String::from_utf8(payload).ok()?;
        let (session_id, expires_at) = payload.split_once('.')?;
        let expires_at: i64 = expires_at.parse().ok()?;
        if expires_at <= chrono::Utc::now().timestamp() {
            return None;
        }
        session_id.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knockgate_domain::Session;

    fn sample_session() -> Session {
        Session::new(
            "user-1".into(),
            "alice".into(),
            "192.0.2.10".parse().unwrap(),
            vec!["svc-a".into()],
            false,
            std::time::Duration::from_secs(3600),
            false,
            None,
        )
    }

    #[test]
    fn issued_token_verifies_to_same_session_id() {
        let issuer = HmacTokenIssuer::new(b"test-secret");
        let session = sample_session();
        let token = issuer.issue(&session).unwrap();
        assert_eq!(issuer.verify(&token), Some(session.session_id));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let issuer = HmacTokenIssuer::new(b"test-secret");
        let session = sample_session();
        let token = issuer.issue(&session).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(issuer.verify(&tampered), None);
    }

    #[test]
    fn token_from_different_key_is_rejected() {
        let issuer_a = HmacTokenIssuer::new(b"secret-a");
        let issuer_b = HmacTokenIssuer::new(b"secret-b");
        let session = sample_session();
        let token = issuer_a.issue(&session).unwrap();
        assert_eq!(issuer_b.verify(&token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = HmacTokenIssuer::new(b"test-secret");
        let mut session = sample_session();
        session.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
        let token = issuer.issue(&session).unwrap();
        assert_eq!(issuer.verify(&token), None);
    }
}
