use knockgate_domain::{DomainError, Session, SessionId};

/// Application-layer port for opaque session-token issuance and
/// verification (C14). The default implementation is HMAC-SHA256-signed,
/// not JWT — see DESIGN.md.
pub trait SessionTokenIssuer: Send + Sync {
    fn issue(&self, session: &Session) -> Result<String, DomainError>;

    /// Returns the session id encoded in `token` if the signature and
    /// expiry both check out.
    fn verify(&self, token: &str) -> Option<SessionId>;
}
