use async_trait::async_trait;
use knockgate_domain::DomainError;

/// Application-layer port for password verification (C13).
///
/// The implementation lives in the infrastructure layer (bcrypt) and is
/// injected at wiring time. Never logs the password or the hash; a `false`
/// result and an `Err` are both treated as "deny" by callers, but only
/// `Err` is logged server-side.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}
