use async_trait::async_trait;
use knockgate_application::ports::CredentialVerifier;
use knockgate_domain::DomainError;

/// Verifies portal-user passwords against the bcrypt hashes stored in
/// `PortalUserAccount::bcrypt_hashed_password`. `bcrypt::verify` is
/// CPU-bound, so it runs on the blocking pool rather than the async
/// reactor thread.
pub struct BcryptCredentialVerifier;

impl BcryptCredentialVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BcryptCredentialVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for BcryptCredentialVerifier {
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
            .await
            .map_err(|e| DomainError::Internal(format!("bcrypt task panicked: {e}")))?
            .map_err(|e| DomainError::Internal(format!("bcrypt verify failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_matching_password() {
        let hash = bcrypt::hash("correct horse", bcrypt::DEFAULT_COST).unwrap();
        let verifier = BcryptCredentialVerifier::new();
        assert!(verifier.verify("correct horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let hash = bcrypt::hash("correct horse", bcrypt::DEFAULT_COST).unwrap();
        let verifier = BcryptCredentialVerifier::new();
        assert!(!verifier.verify("battery staple", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error_not_a_panic() {
        let verifier = BcryptCredentialVerifier::new();
        assert!(verifier.verify("anything", "not-a-hash").await.is_err());
    }
}
