use thiserror::Error;

/// Every error the core can produce, mapped 1:1 to a stable wire code by
/// [`DomainError::code`]. Handlers never format a `Debug` representation of
/// an internal failure back to the caller — only this code plus `message`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("resource limit reached: {0}")]
    ResourceLimit(String),

    #[error("circuit open for {0}")]
    CircuitOpen(String),

    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable, machine-readable code for the HTTP/DTO layer. Never changes
    /// shape even if the human-readable message does.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::Unauthorized => "UNAUTHORIZED",
            DomainError::Forbidden(_) => "FORBIDDEN",
            DomainError::RateLimited { .. } => "RATE_LIMITED",
            DomainError::ResourceLimit(_) => "RESOURCE_LIMIT",
            DomainError::CircuitOpen(_) => "CIRCUIT_OPEN",
            DomainError::BadGateway(_) => "BAD_GATEWAY",
            DomainError::Timeout(_) => "TIMEOUT",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}
