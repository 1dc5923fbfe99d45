use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use knockgate_domain::DomainError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

/// Newtype so `DomainError` can implement `IntoResponse` without
/// `knockgate-domain` taking an axum dependency of its own.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            DomainError::ResourceLimit(_) => StatusCode::CONFLICT,
            DomainError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            DomainError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            code: self.0.code(),
            message: self.0.to_string(),
        });

        let mut response = (status, body).into_response();
        if let DomainError::RateLimited { retry_after_secs } = &self.0 {
            if let Ok(value) = header::HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
