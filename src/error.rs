use axum::{ Json, http::StatusCode, response::{ IntoResponse, Response } };
use thiserror::Error;

use crate::models::envelope::ErrorEnvelope;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures of a proxied call, each mapped to a status and a distinct `error` label.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream unreachable: {0}")]
    UpstreamUnavailable(String),

    #[error("Bad gateway: {message}")]
    BadGateway {
        message: String,
        details: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        details: String,
    },
}

impl GatewayError {
    pub fn internal(details: impl ToString) -> Self {
        GatewayError::Internal {
            message: "Failed to process request".into(),
            details: details.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            GatewayError::BadRequest(details) =>
                ErrorEnvelope::new("Bad Request", "Request body must be valid JSON")
                    .with_details(details.as_str()),
            GatewayError::UpstreamUnavailable(details) =>
                ErrorEnvelope::new("Service Unavailable", "Failed to reach API server")
                    .with_details(details.as_str()),
            GatewayError::BadGateway { message, details } =>
                ErrorEnvelope::new("Bad Gateway", message.as_str())
                    .with_details(details.as_str()),
            GatewayError::Internal { message, details } =>
                ErrorEnvelope::new("Internal Server Error", message.as_str())
                    .with_details(details.as_str()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}
