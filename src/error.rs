use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use axum::extract::rejection::{BytesRejection, JsonRejection};

use crate::gateways::GatewayError;
use crate::webhooks::normalizer::NormalizeError;
use crate::webhooks::signature::SignatureError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("gateway error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. } | ApiError::Conflict { code, .. } => code,
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Upstream { .. } => "GATEWAY_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub error_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Internal failure detail carried on the response for the non-production
/// `attach_error_details` middleware. Never serialized by default.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let (message, detail) = match &self {
            ApiError::Internal(e) => {
                tracing::error!(%error_id, error = %format!("{e:#}"), "request failed");
                ("internal server error".to_string(), Some(format!("{e:?}")))
            }
            ApiError::Upstream { message, .. } => {
                tracing::warn!(%error_id, %status, %message, "gateway call failed");
                (message.clone(), None)
            }
            other => {
                tracing::debug!(%error_id, %status, error = %other, "request rejected");
                (other.to_string(), None)
            }
        };

        let body = ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message,
                error_id,
                details: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

impl From<SignatureError> for ApiError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::MissingHeader(_) => ApiError::bad_request("MISSING_SIGNATURE", e.to_string()),
            SignatureError::MissingSecret | SignatureError::Mismatch => {
                ApiError::Unauthorized(e.to_string())
            }
        }
    }
}

impl From<NormalizeError> for ApiError {
    fn from(e: NormalizeError) -> Self {
        ApiError::bad_request("INVALID_PAYLOAD", e.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        let status = match &e {
            // vendor 401/403 means our credentials are wrong, not the caller's request
            GatewayError::Api { status, .. } if (400..500).contains(status) && *status != 401 && *status != 403 => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        ApiError::Upstream {
            status,
            message: e.vendor_message(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::bad_request("INVALID_BODY", rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::bad_request("INVALID_BODY", rejection.body_text())
    }
}
