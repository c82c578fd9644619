//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use callbridge_auth::AuthError;
use callbridge_events::{EventSchemaError, VoiceAnswerError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// An RTC event did not match the schema of its type.
    #[error("{message}")]
    SchemaValidation {
        event_type: Option<String>,
        message: String,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("token unavailable: {0}")]
    TokenUnavailable(#[from] AuthError),
}

/// JSON body returned for every gateway error.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::SchemaValidation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadRequest(_) | GatewayError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            GatewayError::TokenUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::SchemaValidation { .. } => "SCHEMA_VALIDATION",
            GatewayError::BadRequest(_) => "BAD_REQUEST",
            GatewayError::InvalidJson(_) => "INVALID_JSON",
            GatewayError::TokenUnavailable(_) => "TOKEN_UNAVAILABLE",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            event_type: match self {
                GatewayError::SchemaValidation { event_type, .. } => event_type,
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<EventSchemaError> for GatewayError {
    fn from(error: EventSchemaError) -> Self {
        GatewayError::SchemaValidation {
            event_type: error.event_type().map(str::to_string),
            message: error.to_string(),
        }
    }
}

impl From<VoiceAnswerError> for GatewayError {
    fn from(error: VoiceAnswerError) -> Self {
        GatewayError::BadRequest(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidJson(error.to_string())
    }
}
