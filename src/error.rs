use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Configuration(String),
    InvalidInput(String),
    SizeLimitExceeded(String),
    Decode(String),
    EmptyInput(String),
    MalformedCsv(String),
    MalformedJson(String),
    ColumnNotFound(String),
    NoModelAvailable(String),
    EmbeddingFailed(String),
    GenerationFailed(String),
    SafetyBlocked(String),
    StructuredParse(String),
    Http(String),
    Io(std::io::Error),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::SizeLimitExceeded(msg) => write!(f, "File too large: {}", msg),
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            AppError::MalformedCsv(msg) => write!(f, "Malformed CSV: {}", msg),
            AppError::MalformedJson(msg) => write!(f, "Malformed JSON: {}", msg),
            AppError::ColumnNotFound(msg) => write!(f, "Column not found: {}", msg),
            AppError::NoModelAvailable(msg) => write!(f, "No model available: {}", msg),
            AppError::EmbeddingFailed(msg) => write!(f, "Embedding failed: {}", msg),
            AppError::GenerationFailed(msg) => write!(f, "Generation failed: {}", msg),
            AppError::SafetyBlocked(msg) => write!(f, "Blocked by safety policy: {}", msg),
            AppError::StructuredParse(msg) => write!(f, "Structured response error: {}", msg),
            AppError::Http(msg) => write!(f, "HTTP error: {}", msg),
            AppError::Io(err) => write!(f, "IO error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<polars::prelude::PolarsError> for AppError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match self {
            AppError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::SizeLimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::EmptyInput(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedCsv(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedJson(_) => StatusCode::BAD_REQUEST,
            AppError::ColumnNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoModelAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EmbeddingFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GenerationFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SafetyBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StructuredParse(_) => StatusCode::BAD_GATEWAY,
            AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
