// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::message::ErrorResponse;
use crate::services::generator::GenerationError;

const SERVICE_UNAVAILABLE: &str = "The reply service is temporarily unavailable";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request body: {0}")]
    Validation(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Generation(e) => e.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Credential trouble is an operator problem; callers get a generic line.
            AppError::Generation(GenerationError::Auth(_)) => {
                error!(error = %self, "generation credential problem");
                SERVICE_UNAVAILABLE.to_string()
            }
            AppError::Generation(e) => {
                error!(error = %e, "generation failed");
                e.to_string()
            }
            AppError::Validation(_) => {
                warn!(error = %self, "rejected reply request");
                self.to_string()
            }
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}
