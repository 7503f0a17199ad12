use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};

use crate::service::{ErrorEnvelope, ServiceError};

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::BAD_REQUEST,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorEnvelope::from(self))
    }
}

/// Undecodable bodies are reported with the same envelope as any other validation error.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!("Rejected request body: {}", err);

    ServiceError::Validation(err.to_string()).into()
}
