//! HTTP rendering of [`AppError`].

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use cb_core::AppError;
use cb_ui::ErrorTemplate;
use log::{debug, error};
use thiserror::Error;

const SERVER_FAULT_MESSAGE: &str = "Something went wrong on our side. Please try again later.";

/// Handler error wrapper; `?` converts any [`AppError`] into it.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ApiError {
    fn public_message(&self) -> String {
        if self.0.is_server_fault() {
            SERVER_FAULT_MESSAGE.to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(_, _) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::NotDeletable(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::StorageFailure(_)
            | AppError::UploadFailure(_)
            | AppError::Timeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.0.is_server_fault() {
            error!("request failed: {}", self.0);
        } else {
            debug!("request rejected: {}", self.0);
        }

        let message = self.public_message();
        let page = ErrorTemplate {
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            message: &message,
        };
        let body = page.render().unwrap_or_else(|_| message.clone());

        HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(body)
    }
}
