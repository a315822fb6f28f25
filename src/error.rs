use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::repo::RepoError;

/// Request-level failures, rendered as the JSON body clients show as a toast.
#[derive(Debug, Display)]
pub enum AppError {
    /// Blocked locally; nothing was written.
    #[display(fmt = "{}: {}", title, description)]
    Validation { title: String, description: String },

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl AppError {
    pub fn validation(title: impl Into<String>, description: impl Into<String>) -> Self {
        AppError::Validation {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { title, description } => json!({
                "message": title,
                "description": description,
            }),
            AppError::Unauthorized(message) => json!({
                "message": message,
                "redirect": "/login",
            }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(what) => AppError::Conflict(what),
            RepoError::Backend(cause) => {
                tracing::error!(error = %cause, "Storage call failed");
                AppError::Internal
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn validation_errors_carry_title_and_description() {
        let err = AppError::validation("Invalid Dates", "Start date cannot be after end date.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Invalid Dates");
        assert_eq!(value["description"], "Start date cannot be after end date.");
    }

    #[test]
    fn duplicate_rows_surface_as_conflicts() {
        let err: AppError = RepoError::Duplicate("Already checked in today".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Already checked in today");
    }
}
