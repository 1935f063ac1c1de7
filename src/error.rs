use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Form and upload problems the user can fix themselves.
///
/// The `Display` text of each variant is the exact message shown to the
/// user as a flash message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Passwords do not match!")]
    PasswordMismatch,

    #[error("No file part")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    #[error("File type not allowed: {0}")]
    UnsupportedExtension(String),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Template syntax error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Could not persist file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(ref e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            AppError::Multipart(ref e) => (e.status(), e.body_text()).into_response(),
            ref other => {
                log::error!("{}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_flash_text() {
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match!"
        );
        assert_eq!(ValidationError::MissingFile.to_string(), "No file part");
        assert_eq!(ValidationError::EmptyFilename.to_string(), "No selected file");
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let response = AppError::from(ValidationError::EmptyFilename).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_errors_map_to_500() {
        let response = AppError::Chart("backend gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
