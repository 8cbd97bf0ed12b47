use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mongodb::bson;

/// Error type shared by the model layer and the HTTP handlers.
///
/// The `Display` output is the UPPER_SNAKE_CASE code written to the
/// response body, e.g. `SITE_NOT_FOUND` or `INVALID_DATE_RANGE`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}_NOT_FOUND")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}_ALREADY_EXIST")]
    Conflict(&'static str),

    #[error("UNAUTHORIZED")]
    Unauthorized,

    #[error("FORBIDDEN")]
    Forbidden,

    #[error("DATABASE_UNAVAILABLE")]
    DatabaseUnavailable,

    #[error("DATABASE_ERROR")]
    Database(#[from] mongodb::error::Error),

    #[error("SERIALIZATION_FAILED")]
    Serialization(#[from] bson::ser::Error),

    #[error("DESERIALIZATION_FAILED")]
    Deserialization(#[from] bson::de::Error),

    #[error("FILE_OPERATION_FAILED")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Deserialization(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Database(error) => tracing::error!(%error, "database operation failed"),
            AppError::Serialization(error) => tracing::error!(%error, "bson serialization failed"),
            AppError::Deserialization(error) => {
                tracing::error!(%error, "bson deserialization failed")
            }
            AppError::Io(error) => tracing::error!(%error, "file operation failed"),
            _ => (),
        }
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn codes_follow_entity_names() {
        assert_eq!(AppError::NotFound("SITE").to_string(), "SITE_NOT_FOUND");
        assert_eq!(
            AppError::Conflict("SUPPLY").to_string(),
            "SUPPLY_ALREADY_EXIST"
        );
        assert_eq!(
            AppError::Validation("INVALID_DATE_RANGE").to_string(),
            "INVALID_DATE_RANGE"
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::NotFound("SITE").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Io(std::io::Error::other("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let response = AppError::Io(std::io::Error::other("disk is full")).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, "FILE_OPERATION_FAILED");
    }
}
