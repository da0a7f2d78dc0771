use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    Unauthorized(String),
    StorageFailure(sqlx::Error),
    InternalServerError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::StorageFailure(err) => write!(f, "Storage Failure: {}", err),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the log, not in the response body
        let message = match self {
            ApiError::StorageFailure(err) => {
                log::error!("Storage failure: {}", err);
                "Storage Failure: the operation could not be completed".to_string()
            }
            other => other.to_string(),
        };
        let error_response = ErrorResponse {
            success: false,
            message,
        };

        match self {
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::Forbidden(_) => HttpResponse::Forbidden().json(error_response),
            ApiError::Conflict(_) => HttpResponse::Conflict().json(error_response),
            ApiError::Unauthorized(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::StorageFailure(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return ApiError::Conflict(db_err.message().to_string());
            }
            if db_err.is_check_violation() {
                return ApiError::ValidationError(db_err.message().to_string());
            }
        }
        ApiError::StorageFailure(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl ApiError {
    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(format!("{} not found", entity))
    }

    pub fn forbidden(reason: &str) -> Self {
        ApiError::Forbidden(reason.to_string())
    }

    pub fn validation(message: &str) -> Self {
        ApiError::ValidationError(message.to_string())
    }

    pub fn chemical_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Chemical with ID '{}' not found", id))
    }

    pub fn experiment_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Experiment with ID '{}' not found", id))
    }

    pub fn protocol_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Safety protocol with ID '{}' not found", id))
    }

    pub fn user_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("User with ID '{}' not found", id))
    }

    pub fn username_taken(username: &str) -> Self {
        ApiError::Conflict(format!("Username '{}' already exists", username))
    }

    pub fn email_taken(email: &str) -> Self {
        ApiError::Conflict(format!("Email '{}' already exists", email))
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid username or password".to_string())
    }
}
