use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use crate::error::BankError;
use crate::models::ErrorBody;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Bank(BankError),
}

impl From<BankError> for ApiError {
    fn from(e: BankError) -> Self {
        ApiError::Bank(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Bank(e) => {
                let status = match e {
                    BankError::NotFound(_) => StatusCode::NOT_FOUND,
                    BankError::Forbidden => StatusCode::FORBIDDEN,
                    BankError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.to_string())
            }
        };
        debug!("Request rejected with {}: {}", status, error);
        (status, Json(ErrorBody { error })).into_response()
    }
}
