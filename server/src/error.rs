use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use exrates_fx::FxError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub const FETCH_FAILED: &str = "Failed to fetch exchange rates";
pub const INVALID_CURRENCY: &str = "Invalid currency code";
pub const INVALID_AMOUNT: &str = "Invalid amount";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Fx(#[from] FxError),
    #[error("{0}")]
    BadRequest(&'static str),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

// Engine failures are answered with 200 and an error body, matching the
// public contract clients already parse.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Fx(e) if e.is_upstream() => {
                warn!(error = %e, "Exchange rates unavailable");
                (StatusCode::OK, FETCH_FAILED)
            }
            ApiError::Fx(e) => {
                warn!(error = %e, "Conversion rejected");
                (StatusCode::OK, INVALID_CURRENCY)
            }
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, *reason),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
