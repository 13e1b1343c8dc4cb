mod achievements;
mod characters;
mod fights;
mod system;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use fight_core::CoreError;
use hyper::StatusCode;
use serde_json::json;
use std::borrow::Borrow;

use crate::{domain::Error, infra::backend::Error as BackendError};

pub use achievements::*;
pub use characters::*;
pub use fights::*;
pub use system::*;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.borrow() {
            Error::NotFound(_) | Error::Backend(BackendError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            Error::BadRequest(_) | Error::Backend(BackendError::BadRequest(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Error::Unauthorized(_) | Error::Backend(BackendError::Unauthorized(_)) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            Error::Rejected(CoreError::VotingClosed | CoreError::BettingClosed) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            Error::Rejected(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Backend(e) if e.is_transient() => (
                StatusCode::SERVICE_UNAVAILABLE,
                String::from("service temporarily unavailable"),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("internal server error"),
            ),
        };
        let body = Json(json!({
            "error": error_message,
        }));
        (status, body).into_response()
    }
}
