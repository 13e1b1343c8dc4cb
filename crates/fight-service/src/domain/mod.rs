mod achievements;
mod characters;
mod fights;
#[cfg(test)]
pub(crate) mod mocks;

pub use achievements::*;
pub use characters::*;
pub use fights::*;
use fight_core::CoreError;
use thiserror::Error;

use crate::infra::backend::Error as BackendError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("authentication required: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Rejected(#[from] CoreError),
    #[error("{0}")]
    Backend(#[from] BackendError),
    #[error("background thread died: {0}")]
    Thread(String),
}

/// Who is calling: the bearer token is passed through to the backend, the user
/// id only feeds achievement progress
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_id: Some(user_id.into()),
        }
    }
}
