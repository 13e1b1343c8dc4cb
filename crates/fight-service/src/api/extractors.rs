use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use hyper::header::AUTHORIZATION;
use log::debug;
use serde::de::DeserializeOwned;

use crate::domain::{Caller, Error};

/// Header carrying the id achievement progress is booked against
pub const USER_ID_HEADER: &str = "x-user-id";

/// Reads the caller from `Authorization: Bearer <token>` and `X-User-Id`.
///
/// Both are optional; routes that need a signed in user check the token
/// themselves. A present but malformed authorization header is rejected.
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| Error::Unauthorized(String::from("unreadable authorization header")))?;
                let token = value
                    .strip_prefix("Bearer ")
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| {
                        Error::Unauthorized(String::from("expected a bearer token"))
                    })?;
                Some(token.to_owned())
            }
        };

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        debug!(
            "caller: token {}, user {:?}",
            if token.is_some() { "present" } else { "absent" },
            user_id
        );
        Ok(Caller { token, user_id })
    }
}

/// `Json` body whose rejections come back in the service's own error shape
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(body)| JsonBody(body))
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))
    }
}
