//! Caller identity.
//!
//! Authentication happens upstream; this service trusts the `x-user-id`
//! header as given and only uses it to scope carts.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shopfloor_core::validation::validate_id;

use crate::error::ApiError;

/// Header carrying the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling user. Rejects with 401 when the header is missing.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

/// The calling user, if the request named one.
#[derive(Debug, Clone)]
pub struct MaybeUserId(pub Option<String>);

fn header_user(parts: &Parts) -> Result<Option<String>, ApiError> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let value = raw
        .to_str()
        .map_err(|_| ApiError::bad_request("x-user-id must be visible ASCII"))?
        .trim();
    validate_id(USER_ID_HEADER, value)?;
    Ok(Some(value.to_string()))
}

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header_user(parts)? {
            Some(user) => Ok(UserId(user)),
            None => {
                tracing::debug!(uri = %parts.uri, "Request without x-user-id");
                Err(ApiError::unauthenticated("Missing x-user-id header"))
            }
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUserId(header_user(parts)?))
    }
}
