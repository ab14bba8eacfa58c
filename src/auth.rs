//! Request identity extractor.
//!
//! Authentication itself lives in front of this service (the SMS-code
//! login flow owns the `users` and `sms_code_records` tables). The
//! contract here is narrow: the upstream middleware resolves the caller
//! and injects a trusted `x-user-id` header carrying the user's UUID.
//! Every todo handler requires this extractor; AI routes do not.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header set by the upstream auth middleware.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The resolved identity of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let id = Uuid::parse_str(raw).map_err(|_| {
            tracing::warn!(header = raw, "Rejecting request with malformed user id");
            ApiError::Unauthorized
        })?;
        Ok(CurrentUser { id })
    }
}
