use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::identity::Identity;
use crate::session::SessionKey;

/// Header the upstream auth gateway sets after authenticating the caller.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Optional client-chosen key that separates dashboard sessions of one user.
pub const SESSION_HEADER: &str = "x-dashboard-session";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        Ok(Identity::new(user_id))
    }
}

// The session header is namespaced by the caller, so it cannot reach another user's session.
impl<S: Send + Sync> FromRequestParts<S> for SessionKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let owner = Identity::from_request_parts(parts, state).await?;
        let session = header_value(parts, SESSION_HEADER).map(str::to_string);
        Ok(SessionKey::new(owner, session))
    }
}
