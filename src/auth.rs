//! Caller identity.
//!
//! Sign-in is handled by the hosted auth provider; its edge middleware
//! forwards the verified user as `x-user-*` headers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::StorefrontError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts.headers.get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let id = header(USER_ID_HEADER).ok_or(StorefrontError::Unauthorized)?;
        Ok(Self { id, email: header(USER_EMAIL_HEADER), name: header(USER_NAME_HEADER) })
    }
}
