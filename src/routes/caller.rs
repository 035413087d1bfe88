use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::dao::models::Principal;

/// Header carrying the authenticated identity, set by the fronting identity provider.
pub const CALLER_HEADER: &str = "x-caller-principal";

/// Identity of the caller, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Principal>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Principal::new);
        Ok(Caller(principal))
    }
}
