//! # Owner Identity Extraction
//!
//! Tenant identity arrives as an opaque `x-owner-id` header placed there by
//! the authenticating gateway in front of this service. Token validation and
//! issuance are that gateway's concern, not this crate's.

use crate::web::errors::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Extractor for the tenant/owner identifier on every scoped route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let owner_id = Uuid::parse_str(raw)
            .map_err(|_| ApiError::bad_request(format!("Invalid owner identifier: {raw}")))?;

        Ok(OwnerIdentity(owner_id))
    }
}
