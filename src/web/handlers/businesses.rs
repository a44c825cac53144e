//! # Business Handlers
//!
//! Tenant-scoped business CRUD routed through the fallback executor: the
//! primary branch talks to the database, the fallback branch serves from or
//! writes to the offline spool. Degraded responses are marked so clients
//! can tell best-effort data from confirmed data.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::StoreError;
use crate::models::{Business, NewBusiness};
use crate::web::auth::OwnerIdentity;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Spool record kind for business snapshots.
pub const BUSINESS_KIND: &str = "business";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Business> for BusinessDto {
    fn from(business: Business) -> Self {
        Self {
            id: business.id,
            name: business.name,
            description: business.description,
            industry: business.industry,
            website: business.website,
            email: business.email,
            phone_number: business.phone_number,
            city: business.city,
            country: business.country,
            created_at: business.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BusinessListResponse {
    pub degraded: bool,
    pub businesses: Vec<BusinessDto>,
}

#[derive(Debug, Serialize)]
pub struct BusinessCreatedResponse {
    pub degraded: bool,
    pub business: BusinessDto,
}

/// List businesses: GET /businesses
///
/// Degraded mode serves the latest spooled business snapshot for the owner,
/// which may be empty.
pub async fn list_businesses(
    State(state): State<AppState>,
    OwnerIdentity(owner_id): OwnerIdentity,
) -> ApiResult<Json<BusinessListResponse>> {
    let pool = state.store.pool().clone();
    let spool = Arc::clone(&state.spool);

    let response = state
        .executor
        .execute_with_fallback(
            || async move {
                let businesses = Business::list_for_owner(&pool, owner_id)
                    .await
                    .map_err(StoreError::from)?;
                Ok(BusinessListResponse {
                    degraded: false,
                    businesses: businesses.into_iter().map(BusinessDto::from).collect(),
                })
            },
            || async move {
                let snapshot = spool
                    .read_latest(owner_id, BUSINESS_KIND)
                    .await
                    .map_err(|e| ApiError::fallback_failed(format!("spool read: {e}")))?;

                let businesses = match snapshot {
                    Some(payload) => vec![serde_json::from_value(payload)
                        .map_err(|e| ApiError::fallback_failed(format!("spool decode: {e}")))?],
                    None => Vec::new(),
                };

                Ok(BusinessListResponse {
                    degraded: true,
                    businesses,
                })
            },
        )
        .await?;

    Ok(Json(response))
}

/// Create a business: POST /businesses
///
/// Degraded mode spools the payload for replay and answers 202 instead of
/// 201: the write is durable locally but not yet confirmed by the primary
/// store.
pub async fn create_business(
    State(state): State<AppState>,
    OwnerIdentity(owner_id): OwnerIdentity,
    Json(request): Json<CreateBusinessRequest>,
) -> ApiResult<(StatusCode, Json<BusinessCreatedResponse>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Business name is required"));
    }

    let pool = state.store.pool().clone();
    let spool = Arc::clone(&state.spool);
    let new_business = NewBusiness {
        owner_id,
        name: request.name.clone(),
        description: request.description.clone(),
        industry: request.industry.clone(),
        website: request.website.clone(),
        email: request.email.clone(),
        phone_number: request.phone_number.clone(),
        city: request.city.clone(),
        country: request.country.clone(),
    };

    let response = state
        .executor
        .execute_with_fallback(
            || async move {
                let business = Business::create(&pool, new_business)
                    .await
                    .map_err(StoreError::from)?;
                Ok(BusinessCreatedResponse {
                    degraded: false,
                    business: business.into(),
                })
            },
            || async move {
                let business = BusinessDto {
                    id: Uuid::new_v4(),
                    name: request.name,
                    description: request.description,
                    industry: request.industry,
                    website: request.website,
                    email: request.email,
                    phone_number: request.phone_number,
                    city: request.city,
                    country: request.country,
                    created_at: Utc::now(),
                };

                let payload = serde_json::to_value(&business)
                    .map_err(|e| ApiError::fallback_failed(format!("spool encode: {e}")))?;
                spool
                    .write(owner_id, BUSINESS_KIND, payload)
                    .await
                    .map_err(|e| ApiError::fallback_failed(format!("spool write: {e}")))?;

                Ok(BusinessCreatedResponse {
                    degraded: true,
                    business,
                })
            },
        )
        .await?;

    let status = if response.degraded {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(response)))
}
