//! # Product Handlers
//!
//! Product routes under a business, tenant-scoped through the owning
//! business and routed through the fallback executor like the business
//! handlers. A missing business is a domain 404, not a store failure, so
//! the primary branch reports it as a value rather than an error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::StoreError;
use crate::models::{Business, NewProduct, Product};
use crate::web::auth::OwnerIdentity;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;

/// Spool record kind for product snapshots.
pub const PRODUCT_KIND: &str = "product";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            business_id: product.business_id,
            name: product.name,
            description: product.description,
            price_cents: product.price_cents,
            sku: product.sku,
            in_stock: product.in_stock,
            created_at: product.created_at,
        }
    }
}

fn default_in_stock() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub degraded: bool,
    pub products: Vec<ProductDto>,
}

#[derive(Debug, Serialize)]
pub struct ProductCreatedResponse {
    pub degraded: bool,
    pub product: ProductDto,
}

/// List products for a business: GET /businesses/:business_id/products
///
/// Degraded mode serves the latest spooled product snapshot if it belongs
/// to the requested business; ownership of the business itself cannot be
/// verified offline, so the spool's owner partition is the trust boundary.
pub async fn list_products(
    State(state): State<AppState>,
    OwnerIdentity(owner_id): OwnerIdentity,
    Path(business_id): Path<Uuid>,
) -> ApiResult<Json<ProductListResponse>> {
    let pool = state.store.pool().clone();
    let spool = Arc::clone(&state.spool);

    let response = state
        .executor
        .execute_with_fallback(
            || async move {
                if Business::find_for_owner(&pool, business_id, owner_id)
                    .await
                    .map_err(StoreError::from)?
                    .is_none()
                {
                    return Ok(None);
                }

                let products = Product::list_for_business(&pool, business_id, owner_id)
                    .await
                    .map_err(StoreError::from)?;
                Ok(Some(ProductListResponse {
                    degraded: false,
                    products: products.into_iter().map(ProductDto::from).collect(),
                }))
            },
            || async move {
                let snapshot = spool
                    .read_latest(owner_id, PRODUCT_KIND)
                    .await
                    .map_err(|e| ApiError::fallback_failed(format!("spool read: {e}")))?;

                let products = match snapshot {
                    Some(payload) => {
                        let product: ProductDto = serde_json::from_value(payload)
                            .map_err(|e| ApiError::fallback_failed(format!("spool decode: {e}")))?;
                        if product.business_id == business_id {
                            vec![product]
                        } else {
                            Vec::new()
                        }
                    }
                    None => Vec::new(),
                };

                Ok(Some(ProductListResponse {
                    degraded: true,
                    products,
                }))
            },
        )
        .await?;

    response.map(Json).ok_or(ApiError::NotFound)
}

/// Create a product: POST /businesses/:business_id/products
///
/// Degraded mode spools the payload for replay and answers 202; the
/// business-ownership check is deferred to replay time.
pub async fn create_product(
    State(state): State<AppState>,
    OwnerIdentity(owner_id): OwnerIdentity,
    Path(business_id): Path<Uuid>,
    Json(request): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductCreatedResponse>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Product name is required"));
    }
    if request.price_cents < 0 {
        return Err(ApiError::bad_request("Product price must not be negative"));
    }

    let pool = state.store.pool().clone();
    let spool = Arc::clone(&state.spool);
    let new_product = NewProduct {
        business_id,
        name: request.name.clone(),
        description: request.description.clone(),
        price_cents: request.price_cents,
        sku: request.sku.clone(),
        in_stock: request.in_stock,
    };

    let response = state
        .executor
        .execute_with_fallback(
            || async move {
                if Business::find_for_owner(&pool, business_id, owner_id)
                    .await
                    .map_err(StoreError::from)?
                    .is_none()
                {
                    return Ok(None);
                }

                let product = Product::create(&pool, new_product)
                    .await
                    .map_err(StoreError::from)?;
                Ok(Some(ProductCreatedResponse {
                    degraded: false,
                    product: product.into(),
                }))
            },
            || async move {
                let product = ProductDto {
                    id: Uuid::new_v4(),
                    business_id,
                    name: request.name,
                    description: request.description,
                    price_cents: request.price_cents,
                    sku: request.sku,
                    in_stock: request.in_stock,
                    created_at: Utc::now(),
                };

                let payload = serde_json::to_value(&product)
                    .map_err(|e| ApiError::fallback_failed(format!("spool encode: {e}")))?;
                spool
                    .write(owner_id, PRODUCT_KIND, payload)
                    .await
                    .map_err(|e| ApiError::fallback_failed(format!("spool write: {e}")))?;

                Ok(Some(ProductCreatedResponse {
                    degraded: true,
                    product,
                }))
            },
        )
        .await?;

    let response = response.ok_or(ApiError::NotFound)?;
    let status = if response.degraded {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(response)))
}
