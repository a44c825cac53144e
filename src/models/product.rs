//! # Product Model
//!
//! Catalog entries under a business. Prices are stored as integer cents.
//! Tenant scoping goes through the owning business - product queries join
//! against `businesses.owner_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: Option<String>,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New product for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub sku: Option<String>,
    pub in_stock: bool,
}

impl Product {
    pub async fn create(pool: &PgPool, new_product: NewProduct) -> Result<Product, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                id, business_id, name, description, price_cents, sku,
                in_stock, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING id, business_id, name, description, price_cents, sku,
                      in_stock, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_product.business_id)
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price_cents)
        .bind(&new_product.sku)
        .bind(new_product.in_stock)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    /// Products under a business, newest first, scoped to the owning tenant.
    pub async fn list_for_business(
        pool: &PgPool,
        business_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.business_id, p.name, p.description, p.price_cents, p.sku,
                   p.in_stock, p.created_at, p.updated_at
            FROM products p
            JOIN businesses b ON b.id = p.business_id
            WHERE p.business_id = $1 AND b.owner_id = $2
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}
