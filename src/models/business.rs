//! # Business Model
//!
//! A tenant's business profile: the root entity products and generated
//! websites hang off. Owner scoping is part of every query - a business is
//! only ever visible to the tenant that created it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New business for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBusiness {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Business {
    pub async fn create(pool: &PgPool, new_business: NewBusiness) -> Result<Business, sqlx::Error> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (
                id, owner_id, name, description, industry, website,
                email, phone_number, city, country, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            RETURNING id, owner_id, name, description, industry, website,
                      email, phone_number, city, country, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_business.owner_id)
        .bind(&new_business.name)
        .bind(&new_business.description)
        .bind(&new_business.industry)
        .bind(&new_business.website)
        .bind(&new_business.email)
        .bind(&new_business.phone_number)
        .bind(&new_business.city)
        .bind(&new_business.country)
        .fetch_one(pool)
        .await?;

        Ok(business)
    }

    pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            r#"
            SELECT id, owner_id, name, description, industry, website,
                   email, phone_number, city, country, created_at, updated_at
            FROM businesses
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(
            r#"
            SELECT id, owner_id, name, description, industry, website,
                   email, phone_number, city, country, created_at, updated_at
            FROM businesses
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }
}
