//! # Schema Bootstrap
//!
//! Creates the tables the web surface and the spool replay need. Invoked at
//! startup; failure is tolerated so the process can boot in offline mode.

use sqlx::PgPool;
use tracing::info;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS businesses (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        industry TEXT,
        website TEXT,
        email TEXT,
        phone_number TEXT,
        city TEXT,
        country TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_businesses_owner_id ON businesses (owner_id)",
    "CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        business_id UUID NOT NULL REFERENCES businesses (id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        price_cents BIGINT NOT NULL DEFAULT 0,
        sku TEXT,
        in_stock BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_products_business_id ON products (business_id)",
    "CREATE TABLE IF NOT EXISTS offline_replays (
        id BIGSERIAL PRIMARY KEY,
        owner_id UUID NOT NULL,
        kind TEXT NOT NULL,
        payload JSONB NOT NULL,
        record_created_at TIMESTAMPTZ NOT NULL,
        replayed_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_offline_replays_owner_id ON offline_replays (owner_id)",
];

/// Ensure every table the surface needs exists.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(tables = 3, "Database schema ready");
    Ok(())
}
