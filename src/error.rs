//! # Structured Error Handling
//!
//! Crate-level error type shared by configuration, startup, and the web
//! server boundary. Layer-specific errors (`StoreError`, `SpoolError`,
//! `AlertError`, `ApiError`) live with their layers and convert into this
//! type where they cross into crate-level flows.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorefrontError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Spool error: {0}")]
    Spool(String),

    #[error("Web server error: {0}")]
    Web(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
