//! External product catalog and stock service.
//!
//! # Architecture
//!
//! - The catalog is the source of truth for product records and stock
//! - [`CatalogService`] is the seam the cart store depends on
//! - [`HttpCatalog`] talks to the REST API (`products/{id}`, `stock/{id}`)
//! - Products are cached in-memory via `moka`; stock never is
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::catalog::{CatalogService, HttpCatalog};
//!
//! let catalog = HttpCatalog::new(&config.api)?;
//! let stock = catalog.stock(ProductId::new(1)).await?;
//! let product = catalog.product(ProductId::new(1)).await?;
//! ```

mod http;

pub use http::HttpCatalog;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, StockRecord};
use thiserror::Error;

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service answered with a record for a different product.
    #[error("Unexpected record: requested {requested}, received {received}")]
    UnexpectedRecord {
        requested: ProductId,
        received: ProductId,
    },

    /// Client could not be built from its configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Read access to product records and authoritative stock.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Available stock for a product.
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError>;

    /// The catalog record for a product.
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;
}
