//! Outcomes of failed cart operations.
//!
//! Every failure is one of three kinds. All of them are non-fatal: the cart
//! is left untouched and the user is shown [`CartError::notification`].

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Message shown when the stock cannot cover a request.
pub const STOCK_EXCEEDED_MESSAGE: &str = "Requested quantity is out of stock";

/// The cart operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl CartOperation {
    /// User-facing message for a failure of this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add product",
            Self::Remove => "Failed to remove product",
            Self::UpdateAmount => "Failed to update product amount",
        }
    }
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::UpdateAmount => write!(f, "update_amount"),
        }
    }
}

/// Why a cart operation left the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity is more than the stock holds.
    #[error("requested {requested} of product {product_id} but only {available} in stock")]
    StockExceeded {
        product_id: ProductId,
        requested: u64,
        available: i64,
    },

    /// The request itself is invalid: non-positive amount or unknown line item.
    #[error("invalid {operation} request for product {product_id}: {reason}")]
    InvalidRequest {
        operation: CartOperation,
        product_id: ProductId,
        reason: String,
    },

    /// The catalog or stock service could not be reached or understood.
    #[error("{operation} failed: {source}")]
    ExternalFailure {
        operation: CartOperation,
        #[source]
        source: CatalogError,
    },
}

impl CartError {
    /// Text of the notification shown for this error.
    #[must_use]
    pub const fn notification(&self) -> &'static str {
        match self {
            Self::StockExceeded { .. } => STOCK_EXCEEDED_MESSAGE,
            Self::InvalidRequest { operation, .. } | Self::ExternalFailure { operation, .. } => {
                operation.failure_message()
            }
        }
    }

    pub(crate) fn invalid(
        operation: CartOperation,
        product_id: ProductId,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            operation,
            product_id,
            reason: reason.into(),
        }
    }

    pub(crate) const fn external(operation: CartOperation, source: CatalogError) -> Self {
        Self::ExternalFailure { operation, source }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
