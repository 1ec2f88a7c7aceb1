//! Cart commands.
//!
//! Every invocation hydrates the store from the configured storage directory,
//! runs a single operation and logs the resulting cart.
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL` - Catalog/stock service base URL
//! - `ROCKETSHOES_STORAGE_DIR` - Directory holding the persisted cart

use std::sync::Arc;

use rocketshoes_cart::{
    CartConfig, CartError, CartStore, CatalogError, FileStorage, HttpCatalog, TracingNotifier,
    UpdateProductAmount,
};
use rocketshoes_core::{Cart, ProductId};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The catalog client could not be built.
    #[error("Catalog client error: {0}")]
    Catalog(#[from] CatalogError),

    /// The cart operation was rejected.
    #[error("{}: {source}", .source.notification())]
    Cart {
        #[from]
        source: CartError,
    },
}

/// Build a store backed by the HTTP catalog and file storage.
pub fn open(config: &CartConfig) -> Result<CartStore, CommandError> {
    let catalog = HttpCatalog::new(&config.api)?;
    let storage = FileStorage::new(&config.storage_dir);

    tracing::debug!(
        api = %config.api.base_url,
        storage = %storage.dir().display(),
        "Opening cart"
    );

    Ok(CartStore::load(
        Arc::new(catalog),
        Arc::new(storage),
        Arc::new(TracingNotifier),
    ))
}

/// Log the current cart.
pub fn show(store: &CartStore) {
    log_cart(&store.cart());
}

/// Add one unit of `id`.
pub async fn add(store: &CartStore, id: ProductId) -> Result<(), CommandError> {
    let cart = store.add_product(id).await?;
    log_cart(&cart);
    Ok(())
}

/// Remove `id` from the cart.
pub async fn remove(store: &CartStore, id: ProductId) -> Result<(), CommandError> {
    let cart = store.remove_product(id).await?;
    log_cart(&cart);
    Ok(())
}

/// Set the amount of `id`.
pub async fn update(store: &CartStore, id: ProductId, amount: i64) -> Result<(), CommandError> {
    let cart = store
        .update_product_amount(UpdateProductAmount {
            product_id: id,
            amount,
        })
        .await?;
    log_cart(&cart);
    Ok(())
}

fn log_cart(cart: &Cart) {
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for item in cart {
        tracing::info!(
            id = %item.id(),
            title = %item.product.title,
            price = %item.product.price,
            amount = item.amount,
            subtotal = %item.subtotal(),
            "Line item"
        );
    }
    tracing::info!(
        lines = cart.len(),
        items = cart.item_count(),
        subtotal = %cart.subtotal(),
        "Cart total"
    );
}
