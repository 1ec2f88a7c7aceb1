//! The cart store.
//!
//! [`CartStore`] owns the session's [`Cart`], exposes the three mutating
//! operations and mirrors every committed cart to durable storage.
//!
//! # Consistency
//!
//! Mutations are serialized through a single writer lock held for the whole
//! operation, including the catalog round trips. The working copy of the cart
//! is taken after the lock is acquired, so two operations issued back to back
//! always see each other's effects.
//!
//! # Persistence
//!
//! The cart is stored as JSON under [`CART_STORAGE_KEY`]. It is read once in
//! [`CartStore::load`] and rewritten after every commit. The hydrated cart
//! itself is never written back.

use std::sync::Arc;

use rocketshoes_core::{Cart, CartLineItem, ProductId};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use crate::catalog::CatalogService;
use crate::error::{CartError, CartOperation, Result};
use crate::notify::Notifier;
use crate::storage::CartStorage;

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Arguments of [`CartStore::update_product_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Requested amount; anything below 1 is rejected.
    pub amount: i64,
}

/// Shared cart state for one shopping session.
///
/// Cheaply cloneable via `Arc`; clones operate on the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    catalog: Arc<dyn CatalogService>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<Cart>,
    writer: Mutex<Persister>,
}

/// Mirrors observed carts to storage, skipping the hydrated one.
struct Persister {
    storage: Arc<dyn CartStorage>,
    just_loaded: bool,
}

impl Persister {
    const fn new(storage: Arc<dyn CartStorage>) -> Self {
        Self {
            storage,
            just_loaded: true,
        }
    }

    /// Write `cart` unless it is the first state observed since hydration.
    ///
    /// Failures are logged and swallowed.
    fn sync(&mut self, cart: &Cart) {
        if self.just_loaded {
            self.just_loaded = false;
            debug!("Skipping write of freshly hydrated cart");
            return;
        }

        let json = match serde_json::to_string(cart) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(CART_STORAGE_KEY, &json) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

impl CartStore {
    /// Create a store hydrated from `storage`.
    ///
    /// A missing value yields an empty cart. So does an unreadable one, after
    /// logging a warning; the next commit overwrites it.
    pub fn load(
        catalog: Arc<dyn CatalogService>,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cart = hydrate(storage.as_ref());

        let mut persister = Persister::new(storage);
        persister.sync(&cart);

        let (state, _) = watch::channel(cart);

        Self {
            inner: Arc::new(CartStoreInner {
                catalog,
                notifier,
                state,
                writer: Mutex::new(persister),
            }),
        }
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().clone()
    }

    /// Observe the cart. The receiver holds the current value and is woken on
    /// every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.state.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// Increments the line item in place when present, otherwise fetches the
    /// product and appends it with an amount of 1. The new amount must be
    /// covered by the product's stock.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if the stock cannot cover one more unit
    /// - [`CartError::ExternalFailure`] if the stock or product lookup fails
    ///
    /// The cart is unchanged and a notification has been emitted in every case.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<Cart> {
        let mut writer = self.inner.writer.lock().await;
        let outcome = self.prepare_add(product_id).await;
        self.settle(&mut writer, outcome)
    }

    /// Remove a product's line item.
    ///
    /// Makes no external call; it only waits for in-flight mutations.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidRequest`] if the product is not in the cart.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> Result<Cart> {
        let mut writer = self.inner.writer.lock().await;

        let mut cart = self.cart();
        let outcome = cart
            .remove(product_id)
            .map(|_| cart)
            .map_err(|e| CartError::invalid(CartOperation::Remove, product_id, e.to_string()));

        self.settle(&mut writer, outcome)
    }

    /// Set a line item's amount.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidRequest`] if the amount is below 1 (the stock
    ///   service is not contacted), the product is not in the cart, or a
    ///   stock-approved amount does not fit a line item
    /// - [`CartError::StockExceeded`] if the stock cannot cover the amount
    /// - [`CartError::ExternalFailure`] if the stock lookup fails
    #[instrument(skip_all, fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_product_amount(&self, request: UpdateProductAmount) -> Result<Cart> {
        let UpdateProductAmount { product_id, amount } = request;

        let requested = match u64::try_from(amount) {
            Ok(requested) if requested > 0 => requested,
            _ => {
                return Err(self.reject(CartError::invalid(
                    CartOperation::UpdateAmount,
                    product_id,
                    "amount must be at least 1",
                )));
            }
        };

        let mut writer = self.inner.writer.lock().await;
        let outcome = self.prepare_update(product_id, requested).await;
        self.settle(&mut writer, outcome)
    }

    /// Compute the cart after adding one unit. Caller holds the writer lock.
    async fn prepare_add(&self, product_id: ProductId) -> Result<Cart> {
        let op = CartOperation::Add;
        let mut cart = self.cart();
        let current = cart.amount_of(product_id);
        let requested = u64::from(current) + 1;

        let stock = self
            .inner
            .catalog
            .stock(product_id)
            .await
            .map_err(|e| CartError::external(op, e))?;

        if !stock.covers(requested) {
            return Err(CartError::StockExceeded {
                product_id,
                requested,
                available: stock.amount,
            });
        }

        if current > 0 {
            let amount = narrow_amount(op, product_id, requested)?;
            cart.set_amount(product_id, amount)
                .map_err(|e| CartError::invalid(op, product_id, e.to_string()))?;
        } else {
            let product = self
                .inner
                .catalog
                .product(product_id)
                .await
                .map_err(|e| CartError::external(op, e))?;
            cart.push(CartLineItem::new(product, 1))
                .map_err(|e| CartError::invalid(op, product_id, e.to_string()))?;
        }

        Ok(cart)
    }

    /// Compute the cart after setting an amount. Caller holds the writer lock.
    async fn prepare_update(&self, product_id: ProductId, requested: u64) -> Result<Cart> {
        let op = CartOperation::UpdateAmount;

        let stock = self
            .inner
            .catalog
            .stock(product_id)
            .await
            .map_err(|e| CartError::external(op, e))?;

        if !stock.covers(requested) {
            return Err(CartError::StockExceeded {
                product_id,
                requested,
                available: stock.amount,
            });
        }

        let amount = narrow_amount(op, product_id, requested)?;
        let mut cart = self.cart();
        cart.set_amount(product_id, amount)
            .map_err(|e| CartError::invalid(op, product_id, e.to_string()))?;
        Ok(cart)
    }

    /// Commit a successful outcome or report a failed one.
    fn settle(&self, writer: &mut Persister, outcome: Result<Cart>) -> Result<Cart> {
        match outcome {
            Ok(cart) => {
                writer.sync(&cart);
                self.inner.state.send_replace(cart.clone());
                info!(
                    lines = cart.len(),
                    items = cart.item_count(),
                    "Cart updated"
                );
                Ok(cart)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Emit the notification for a failed operation.
    fn reject(&self, err: CartError) -> CartError {
        warn!(error = %err, "Cart operation rejected");
        self.inner.notifier.error(err.notification());
        err
    }
}

/// Fit a stock-approved amount into a line item.
fn narrow_amount(op: CartOperation, product_id: ProductId, requested: u64) -> Result<u32> {
    u32::try_from(requested).map_err(|_| {
        CartError::invalid(
            op,
            product_id,
            format!("amount {requested} exceeds the line item limit"),
        )
    })
}

/// Read the persisted cart, falling back to an empty one.
fn hydrate(storage: &dyn CartStorage) -> Cart {
    let json = match storage.get_item(CART_STORAGE_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read persisted cart, starting empty");
            return Cart::new();
        }
    };

    match serde_json::from_str::<Cart>(&json) {
        Ok(cart) => {
            info!(lines = cart.len(), "Hydrated cart from storage");
            cart
        }
        Err(e) => {
            warn!(error = %e, "Discarding unreadable persisted cart");
            Cart::new()
        }
    }
}
