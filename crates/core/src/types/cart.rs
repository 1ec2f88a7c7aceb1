//! The cart and its line items.
//!
//! A [`Cart`] is an ordered sequence of [`CartLineItem`]s. Order is the order
//! in which products were first added. Every operation here upholds two
//! invariants:
//!
//! - no two line items share a product identifier
//! - every line item has an amount of at least 1
//!
//! A cart is serialized as a bare JSON array of line items, each line item as
//! the product's fields plus `amount`. Deserialization rejects payloads that
//! break either invariant.

use std::collections::HashSet;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// Violations of the cart invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartInvariantError {
    /// A line item would hold zero units.
    #[error("product {0} cannot have an amount of zero")]
    ZeroAmount(ProductId),

    /// A second line item for the same product.
    #[error("product {0} appears more than once")]
    DuplicateProduct(ProductId),

    /// The product has no line item in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// A product together with the quantity requested for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: u32,
}

impl CartLineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(product: Product, amount: u32) -> Self {
        Self { product, amount }
    }

    /// The product identifier keying this line item.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// The ordered collection of line items in a shopping session.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Iterate over line items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartLineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line item for `id`, if any.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Amount currently held for `id`, zero when absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, |item| item.amount)
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of every line item's subtotal.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartLineItem::subtotal).sum()
    }

    /// Append a new line item at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is zero or the product is already present.
    pub fn push(&mut self, item: CartLineItem) -> Result<(), CartInvariantError> {
        if item.amount == 0 {
            return Err(CartInvariantError::ZeroAmount(item.id()));
        }
        if self.contains(item.id()) {
            return Err(CartInvariantError::DuplicateProduct(item.id()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Set the amount of an existing line item, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is zero or the product is not present.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> Result<(), CartInvariantError> {
        if amount == 0 {
            return Err(CartInvariantError::ZeroAmount(id));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(CartInvariantError::NotInCart(id))?;
        item.amount = amount;
        Ok(())
    }

    /// Remove the line item for `id`; the rest keep their relative order.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not present.
    pub fn remove(&mut self, id: ProductId) -> Result<CartLineItem, CartInvariantError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or(CartInvariantError::NotInCart(id))?;
        Ok(self.items.remove(index))
    }
}

impl TryFrom<Vec<CartLineItem>> for Cart {
    type Error = CartInvariantError;

    fn try_from(items: Vec<CartLineItem>) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if item.amount == 0 {
                return Err(CartInvariantError::ZeroAmount(item.id()));
            }
            if !seen.insert(item.id()) {
                return Err(CartInvariantError::DuplicateProduct(item.id()));
            }
        }
        Ok(Self { items })
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLineItem;
    type IntoIter = std::slice::Iter<'a, CartLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, cents: i64) -> Product {
        Product::new(
            ProductId::new(id),
            format!("Tênis {id}"),
            Price::from_cents(cents),
            format!("https://cdn.example/{id}.jpg"),
        )
    }

    fn cart_of(lines: &[(i64, u32)]) -> Cart {
        let items = lines
            .iter()
            .map(|&(id, amount)| CartLineItem::new(product(id, 1000), amount))
            .collect::<Vec<_>>();
        Cart::try_from(items).unwrap()
    }

    fn ids(cart: &Cart) -> Vec<i64> {
        cart.iter().map(|item| item.id().as_i64()).collect()
    }

    #[test]
    fn test_push_appends_at_end() {
        let mut cart = cart_of(&[(1, 2)]);
        cart.push(CartLineItem::new(product(2, 500), 1)).unwrap();
        assert_eq!(ids(&cart), vec![1, 2]);
    }

    #[test]
    fn test_push_rejects_duplicate_and_zero() {
        let mut cart = cart_of(&[(1, 2)]);
        assert_eq!(
            cart.push(CartLineItem::new(product(1, 500), 1)),
            Err(CartInvariantError::DuplicateProduct(ProductId::new(1)))
        );
        assert_eq!(
            cart.push(CartLineItem::new(product(2, 500), 0)),
            Err(CartInvariantError::ZeroAmount(ProductId::new(2)))
        );
        assert_eq!(cart, cart_of(&[(1, 2)]));
    }

    #[test]
    fn test_set_amount_keeps_position() {
        let mut cart = cart_of(&[(1, 2), (2, 1), (3, 1)]);
        cart.set_amount(ProductId::new(2), 5).unwrap();
        assert_eq!(ids(&cart), vec![1, 2, 3]);
        assert_eq!(cart.amount_of(ProductId::new(2)), 5);
        assert_eq!(cart.amount_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_set_amount_errors() {
        let mut cart = cart_of(&[(1, 2)]);
        assert_eq!(
            cart.set_amount(ProductId::new(1), 0),
            Err(CartInvariantError::ZeroAmount(ProductId::new(1)))
        );
        assert_eq!(
            cart.set_amount(ProductId::new(9), 1),
            Err(CartInvariantError::NotInCart(ProductId::new(9)))
        );
        assert_eq!(cart.amount_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let mut cart = cart_of(&[(1, 1), (2, 1), (3, 1)]);
        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.id(), ProductId::new(2));
        assert_eq!(ids(&cart), vec![1, 3]);
        assert!(cart.remove(ProductId::new(2)).is_err());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.push(CartLineItem::new(product(1, 17990), 2)).unwrap();
        cart.push(CartLineItem::new(product(2, 13990), 1)).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Price::from_cents(49970));
        assert_eq!(Cart::new().subtotal(), Price::ZERO);
    }

    #[test]
    fn test_json_is_flat_array() {
        let cart = cart_of(&[(1, 2)]);
        let value = serde_json::to_value(&cart).unwrap();
        let first = &value.as_array().unwrap()[0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["amount"], 2);
        assert_eq!(first["title"], "Tênis 1");
    }

    #[test]
    fn test_json_round_trip_preserves_order_and_amounts() {
        let cart = cart_of(&[(3, 1), (1, 4), (2, 2)]);
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
        assert_eq!(ids(&back), vec![3, 1, 2]);
    }

    #[test]
    fn test_deserialize_rejects_broken_invariants() {
        let zero = r#"[{"id":1,"title":"a","price":1,"image":"i","amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(zero).is_err());

        let duplicate = r#"[
            {"id":1,"title":"a","price":1,"image":"i","amount":1},
            {"id":1,"title":"a","price":1,"image":"i","amount":2}
        ]"#;
        assert!(serde_json::from_str::<Cart>(duplicate).is_err());
    }
}
