//! Catalog records supplied by the external product and stock service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A catalog product as served by `products/{id}`.
///
/// The cart only interprets `id`; the display attributes are carried through
/// untouched and default to empty when the catalog omits them. Fields the
/// catalog adds beyond the known ones are kept in `attributes` so they
/// survive persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image: String,
    /// Unrecognized catalog fields, preserved verbatim.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra attributes.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Price,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            attributes: Map::new(),
        }
    }
}

/// Authoritative available quantity for a product, as served by `stock/{id}`.
///
/// The amount is kept exactly as served. A negative amount covers nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: i64,
}

impl StockRecord {
    /// Create a stock record.
    #[must_use]
    pub const fn new(id: ProductId, amount: i64) -> Self {
        Self { id, amount }
    }

    /// Whether `requested` units can be supplied.
    #[must_use]
    pub fn covers(&self, requested: u64) -> bool {
        u64::try_from(self.amount).is_ok_and(|available| requested <= available)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_keeps_unknown_attributes() {
        let json = r#"{"id":1,"title":"Tênis de Caminhada","price":179.9,"image":"https://cdn/1.jpg","brand":"Leve"}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.attributes.get("brand"), Some(&Value::from("Leve")));

        let back: Value = serde_json::to_value(&product).unwrap();
        assert_eq!(back["brand"], "Leve");
        assert_eq!(back["title"], "Tênis de Caminhada");
    }

    #[test]
    fn test_stock_covers() {
        let stock = StockRecord::new(ProductId::new(1), 3);
        assert!(stock.covers(3));
        assert!(!stock.covers(4));
        assert!(StockRecord::new(ProductId::new(2), 0).covers(0));
    }

    #[test]
    fn test_negative_stock_covers_nothing() {
        let stock = StockRecord::new(ProductId::new(1), -1);
        assert!(!stock.covers(0));
        assert!(!stock.covers(1));
    }

    #[test]
    fn test_stock_beyond_u32_range() {
        let stock = StockRecord::new(ProductId::new(1), 5_000_000_000);
        assert!(stock.covers(5_000_000_000));
        assert!(!stock.covers(5_000_000_001));
    }

    #[test]
    fn test_product_display_attributes_are_optional() {
        let product: Product = serde_json::from_str(r#"{"id":7,"title":"Tênis"}"#).unwrap();

        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.title, "Tênis");
        assert_eq!(product.price, Price::ZERO);
        assert!(product.image.is_empty());
        assert!(product.attributes.is_empty());
    }
}
