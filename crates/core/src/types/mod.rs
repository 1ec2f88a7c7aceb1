//! Core types for the RocketShoes cart.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartInvariantError, CartLineItem};
pub use id::*;
pub use price::Price;
pub use product::{Product, StockRecord};
