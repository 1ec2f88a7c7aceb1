//! RocketShoes Core - Cart data model.
//!
//! This crate provides the types shared by the cart store and its front ends:
//! - `cart` - The cart store, its HTTP catalog client and durable storage
//! - `cli` - Command-line front end for inspecting and mutating the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no HTTP
//! clients, no storage. Invariants of the cart (unique products, positive
//! amounts, insertion order) are enforced here so that every consumer gets
//! them for free.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, line items and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
