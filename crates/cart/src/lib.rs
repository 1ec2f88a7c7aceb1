//! RocketShoes cart store.
//!
//! Holds the shopping cart for one session, validates every mutation against
//! the live stock service and mirrors the committed cart to durable storage.
//!
//! # Modules
//!
//! - [`store`] - The [`CartStore`] and its three operations
//! - [`catalog`] - Product and stock lookups over HTTP
//! - [`storage`] - Key-value persistence backends
//! - [`notify`] - Delivery of user-facing error notifications
//! - [`config`] - Environment-driven configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;
pub mod store;

pub use catalog::{CatalogError, CatalogService, HttpCatalog};
pub use config::{CartConfig, CatalogApiConfig, ConfigError};
pub use error::{CartError, CartOperation};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::{CART_STORAGE_KEY, CartStore, UpdateProductAmount};
