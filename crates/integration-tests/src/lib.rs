//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests need no external services: [`MockCatalogApi`] serves the
//! catalog and stock endpoints from an in-process `axum` server bound to an
//! ephemeral local port.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// In-process stand-in for the catalog/stock REST API.
///
/// Serves `GET /products/{id}` and `GET /stock/{id}`. Unknown ids answer
/// 404; stock can be changed while the server runs.
#[derive(Clone)]
pub struct MockCatalogApi {
    base_url: String,
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    products: Mutex<HashMap<i64, Value>>,
    stock: Mutex<HashMap<i64, i64>>,
    failing: Mutex<bool>,
    product_hits: AtomicUsize,
    stock_hits: AtomicUsize,
}

impl MockCatalogApi {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/products/{id}", get(product_handler))
            .route("/stock/{id}", get(stock_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
        })
    }

    /// Base URL to point the catalog client at.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register a product with the given stock.
    #[must_use]
    pub fn with_product(self, id: i64, title: &str, price: f64, stock: i64) -> Self {
        lock(&self.state.products).insert(
            id,
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/modulo-redux/tenis{id}.jpg"),
            }),
        );
        self.set_stock(id, stock);
        self
    }

    /// Change the available stock of a product.
    pub fn set_stock(&self, id: i64, amount: i64) {
        lock(&self.state.stock).insert(id, amount);
    }

    /// Make every endpoint answer 503.
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.state.failing) = failing;
    }

    /// Number of product requests served.
    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }

    /// Number of stock requests served.
    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn product_handler(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if *lock(&state.failing) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match lock(&state.products).get(&id) {
        Some(product) => Json(product.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn stock_handler(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if *lock(&state.failing) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match lock(&state.stock).get(&id) {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
