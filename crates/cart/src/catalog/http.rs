//! REST client for the catalog service.
//!
//! Uses `reqwest` for HTTP. Products are cached with `moka` for the
//! configured TTL; stock is fetched on every call.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, StockRecord};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{CatalogError, CatalogService};
use crate::config::CatalogApiConfig;

/// Maximum number of products kept in the cache.
const PRODUCT_CACHE_CAPACITY: u64 = 1000;

/// Characters of a response body kept in logs and error messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// Body of `stock/{id}`. Some deployments omit the `id`.
#[derive(Debug, Deserialize)]
struct StockResponse {
    amount: i64,
}

/// Client for the catalog REST API.
///
/// Cheaply cloneable; clones share the connection pool and product cache.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    client: reqwest::Client,
    base_url: String,
    products: Option<Cache<ProductId, Product>>,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CatalogApiConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| CatalogError::InvalidConfig(format!("Invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let products = (!config.product_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(PRODUCT_CACHE_CAPACITY)
                .time_to_live(config.product_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpCatalogInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// GET `{base_url}/{path}` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = format!("{}/{path}", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = preview(&body);
            tracing::error!(status = %status, body = %message, "Catalog API returned non-success status");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %preview(&body), "Failed to parse catalog response");
            CatalogError::Parse(e)
        })
    }
}

#[async_trait]
impl CatalogService for HttpCatalog {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<StockRecord, CatalogError> {
        let response: StockResponse = self.get_json(&format!("stock/{id}")).await?;
        debug!(available = response.amount, "Fetched stock");
        Ok(StockRecord::new(id, response.amount))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{id}")).await?;
        if product.id != id {
            return Err(CatalogError::UnexpectedRecord {
                requested: id,
                received: product.id,
            });
        }

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Clone, Default)]
    struct ApiState {
        product_hits: Arc<AtomicUsize>,
    }

    async fn stock_handler(Path(id): Path<i64>) -> impl IntoResponse {
        match id {
            1 => (AxumStatus::OK, Json(json!({"id": 1, "amount": 3}))).into_response(),
            2 => (AxumStatus::OK, Json(json!({"amount": 0}))).into_response(),
            3 => (AxumStatus::OK, "not json").into_response(),
            4 => (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response(),
            5 => (AxumStatus::TOO_MANY_REQUESTS, [("Retry-After", "7")], "slow down")
                .into_response(),
            6 => (AxumStatus::OK, Json(json!({"id": 6, "amount": -1}))).into_response(),
            _ => AxumStatus::NOT_FOUND.into_response(),
        }
    }

    async fn product_handler(
        State(state): State<ApiState>,
        headers: AxumHeaders,
        Path(id): Path<i64>,
    ) -> impl IntoResponse {
        state.product_hits.fetch_add(1, Ordering::SeqCst);
        if id == 42 {
            let authorized = headers
                .get("authorization")
                .is_some_and(|v| v == "Bearer tok_test");
            if !authorized {
                return AxumStatus::UNAUTHORIZED.into_response();
            }
        }
        if id == 9 {
            return AxumStatus::NOT_FOUND.into_response();
        }
        if id == 8 {
            return Json(json!({"id": 8, "title": "Tênis sem foto"})).into_response();
        }
        // Misconfigured catalog answering with another record.
        let served_id = if id == 13 { 31 } else { id };
        Json(json!({
            "id": served_id,
            "title": format!("Tênis {id}"),
            "price": 179.9,
            "image": format!("https://cdn.example/{id}.jpg"),
        }))
        .into_response()
    }

    async fn spawn_api() -> (String, ApiState) {
        let state = ApiState::default();
        let app = Router::new()
            .route("/stock/{id}", get(stock_handler))
            .route("/products/{id}", get(product_handler))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), state)
    }

    fn catalog(base_url: &str) -> HttpCatalog {
        HttpCatalog::new(&CatalogApiConfig::new(base_url).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_stock_parses_amount() {
        let (url, _) = spawn_api().await;
        let catalog = catalog(&url);

        let stock = catalog.stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock, StockRecord::new(ProductId::new(1), 3));

        let stock = catalog.stock(ProductId::new(2)).await.unwrap();
        assert_eq!(stock, StockRecord::new(ProductId::new(2), 0));
    }

    #[tokio::test]
    async fn test_negative_stock_is_passed_through() {
        let (url, _) = spawn_api().await;

        let stock = catalog(&url).stock(ProductId::new(6)).await.unwrap();

        assert_eq!(stock.amount, -1);
        assert!(!stock.covers(1));
    }

    #[tokio::test]
    async fn test_stock_error_mapping() {
        let (url, _) = spawn_api().await;
        let catalog = catalog(&url);

        assert!(matches!(
            catalog.stock(ProductId::new(3)).await,
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            catalog.stock(ProductId::new(4)).await,
            Err(CatalogError::Api { status: 500, .. })
        ));
        assert!(matches!(
            catalog.stock(ProductId::new(5)).await,
            Err(CatalogError::RateLimited(7))
        ));
        assert!(matches!(
            catalog.stock(ProductId::new(99)).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_product_is_cached() {
        let (url, state) = spawn_api().await;
        let catalog = catalog(&url);

        let first = catalog.product(ProductId::new(7)).await.unwrap();
        let second = catalog.product(ProductId::new(7)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.title, "Tênis 7");
        assert_eq!(state.product_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_product_cache_disabled_with_zero_ttl() {
        let (url, state) = spawn_api().await;
        let mut config = CatalogApiConfig::new(&url).unwrap();
        config.product_cache_ttl = Duration::ZERO;
        let catalog = HttpCatalog::new(&config).unwrap();

        catalog.product(ProductId::new(7)).await.unwrap();
        catalog.product(ProductId::new(7)).await.unwrap();

        assert_eq!(state.product_hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_product_without_display_fields() {
        let (url, _) = spawn_api().await;

        let product = catalog(&url).product(ProductId::new(8)).await.unwrap();

        assert_eq!(product.title, "Tênis sem foto");
        assert!(product.image.is_empty());
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let (url, _) = spawn_api().await;
        let result = catalog(&url).product(ProductId::new(9)).await;
        assert!(matches!(result, Err(CatalogError::NotFound(path)) if path == "products/9"));
    }

    #[tokio::test]
    async fn test_product_with_other_id_is_rejected() {
        let (url, _) = spawn_api().await;
        let result = catalog(&url).product(ProductId::new(13)).await;
        assert!(matches!(
            result,
            Err(CatalogError::UnexpectedRecord { requested, received })
                if requested == ProductId::new(13) && received == ProductId::new(31)
        ));
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let (url, _) = spawn_api().await;

        let anonymous = catalog(&url).product(ProductId::new(42)).await;
        assert!(matches!(anonymous, Err(CatalogError::Api { status: 401, .. })));

        let mut config = CatalogApiConfig::new(&url).unwrap();
        config.token = Some(SecretString::from("tok_test"));
        let product = HttpCatalog::new(&config)
            .unwrap()
            .product(ProductId::new(42))
            .await
            .unwrap();
        assert_eq!(product.id, ProductId::new(42));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = catalog(&format!("http://{addr}")).stock(ProductId::new(1)).await;
        assert!(matches!(result, Err(CatalogError::Http(_))));
    }
}
