//! Integration tests for Hexshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hexshop-integration-tests
//! ```
//!
//! No database is needed: every test boots the real router on an ephemeral
//! port with in-memory storage and talks to it over HTTP.
//!
//! # Test Categories
//!
//! - `order_workflow` - Order service behaviour across stores (stock races,
//!   partial reservations)
//! - `http_orders` - Order endpoints end to end, including ownership checks
//! - `http_catalog` - Users, categories and products over HTTP

use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};

use hexshop_api::config::{ApiConfig, LogFormat, StorageBackend};
use hexshop_api::db::{MemoryStore, Stores};
use hexshop_api::services::OrderOptions;
use hexshop_api::state::AppState;

/// High-entropy signing secret for test sessions.
pub const TEST_SESSION_SECRET: &str =
    "Zq8#Lm2!Vx7@Pw4$Tk9%Rb3^Nc6&Hy1*Gd5(Fs0)Jq8-Ku2+Ea7=Wo4?Ri6~Xe3|Bt";

/// Configuration for an in-memory test server.
#[must_use]
pub fn test_config(orders: OrderOptions) -> ApiConfig {
    ApiConfig {
        storage: StorageBackend::Memory,
        database_url: None,
        host: [127, 0, 0, 1].into(),
        port: 0,
        session_secret: SecretString::from(TEST_SESSION_SECRET),
        secure_cookies: false,
        orders,
        log_format: LogFormat::Pretty,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A running server plus direct access to its data.
pub struct TestApp {
    pub addr: SocketAddr,
    /// The tables behind the server, for assertions that bypass HTTP.
    pub store: MemoryStore,
}

impl TestApp {
    /// Boot the router on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(orders: OrderOptions) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(test_config(orders), Stores::memory(&store), None);
        let app = hexshop_api::app(state).expect("Failed to build router");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self { addr, store }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A client with its own cookie jar, i.e. its own session.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register `email` and return a client logged in as that user, plus the
    /// user's JSON.
    ///
    /// # Panics
    ///
    /// Panics if registration or login fails.
    pub async fn login_as(&self, email: &str) -> (Client, Value) {
        let client = Self::client();

        let resp = client
            .post(self.url("/user/register"))
            .json(&json!({
                "email": email,
                "password": "correct horse battery",
                "firstName": "Test",
                "surname": "Customer",
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");

        let resp = client
            .post(self.url("/user/login"))
            .json(&json!({ "email": email, "password": "correct horse battery" }))
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(resp.status(), StatusCode::OK, "login failed");

        let user = resp.json().await.expect("Login returned no JSON");
        (client, user)
    }

    /// Create a category and a product with `quantity` in stock through the
    /// API and return the product's ID.
    ///
    /// # Panics
    ///
    /// Panics if either request fails.
    pub async fn create_product(&self, quantity: i32) -> i64 {
        let client = Self::client();

        let category: Value = client
            .post(self.url("/category"))
            .json(&json!({ "name": "General" }))
            .send()
            .await
            .expect("Failed to create category")
            .json()
            .await
            .expect("Category response was not JSON");

        let product: Value = client
            .post(self.url("/product"))
            .json(&json!({
                "name": "Widget",
                "price": "9.99",
                "quantity": quantity,
                "categoryId": category["id"],
            }))
            .send()
            .await
            .expect("Failed to create product")
            .json()
            .await
            .expect("Product response was not JSON");

        product["id"].as_i64().expect("Product has no ID")
    }

    /// Current stock of a product, read over HTTP.
    ///
    /// # Panics
    ///
    /// Panics if the product cannot be fetched.
    pub async fn stock(&self, product_id: i64) -> i64 {
        let product: Value = Self::client()
            .get(self.url(&format!("/product/{product_id}")))
            .send()
            .await
            .expect("Failed to fetch product")
            .json()
            .await
            .expect("Product response was not JSON");

        product["quantity"].as_i64().expect("Product has no quantity")
    }
}
