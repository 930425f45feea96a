//! Integration tests for Bodega.
//!
//! End-to-end cart session scenarios: several `CartSession` instances
//! ("tabs") sharing one key-value store, login/logout transitions
//! crossing instance boundaries, and persistence across store re-open.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bodega-integration-tests
//! ```

use std::sync::OnceLock;
use std::time::Duration;

use bodega_cart::cart::Product;
use bodega_cart::config::CartConfig;
use bodega_cart::identity::USER_KEY;
use bodega_cart::store::KeyValueStore;
use bodega_core::{CurrencyCode, Price, ProductId};

static TRACING: OnceLock<()> = OnceLock::new();

/// Install a test subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config with a polling interval tight enough for test deadlines.
#[must_use]
pub fn fast_config() -> CartConfig {
    CartConfig {
        poll_interval: Duration::from_millis(20),
        store_path: None,
    }
}

/// Test product with the given id, priced in whole cents.
#[must_use]
pub fn product(id: i32, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("product-{id}"),
        price: Price::from_cents(cents, CurrencyCode::USD),
        image_url: None,
    }
}

/// Simulate the login flow writing the identity record.
pub fn write_login(store: &dyn KeyValueStore, id: i32, role: &str) {
    store.set(
        USER_KEY,
        &format!("{{\"id\":{id},\"role\":\"{role}\",\"email\":\"u{id}@example.com\"}}"),
    );
}

/// Simulate the logout flow removing the identity record.
pub fn write_logout(store: &dyn KeyValueStore) {
    store.remove(USER_KEY);
}

/// Poll until `f` holds or a deadline passes.
///
/// # Panics
///
/// Panics when the condition is not reached within two seconds.
pub async fn eventually(f: impl Fn() -> bool) {
    for _ in 0..200 {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}
