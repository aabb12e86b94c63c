//! Building the session store and hydrating it from persisted data.

use crate::catalog::Catalog;
use crate::persistence::{CATALOG_KEY, ORDERS_KEY, load_collection};
use crate::reducer::{StorefrontEnvironment, StorefrontReducer};
use crate::types::{Order, Product, StorefrontAction, StorefrontState};
use std::collections::HashSet;
use storefront_runtime::{Store, StoreError};

/// The storefront's state container
pub type StorefrontStore =
    Store<StorefrontState, StorefrontAction, StorefrontEnvironment, StorefrontReducer>;

/// Creates an empty store for one session
#[must_use]
pub fn build_store(environment: StorefrontEnvironment) -> StorefrontStore {
    Store::new(StorefrontState::new(), StorefrontReducer::new(), environment)
}

/// What [`hydrate`] loaded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Products from the base catalog
    pub base_products: usize,
    /// Persisted products not in the base catalog
    pub restored_products: usize,
    /// Persisted confirmed orders
    pub restored_orders: usize,
}

/// Base catalog followed by persisted products whose id it lacks
fn merge_catalog(base: Vec<Product>, persisted: Vec<Product>) -> (Vec<Product>, usize) {
    let mut ids: HashSet<_> = base.iter().map(|p| p.id.clone()).collect();
    let mut merged = base;
    let mut restored = 0;
    for product in persisted {
        if ids.insert(product.id.clone()) {
            merged.push(product);
            restored += 1;
        }
    }
    (merged, restored)
}

/// Loads the catalog and order history into `store`
///
/// Reads the persisted catalog and orders from the store's environment
/// storage, then dispatches `LoadCatalog` and `LoadOrderHistory`. Missing or
/// malformed persisted data counts as empty.
///
/// # Errors
///
/// Returns [`StoreError`] if the store is already shutting down.
pub async fn hydrate(
    store: &StorefrontStore,
    base_catalog: Catalog,
) -> Result<HydrationReport, StoreError> {
    let storage = &*store.environment().storage;
    let persisted_products: Vec<Product> = load_collection(storage, CATALOG_KEY).await;
    let orders: Vec<Order> = load_collection(storage, ORDERS_KEY).await;

    let base = base_catalog.into_products();
    let base_products = base.len();
    let (products, restored_products) = merge_catalog(base, persisted_products);
    let report = HydrationReport {
        base_products,
        restored_products,
        restored_orders: orders.len(),
    };

    store.send(StorefrontAction::LoadCatalog { products }).await?;
    store.send(StorefrontAction::LoadOrderHistory { orders }).await?;

    tracing::info!(
        base_products = report.base_products,
        restored_products = report.restored_products,
        restored_orders = report.restored_orders,
        "Storefront hydrated"
    );
    Ok(report)
}
