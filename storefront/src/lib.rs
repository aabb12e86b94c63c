//! Pizza storefront: catalog, cart with quantity discounts, and order history.
//!
//! All state lives in one [`StorefrontStore`] per session and changes only by
//! dispatching [`StorefrontAction`]s through the [`StorefrontReducer`]. It
//! demonstrates:
//!
//! - Line item merging: adding a product already in the cart bumps its quantity
//! - Quantity discounts recomputed from scratch on every change
//! - Confirmed orders as independent snapshots
//! - Best-effort persistence of orders and shop-added products as effects
//!
//! # Example Usage
//!
//! ```no_run
//! use storefront::{Catalog, Checkout, StorefrontAction, StorefrontEnvironment};
//! use storefront::bootstrap::{build_store, hydrate};
//! use storefront::persistence::FileKeyValueStore;
//! use storefront::types::ProductId;
//! use storefront_core::environment::{Clock, SystemClock};
//! use storefront_core::key_value::KeyValueStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new("./.storefront"));
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let store = build_store(StorefrontEnvironment::new(storage, Arc::clone(&clock)));
//! hydrate(&store, Catalog::bundled()?).await?;
//!
//! store.send(StorefrontAction::AddToOrder {
//!     product_id: ProductId::new("1"),
//!     quantity: 3,
//! }).await?;
//!
//! if let Some(order) = store.state(|s| Checkout::place(s, clock.as_ref())).await {
//!     let mut handle = store.send(StorefrontAction::ConfirmOrder { order }).await?;
//!     // Wait for the order history to be written
//!     handle.wait().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod menu;
pub mod money;
pub mod persistence;
pub mod pricing;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use bootstrap::{HydrationReport, StorefrontStore};
pub use catalog::{Catalog, CatalogError, DraftErrors, ProductDraft};
pub use checkout::Checkout;
pub use config::Config;
pub use menu::MenuQuery;
pub use money::Money;
pub use reducer::{StorefrontEnvironment, StorefrontReducer, transition};
pub use types::{
    LineItem, Order, OrderId, Product, ProductId, StorefrontAction, StorefrontState,
};
