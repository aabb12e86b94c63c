//! Storefront demo.
//!
//! Hydrates a file-backed store, prints the menu, fills a cart and confirms
//! the order. Confirmed orders accumulate across runs in the data directory.
//!
//! ```bash
//! STOREFRONT_DATA_DIR=/tmp/storefront RUST_LOG=storefront=debug cargo run --bin storefront
//! ```

use anyhow::Context;
use std::sync::Arc;
use storefront::bootstrap::{build_store, hydrate};
use storefront::persistence::FileKeyValueStore;
use storefront::types::{Filters, SortOption};
use storefront::{
    Catalog, Checkout, Config, MenuQuery, ProductDraft, ProductId, StorefrontAction,
    StorefrontEnvironment,
};
use storefront_core::environment::{Clock, SystemClock};
use storefront_core::key_value::KeyValueStore;
use storefront_runtime::metrics::MetricsRecorder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(data_dir = %config.data_dir.display(), "Starting storefront demo");

    let recorder = if config.metrics_enabled {
        Some(MetricsRecorder::install()?)
    } else {
        None
    };

    let base_catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path)
            .await
            .with_context(|| format!("loading catalog from {}", path.display()))?,
        None => Catalog::bundled().context("loading bundled catalog")?,
    };

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(StorefrontEnvironment::new(storage, Arc::clone(&clock)));

    let report = hydrate(&store, base_catalog).await?;
    println!(
        "\nMenu ({} products, {} added by the shop, {} past orders)",
        report.base_products + report.restored_products,
        report.restored_products,
        report.restored_orders,
    );

    let menu = store
        .state(|s| {
            MenuQuery::apply(&s.catalog, &Filters::default(), SortOption::PriceAsc)
                .into_iter()
                .map(|p| format!("  {:>4}  {:<20} {:>8}", p.id.as_str(), p.name, p.price))
                .collect::<Vec<_>>()
        })
        .await;
    for line in menu {
        println!("{line}");
    }

    // The shop adds its special of the day once; later runs find it restored.
    let has_special = store
        .state(|s| s.catalog.iter().any(|p| p.name == "Chef's Special"))
        .await;
    if !has_special {
        let draft = ProductDraft {
            name: "Chef's Special".into(),
            price: "13.75".into(),
            ingredients: vec!["tomato sauce".into(), "burrata".into(), "prosciutto".into()],
            description: "Whatever the chef liked at the market today.".into(),
            ..ProductDraft::default()
        };
        let product = draft.into_product(ProductId::generate(clock.as_ref()))?;
        info!(product_id = %product.id, "Adding special of the day");
        let mut handle = store.send(StorefrontAction::AddProduct { product }).await?;
        handle.wait().await;
    }

    let picks = store
        .state(|s| {
            MenuQuery::suggestions(&s.catalog, None, &[], 2)
                .into_iter()
                .map(|p| p.id.clone())
                .collect::<Vec<_>>()
        })
        .await;
    let quantities = [3, 1];
    for (product_id, quantity) in picks.into_iter().zip(quantities) {
        store
            .send(StorefrontAction::AddToOrder {
                product_id,
                quantity,
            })
            .await?;
    }

    let Some(order) = store.state(|s| Checkout::place(s, clock.as_ref())).await else {
        println!("Cart is empty, nothing to order");
        return Ok(());
    };

    println!("\nOrder {}", order.id);
    for item in &order.items {
        println!(
            "  {} x {:<20} {:>8}  (-{})",
            item.quantity, item.product.name, item.original_price, item.discount
        );
    }
    println!("  Subtotal {:>24}", order.subtotal);
    println!("  Discount {:>24}", format!("-{}", order.total_discount));
    println!("  Total    {:>24}", order.total);
    println!("  Ready in about {} minutes\n", order.estimated_prep_minutes());

    let mut handle = store.send(StorefrontAction::ConfirmOrder { order }).await?;
    handle.wait().await;

    let history = store.state(|s| s.order_history.len()).await;
    info!(orders = history, "Order confirmed");

    store
        .shutdown(config.shutdown_timeout())
        .await
        .context("shutting down store")?;

    if let Some(recorder) = recorder {
        println!("\n{}", recorder.render());
    }
    Ok(())
}
