//! Domain types for the storefront.
//!
//! The shop sells products from a catalog. Shoppers build an active order out
//! of line items; confirming it freezes a snapshot into the order history.
//! Filters and the sort option are view state kept alongside so every
//! consumer renders the same menu.

use crate::money::Money;
use crate::pricing::{LinePricing, OrderTotals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_core::environment::Clock;

/// Unique identifier for a product
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new `ProductId` from a string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id for a newly added product: the clock's millisecond timestamp
    #[must_use]
    pub fn generate(clock: &dyn Clock) -> Self {
        Self::new(clock.now().timestamp_millis().to_string())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Dietary category of a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// No meat or fish
    Vegetarian,
    /// Contains meat or fish
    NonVegetarian,
}

impl Category {
    /// Wire/display label (`vegetarian`, `non-vegetarian`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vegetarian => "vegetarian",
            Self::NonVegetarian => "non-vegetarian",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable product
///
/// Immutable once created; identity is `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Ingredients in menu order
    pub ingredients: Vec<String>,
    /// Optional image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Optional dietary category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Creates a product with no image, category or description
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        ingredients: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            ingredients,
            image_url: None,
            category: None,
            description: None,
        }
    }

    /// Sets the category
    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the image reference
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Checks if the product lists `ingredient` exactly
    #[must_use]
    pub fn has_ingredient(&self, ingredient: &str) -> bool {
        self.ingredients.iter().any(|i| i == ingredient)
    }
}

/// A product plus quantity and computed pricing within the active order
///
/// The pricing fields are derived from `product.price` and `quantity`; they
/// are recomputed from scratch by [`LineItem::set_quantity`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Snapshot of the ordered product
    #[serde(rename = "pizza")]
    pub product: Product,
    /// Units ordered, always at least 1
    pub quantity: u32,
    /// Unit price × quantity
    pub original_price: Money,
    /// Quantity discount
    pub discount: Money,
    /// `original_price - discount`
    pub discounted_price: Money,
}

impl LineItem {
    /// Creates a line item for `quantity` units of `product`
    #[must_use]
    pub fn new(product: Product, quantity: u32) -> Self {
        let pricing = LinePricing::for_quantity(product.price, quantity);
        Self {
            product,
            quantity,
            original_price: pricing.original,
            discount: pricing.discount,
            discounted_price: pricing.discounted,
        }
    }

    /// Identifier of the ordered product
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    /// Sets the absolute quantity and recomputes pricing
    pub fn set_quantity(&mut self, quantity: u32) {
        let pricing = LinePricing::for_quantity(self.product.price, quantity);
        self.quantity = quantity;
        self.original_price = pricing.original;
        self.discount = pricing.discount;
        self.discounted_price = pricing.discounted;
    }
}

/// Unique identifier for a confirmed order
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new `OrderId` from a string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the `ORD-nnnnnn` id from a millisecond timestamp
    #[must_use]
    pub fn from_timestamp_millis(millis: i64) -> Self {
        Self(format!("ORD-{:06}", millis.rem_euclid(1_000_000)))
    }

    /// Returns the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A confirmed order
///
/// Owns a deep copy of its line items, so nothing that happens to the
/// catalog or the active order afterwards can alter it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Line items at confirmation time
    pub items: Vec<LineItem>,
    /// Sum of `original_price`
    pub subtotal: Money,
    /// Sum of `discount`
    pub total_discount: Money,
    /// `subtotal - total_discount`
    pub total: Money,
    /// Confirmation time
    pub timestamp: DateTime<Utc>,
}

/// Base preparation time for any order, in minutes
pub const BASE_PREP_MINUTES: u32 = 15;

/// Additional preparation time per unit ordered, in minutes
pub const PREP_MINUTES_PER_UNIT: u32 = 5;

impl Order {
    /// Creates an order from line items, computing its totals
    #[must_use]
    pub fn new(id: OrderId, items: Vec<LineItem>, timestamp: DateTime<Utc>) -> Self {
        let totals = OrderTotals::from_items(&items);
        Self {
            id,
            items,
            subtotal: totals.subtotal,
            total_discount: totals.total_discount,
            total: totals.total,
            timestamp,
        }
    }

    /// Total units across all line items, saturating at `u32::MAX`
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.quantity)
            .fold(0, u32::saturating_add)
    }

    /// Estimated preparation time in minutes
    #[must_use]
    pub fn estimated_prep_minutes(&self) -> u32 {
        BASE_PREP_MINUTES.saturating_add(PREP_MINUTES_PER_UNIT.saturating_mul(self.unit_count()))
    }
}

/// Category filter for the menu
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    /// Every product
    #[default]
    All,
    /// Only vegetarian products
    Vegetarian,
    /// Only non-vegetarian products
    NonVegetarian,
}

impl CategoryFilter {
    /// Checks if a product with `category` passes the filter
    #[must_use]
    pub fn matches(self, category: Option<Category>) -> bool {
        match self {
            Self::All => true,
            Self::Vegetarian => category == Some(Category::Vegetarian),
            Self::NonVegetarian => category == Some(Category::NonVegetarian),
        }
    }
}

/// Menu filters (pure view state)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Case-insensitive substring searched in names and ingredients
    pub search: String,
    /// Category restriction
    pub category: CategoryFilter,
    /// Maximum unit price, inclusive
    pub max_price: Option<Money>,
    /// Required ingredient, matched exactly
    pub ingredient: Option<String>,
}

impl Filters {
    /// Checks if any filter narrows the menu
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.category != CategoryFilter::All
            || self.max_price.is_some()
            || self.ingredient.is_some()
    }

    /// Filters with every restriction removed
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }
}

/// Menu sort order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// A → Z
    #[default]
    NameAsc,
    /// Z → A
    NameDesc,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
}

/// State of the storefront
///
/// One instance per session, owned by the [`Store`](storefront_runtime::Store)
/// and changed only by dispatching [`StorefrontAction`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontState {
    /// Every purchasable product
    pub catalog: Vec<Product>,
    /// The in-progress cart, at most one line per product
    pub active_order: Vec<LineItem>,
    /// Confirmed orders, oldest first
    pub order_history: Vec<Order>,
    /// Menu filters
    pub filters: Filters,
    /// Menu sort order
    pub sort_option: SortOption,
}

impl StorefrontState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state with `catalog` loaded
    #[must_use]
    pub fn with_catalog(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Returns a catalog product by ID
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.catalog.iter().find(|p| &p.id == id)
    }

    /// Returns the active order line for a product
    #[must_use]
    pub fn line_item(&self, id: &ProductId) -> Option<&LineItem> {
        self.active_order.iter().find(|item| item.product_id() == id)
    }

    /// Totals of the active order
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_items(&self.active_order)
    }
}

/// Every input the storefront reducer accepts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorefrontAction {
    /// Replace the catalog
    LoadCatalog {
        /// New catalog contents
        products: Vec<Product>,
    },

    /// Add units of a catalog product, merging into an existing line
    AddToOrder {
        /// Product to add
        product_id: ProductId,
        /// Units to add; non-positive values are ignored
        quantity: i32,
    },

    /// Drop a product's line from the active order
    RemoveFromOrder {
        /// Product to remove
        product_id: ProductId,
    },

    /// Set a line's absolute quantity; non-positive removes the line
    UpdateQuantity {
        /// Product whose line changes
        product_id: ProductId,
        /// New absolute quantity
        quantity: i32,
    },

    /// Empty the active order
    ClearOrder,

    /// Append a confirmed order to history and empty the active order
    ConfirmOrder {
        /// Snapshot of the confirmed order
        order: Order,
    },

    /// Append a product to the catalog
    AddProduct {
        /// The new product
        product: Product,
    },

    /// Replace the menu filters
    SetFilters {
        /// New filters
        filters: Filters,
    },

    /// Replace the menu sort order
    SetSortOption {
        /// New sort order
        sort_option: SortOption,
    },

    /// Replace the order history
    LoadOrderHistory {
        /// Restored orders
        orders: Vec<Order>,
    },
}

impl StorefrontAction {
    /// Short name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LoadCatalog { .. } => "LoadCatalog",
            Self::AddToOrder { .. } => "AddToOrder",
            Self::RemoveFromOrder { .. } => "RemoveFromOrder",
            Self::UpdateQuantity { .. } => "UpdateQuantity",
            Self::ClearOrder => "ClearOrder",
            Self::ConfirmOrder { .. } => "ConfirmOrder",
            Self::AddProduct { .. } => "AddProduct",
            Self::SetFilters { .. } => "SetFilters",
            Self::SetSortOption { .. } => "SetSortOption",
            Self::LoadOrderHistory { .. } => "LoadOrderHistory",
        }
    }
}
