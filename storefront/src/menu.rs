//! Read-only queries over the catalog for rendering the menu.
//!
//! Nothing here changes state. Views call these with the catalog, filters
//! and sort option they read from the store.

use crate::money::Money;
use crate::types::{Filters, Product, ProductId, SortOption};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Label used by [`MenuQuery::categories`] for products without a category
pub const UNCATEGORIZED: &str = "other";

/// Menu filtering, sorting and the lookups the filter controls need
#[derive(Clone, Copy, Debug, Default)]
pub struct MenuQuery;

impl MenuQuery {
    /// Products passing `filters`, ordered by `sort`
    ///
    /// Filters run in a fixed order: search, category, price ceiling,
    /// ingredient. The sort is stable, so equal keys keep catalog order.
    #[must_use]
    pub fn apply<'a>(catalog: &'a [Product], filters: &Filters, sort: SortOption) -> Vec<&'a Product> {
        let search = filters.search.to_lowercase();
        let ingredient = filters.ingredient.as_deref().filter(|i| !i.is_empty());

        let mut visible: Vec<&Product> = catalog
            .iter()
            .filter(|p| search.is_empty() || matches_search(p, &search))
            .filter(|p| filters.category.matches(p.category))
            .filter(|p| filters.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| ingredient.is_none_or(|i| p.has_ingredient(i)))
            .collect();

        visible.sort_by(|a, b| compare(a, b, sort));
        visible
    }

    /// Every ingredient in the catalog, deduplicated and sorted
    #[must_use]
    pub fn all_ingredients(catalog: &[Product]) -> Vec<&str> {
        catalog
            .iter()
            .flat_map(|p| p.ingredients.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Highest unit price in the catalog, zero when empty
    #[must_use]
    pub fn max_price(catalog: &[Product]) -> Money {
        catalog.iter().map(|p| p.price).max().unwrap_or(Money::ZERO)
    }

    /// Category labels in first-seen order
    #[must_use]
    pub fn categories(catalog: &[Product]) -> Vec<&'static str> {
        let mut labels = Vec::new();
        for product in catalog {
            let label = product.category.map_or(UNCATEGORIZED, |c| c.as_str());
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// Up to `limit` other products to suggest, in catalog order
    #[must_use]
    pub fn suggestions<'a>(
        catalog: &'a [Product],
        current: Option<&ProductId>,
        exclude: &[ProductId],
        limit: usize,
    ) -> Vec<&'a Product> {
        catalog
            .iter()
            .filter(|p| current != Some(&p.id) && !exclude.contains(&p.id))
            .take(limit)
            .collect()
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .ingredients
            .iter()
            .any(|i| i.to_lowercase().contains(needle))
}

fn compare_names(a: &Product, b: &Product) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

fn compare(a: &Product, b: &Product, sort: SortOption) -> Ordering {
    match sort {
        SortOption::NameAsc => compare_names(a, b),
        SortOption::NameDesc => compare_names(b, a),
        SortOption::PriceAsc => a.price.cmp(&b.price),
        SortOption::PriceDesc => b.price.cmp(&a.price),
    }
}
