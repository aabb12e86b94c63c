//! Storefront reducer: every cart, catalog and history transition.
//!
//! [`StorefrontReducer::apply`] is the pure state change. The [`Reducer`]
//! impl runs it and then describes the persistence the transition calls
//! for: confirming an order mirrors the order history, adding a product
//! mirrors the catalog. Those writes run as effects in the store, so a
//! transition is complete before any I/O starts.

use crate::persistence::{CATALOG_KEY, CollectionWriter, ORDERS_KEY};
use crate::types::{LineItem, StorefrontAction, StorefrontState};
use std::sync::Arc;
use storefront_core::effect::Effect;
use storefront_core::environment::Clock;
use storefront_core::key_value::KeyValueStore;
use storefront_core::reducer::Reducer;
use storefront_core::{SmallVec, smallvec};

/// Environment for the storefront containing dependencies
///
/// Clones share the collection writers, so snapshot ordering holds across
/// every clone of a store.
#[derive(Clone)]
pub struct StorefrontEnvironment {
    /// Storage the order history and catalog are mirrored into
    pub storage: Arc<dyn KeyValueStore>,
    /// Clock for order ids, product ids and timestamps
    pub clock: Arc<dyn Clock>,
    orders: Arc<CollectionWriter>,
    catalog: Arc<CollectionWriter>,
}

impl StorefrontEnvironment {
    /// Creates a new storefront environment
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: Arc::new(CollectionWriter::new(Arc::clone(&storage), ORDERS_KEY)),
            catalog: Arc::new(CollectionWriter::new(Arc::clone(&storage), CATALOG_KEY)),
            storage,
            clock,
        }
    }
}

/// Collection a transition asks to persist
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Persist {
    Orders,
    Catalog,
}

/// Reducer implementing the storefront's business logic
///
/// No action is ever rejected. Payloads that make no sense for the current
/// state (an unknown product, a non-positive quantity) leave it unchanged.
#[derive(Clone, Debug, Default)]
pub struct StorefrontReducer;

impl StorefrontReducer {
    /// Creates a new storefront reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies an action to state without any I/O
    pub fn apply(state: &mut StorefrontState, action: StorefrontAction) {
        match action {
            StorefrontAction::LoadCatalog { products } => {
                state.catalog = products;
            },

            StorefrontAction::AddToOrder {
                product_id,
                quantity,
            } => {
                let Some(quantity) = u32::try_from(quantity).ok().filter(|q| *q > 0) else {
                    tracing::debug!(%product_id, quantity, "Ignoring non-positive quantity");
                    return;
                };

                if let Some(item) = state
                    .active_order
                    .iter_mut()
                    .find(|item| item.product_id() == &product_id)
                {
                    let total = item.quantity.saturating_add(quantity);
                    item.set_quantity(total);
                    return;
                }

                let Some(product) = state.product(&product_id).cloned() else {
                    tracing::debug!(%product_id, "Ignoring product not in catalog");
                    return;
                };
                state.active_order.push(LineItem::new(product, quantity));
            },

            StorefrontAction::RemoveFromOrder { product_id } => {
                state
                    .active_order
                    .retain(|item| item.product_id() != &product_id);
            },

            StorefrontAction::UpdateQuantity {
                product_id,
                quantity,
            } => match u32::try_from(quantity).ok().filter(|q| *q > 0) {
                None => {
                    state
                        .active_order
                        .retain(|item| item.product_id() != &product_id);
                },
                Some(quantity) => {
                    if let Some(item) = state
                        .active_order
                        .iter_mut()
                        .find(|item| item.product_id() == &product_id)
                    {
                        item.set_quantity(quantity);
                    }
                },
            },

            StorefrontAction::ClearOrder => {
                state.active_order.clear();
            },

            StorefrontAction::ConfirmOrder { order } => {
                state.order_history.push(order);
                state.active_order.clear();
            },

            StorefrontAction::AddProduct { product } => {
                if state.product(&product.id).is_some() {
                    tracing::warn!(product_id = %product.id, "Catalog already holds a product with this id");
                }
                state.catalog.push(product);
            },

            StorefrontAction::SetFilters { filters } => {
                state.filters = filters;
            },

            StorefrontAction::SetSortOption { sort_option } => {
                state.sort_option = sort_option;
            },

            StorefrontAction::LoadOrderHistory { orders } => {
                state.order_history = orders;
            },
        }
    }
}

/// Returns the state after `action`, leaving `state` untouched
#[must_use]
pub fn transition(state: &StorefrontState, action: StorefrontAction) -> StorefrontState {
    let mut next = state.clone();
    StorefrontReducer::apply(&mut next, action);
    next
}

impl Reducer for StorefrontReducer {
    type State = StorefrontState;
    type Action = StorefrontAction;
    type Environment = StorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let persist = match &action {
            StorefrontAction::ConfirmOrder { .. } => Some(Persist::Orders),
            StorefrontAction::AddProduct { .. } => Some(Persist::Catalog),
            _ => None,
        };

        tracing::debug!(action = action.kind(), "Reducing action");
        Self::apply(state, action);

        match persist {
            Some(Persist::Orders) => smallvec![env.orders.persist(&state.order_history)],
            Some(Persist::Catalog) => smallvec![env.catalog.persist(&state.catalog)],
            None => SmallVec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{
        Category, CategoryFilter, Filters, Order, OrderId, Product, ProductId, SortOption,
    };
    use proptest::prelude::*;
    use storefront_testing::{InMemoryKeyValueStore, ReducerTest, assertions, test_clock};

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("1", "Margherita", Money::from_cents(500), vec!["tomato".into()])
                .with_category(Category::Vegetarian),
            Product::new("2", "Pepperoni", Money::from_cents(1299), vec!["pepperoni".into()])
                .with_category(Category::NonVegetarian),
        ]
    }

    fn state_with_catalog() -> StorefrontState {
        StorefrontState::with_catalog(catalog())
    }

    fn test_env(storage: &InMemoryKeyValueStore) -> StorefrontEnvironment {
        StorefrontEnvironment::new(Arc::new(storage.clone()), Arc::new(test_clock()))
    }

    fn add(id: &str, quantity: i32) -> StorefrontAction {
        StorefrontAction::AddToOrder {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    fn order_from(state: &StorefrontState) -> Order {
        Order::new(
            OrderId::new("ORD-000001"),
            state.active_order.clone(),
            test_clock().now(),
        )
    }

    #[test]
    fn add_then_add_merges_and_discounts() {
        ReducerTest::new(StorefrontReducer::new())
            .with_env(test_env(&InMemoryKeyValueStore::new()))
            .given_state(state_with_catalog())
            .when_action(add("1", 1))
            .when_action(add("1", 2))
            .then_state(|state| {
                assert_eq!(state.active_order.len(), 1);
                let item = &state.active_order[0];
                assert_eq!(item.quantity, 3);
                assert_eq!(item.original_price, Money::from_cents(1500));
                assert_eq!(item.discount, Money::from_cents(150));
                assert_eq!(item.discounted_price, Money::from_cents(1350));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn first_add_creates_undiscounted_line() {
        let next = transition(&state_with_catalog(), add("1", 1));
        let item = &next.active_order[0];
        assert_eq!(item.quantity, 1);
        assert_eq!(item.original_price, Money::from_cents(500));
        assert_eq!(item.discount, Money::ZERO);
        assert_eq!(item.discounted_price, Money::from_cents(500));
    }

    #[test]
    fn add_ignores_unknown_products_and_bad_quantities() {
        let state = state_with_catalog();
        assert_eq!(transition(&state, add("missing", 1)), state);
        assert_eq!(transition(&state, add("1", 0)), state);
        assert_eq!(transition(&state, add("1", -2)), state);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let state = transition(&transition(&state_with_catalog(), add("2", 1)), add("1", 1));
        let ids: Vec<&str> = state
            .active_order
            .iter()
            .map(|item| item.product_id().as_str())
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn remove_absent_line_is_a_no_op() {
        let state = transition(&state_with_catalog(), add("1", 2));
        let next = transition(
            &state,
            StorefrontAction::RemoveFromOrder {
                product_id: ProductId::new("2"),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn update_quantity_sets_absolute_value() {
        let state = transition(&state_with_catalog(), add("2", 1));
        let next = transition(
            &state,
            StorefrontAction::UpdateQuantity {
                product_id: ProductId::new("2"),
                quantity: 4,
            },
        );
        let item = &next.active_order[0];
        assert_eq!(item.quantity, 4);
        assert_eq!(item.original_price, Money::from_cents(5196));
        assert_eq!(item.discount, Money::from_cents(520));

        let back = transition(
            &next,
            StorefrontAction::UpdateQuantity {
                product_id: ProductId::new("2"),
                quantity: 2,
            },
        );
        assert_eq!(back.active_order[0].discount, Money::ZERO);
    }

    #[test]
    fn update_quantity_on_absent_line_is_a_no_op() {
        let state = state_with_catalog();
        let next = transition(
            &state,
            StorefrontAction::UpdateQuantity {
                product_id: ProductId::new("1"),
                quantity: 3,
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn transition_leaves_input_untouched() {
        let state = transition(&state_with_catalog(), add("1", 1));
        let before = state.clone();
        let _ = transition(&state, StorefrontAction::ClearOrder);
        let _ = transition(&state, add("1", 5));
        assert_eq!(state, before);
    }

    #[test]
    fn confirm_order_appends_history_and_persists() {
        let storage = InMemoryKeyValueStore::new();
        let state = transition(&state_with_catalog(), add("1", 3));
        let order = order_from(&state);

        ReducerTest::new(StorefrontReducer::new())
            .with_env(test_env(&storage))
            .given_state(state)
            .when_action(StorefrontAction::ConfirmOrder { order })
            .then_state(|state| {
                assert!(state.active_order.is_empty());
                assert_eq!(state.order_history.len(), 1);
                let order = &state.order_history[0];
                assert_eq!(order.subtotal, Money::from_cents(1500));
                assert_eq!(order.total_discount, Money::from_cents(150));
                assert_eq!(order.total, Money::from_cents(1350));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[tokio::test]
    async fn confirm_order_effect_writes_history() {
        let storage = InMemoryKeyValueStore::new();
        let env = test_env(&storage);
        let mut state = transition(&state_with_catalog(), add("2", 1));
        let order = order_from(&state);

        let effects =
            StorefrontReducer::new().reduce(&mut state, StorefrontAction::ConfirmOrder { order }, &env);

        for effect in effects {
            if let Effect::Future(fut) = effect {
                assert!(fut.await.is_none());
            }
        }

        let saved: Vec<Order> = serde_json::from_str(&storage.raw(ORDERS_KEY).unwrap()).unwrap();
        assert_eq!(saved, state.order_history);
    }

    #[test]
    fn confirmed_order_is_independent_of_later_changes() {
        let state = transition(&state_with_catalog(), add("1", 2));
        let order = order_from(&state);
        let confirmed = transition(&state, StorefrontAction::ConfirmOrder { order: order.clone() });

        let later = [
            add("1", 4),
            StorefrontAction::UpdateQuantity {
                product_id: ProductId::new("1"),
                quantity: 9,
            },
            StorefrontAction::LoadCatalog { products: Vec::new() },
        ]
        .into_iter()
        .fold(confirmed, |state, action| transition(&state, action));

        assert_eq!(later.order_history, vec![order]);
    }

    #[test]
    fn add_product_appends_and_persists_catalog() {
        let new_product = Product::new("3", "Funghi", Money::from_cents(800), vec!["mushroom".into()]);
        let expected = new_product.clone();

        ReducerTest::new(StorefrontReducer::new())
            .with_env(test_env(&InMemoryKeyValueStore::new()))
            .given_state(state_with_catalog())
            .when_action(StorefrontAction::AddProduct {
                product: new_product,
            })
            .then_state(move |state| {
                assert_eq!(state.catalog.len(), 3);
                assert_eq!(state.catalog[0].id.as_str(), "1");
                assert_eq!(state.catalog[1].id.as_str(), "2");
                assert_eq!(state.catalog[2], expected);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn view_state_actions_replace_wholesale() {
        let filters = Filters {
            search: "pep".into(),
            category: CategoryFilter::NonVegetarian,
            max_price: Some(Money::from_cents(1500)),
            ingredient: None,
        };

        ReducerTest::new(StorefrontReducer::new())
            .with_env(test_env(&InMemoryKeyValueStore::new()))
            .given_state(state_with_catalog())
            .when_action(StorefrontAction::SetFilters {
                filters: filters.clone(),
            })
            .when_action(StorefrontAction::SetSortOption {
                sort_option: SortOption::PriceDesc,
            })
            .then_state(move |state| {
                assert_eq!(state.filters, filters);
                assert_eq!(state.sort_option, SortOption::PriceDesc);
                assert_eq!(state.catalog, catalog());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn load_actions_replace_collections() {
        let state = transition(&state_with_catalog(), add("1", 1));
        let order = order_from(&state);

        let loaded = transition(
            &state,
            StorefrontAction::LoadOrderHistory {
                orders: vec![order.clone(), order],
            },
        );
        assert_eq!(loaded.order_history.len(), 2);

        let reloaded = transition(
            &loaded,
            StorefrontAction::LoadCatalog {
                products: catalog(),
            },
        );
        assert_eq!(reloaded, loaded);
    }

    fn quantity() -> impl Strategy<Value = i32> {
        1i32..50
    }

    proptest! {
        #[test]
        fn adds_merge_into_one_line(q1 in quantity(), q2 in quantity()) {
            let state = transition(&transition(&state_with_catalog(), add("2", q1)), add("2", q2));
            prop_assert_eq!(state.active_order.len(), 1);
            prop_assert_eq!(i64::from(state.active_order[0].quantity), i64::from(q1) + i64::from(q2));
        }

        #[test]
        fn non_positive_update_matches_removal(q in quantity(), update in -20i32..=0) {
            let state = transition(&transition(&state_with_catalog(), add("1", q)), add("2", 1));
            let updated = transition(&state, StorefrontAction::UpdateQuantity {
                product_id: ProductId::new("1"),
                quantity: update,
            });
            let removed = transition(&state, StorefrontAction::RemoveFromOrder {
                product_id: ProductId::new("1"),
            });
            prop_assert_eq!(updated, removed);
        }

        #[test]
        fn retained_lines_are_consistent(ops in proptest::collection::vec((0usize..2, -3i32..6, any::<bool>()), 0..30)) {
            let ids = ["1", "2"];
            let state = ops.into_iter().fold(state_with_catalog(), |state, (idx, quantity, is_update)| {
                let product_id = ProductId::new(ids[idx]);
                let action = if is_update {
                    StorefrontAction::UpdateQuantity { product_id, quantity }
                } else {
                    StorefrontAction::AddToOrder { product_id, quantity }
                };
                transition(&state, action)
            });

            for item in &state.active_order {
                prop_assert!(item.quantity >= 1);
                prop_assert_eq!(item.original_price, item.product.price.times(item.quantity));
                prop_assert_eq!(item.discounted_price, item.original_price - item.discount);
            }
            let mut seen: Vec<&ProductId> = state.active_order.iter().map(LineItem::product_id).collect();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), state.active_order.len());
        }
    }
}
