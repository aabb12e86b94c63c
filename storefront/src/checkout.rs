//! Turning the active order into a confirmed [`Order`] snapshot.

use crate::types::{Order, OrderId, StorefrontState};
use storefront_core::environment::Clock;

/// Builds confirmed orders from the cart
#[derive(Clone, Copy, Debug, Default)]
pub struct Checkout;

impl Checkout {
    /// Snapshot of the active order, ready for `ConfirmOrder`
    ///
    /// Returns `None` when the cart is empty. The id is `ORD-` followed by
    /// the last six digits of the clock's millisecond timestamp.
    #[must_use]
    pub fn place(state: &StorefrontState, clock: &dyn Clock) -> Option<Order> {
        if state.active_order.is_empty() {
            return None;
        }

        let now = clock.now();
        Some(Order::new(
            OrderId::from_timestamp_millis(now.timestamp_millis()),
            state.active_order.clone(),
            now,
        ))
    }
}
