//! # Storefront Core
//!
//! The reducer contract behind the storefront.
//!
//! Every change to a shopping session goes through one [`reducer::Reducer`]:
//! it takes the current state and an action, mutates the state, and hands
//! back [`effect::Effect`] values describing the I/O the change needs. The
//! runtime crate decides when and where those effects run.
//!
//! Collaborators a reducer needs (time, storage) arrive through its
//! environment as trait objects, so tests swap them for fixed clocks and
//! in-memory stores.
//!
//! ```ignore
//! use storefront_core::{SmallVec, effect::Effect, reducer::Reducer};
//!
//! impl Reducer for CartReducer {
//!     type State = Vec<LineItem>;
//!     type Action = CartAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, lines: &mut Vec<LineItem>, action: CartAction, _: &()) -> SmallVec<[Effect<CartAction>; 4]> {
//!         if let CartAction::Clear = action {
//!             lines.clear();
//!         }
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Key-value persistence abstraction used by persistence effects
pub mod key_value;

/// State transitions
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// Owns every state transition of one feature
    ///
    /// `reduce` must be deterministic given its inputs. Anything that touches
    /// the outside world is returned as an [`Effect`] instead of performed.
    pub trait Reducer {
        /// State mutated in place
        type State;

        /// Inputs the reducer understands
        type Action;

        /// Injected collaborators available to effects
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// Never dispatches further actions directly. An effect that resolves
        /// to `Some(action)` is fed back by the runtime instead.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of side effects
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Work requested by a reducer, run later by the store
    ///
    /// A `Future` effect may resolve to an action, which re-enters the
    /// reducer like any other.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Children start together
        Parallel(Vec<Effect<Action>>),

        /// Each child starts after the previous one finished
        Sequential(Vec<Effect<Action>>),

        /// Async work, optionally producing a follow-up action
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Shorthand for [`Effect::Parallel`]
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Shorthand for [`Effect::Sequential`]
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Async work whose outcome the reducer does not care about
        #[must_use]
        pub fn fire_and_forget<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = ()> + Send + 'static,
        {
            Effect::Future(Box::pin(async move {
                fut.await;
                None
            }))
        }

        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Injected collaborators
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of "now" for order ids and timestamps
    pub trait Clock: Send + Sync {
        /// Current instant in UTC
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
