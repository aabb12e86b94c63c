//! # Storefront Testing
//!
//! Test doubles and harnesses shared by the storefront crates: a clock that
//! never moves, an in-memory key-value store that can be told to fail, and a
//! Given-When-Then runner for reducers.
//!
//! ```ignore
//! use storefront_testing::{InMemoryKeyValueStore, test_clock};
//!
//! let storage = InMemoryKeyValueStore::new();
//! let env = StorefrontEnvironment::new(Arc::new(storage.clone()), Arc::new(test_clock()));
//! let store = Store::new(StorefrontState::default(), StorefrontReducer::new(), env);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use storefront_core::environment::Clock;

/// In-memory key-value storage with switchable failures
pub mod key_value_mocks;

/// Given-When-Then harness for reducers
pub mod reducer_test;

/// Environment doubles
pub mod mocks {
    use super::{Clock, DateTime, TimeZone, Utc};

    /// Clock frozen at one instant
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    ///
    /// let clock = FixedClock::at_millis(1_735_689_654_321);
    /// assert_eq!(clock.now(), clock.now());
    /// assert_eq!(clock.now().timestamp_millis(), 1_735_689_654_321);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Freeze at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Freeze at a Unix timestamp in milliseconds
        ///
        /// Out-of-range values clamp to the Unix epoch.
        #[must_use]
        pub fn at_millis(millis: i64) -> Self {
            Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock used across the test suites: 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

pub use key_value_mocks::InMemoryKeyValueStore;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
