//! # Storefront Runtime
//!
//! [`Store`] is the imperative shell around a [`Reducer`]. It serializes
//! actions through the reducer, publishes each processed action to
//! subscribers, and runs the returned effects on the tokio runtime, feeding
//! any action they produce back through [`Store::send`].
//!
//! ```ignore
//! let store = Store::new(StorefrontState::default(), StorefrontReducer::new(), env);
//! let mut handle = store.send(StorefrontAction::ClearOrder).await?;
//! handle.wait().await;
//! let lines = store.state(|s| s.active_order.len()).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use storefront_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, watch};

/// Store metrics and the Prometheus recorder
pub mod metrics;

/// Store lifecycle errors
pub mod error {
    use thiserror::Error;

    /// Reducers never fail, so only the store's lifecycle can.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// `send()` after `shutdown()` started
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects still running when the shutdown deadline passed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),
    }
}

pub use error::StoreError;

/// Completion tracker for the effects spawned by one `send()`
///
/// State has already changed when the handle is returned. Waiting only
/// covers the effects, such as a pending write of the order history.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Effects of this action not yet finished
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Resolve once every effect of this action finished
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Sender gone: no guard left to report.
                break;
            }
        }
    }

    /// [`EffectHandle::wait`] bounded by `timeout`
    ///
    /// # Errors
    ///
    /// `Err(())` when the deadline passes first.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Per-action counter shared by its effect guards
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Releases one slot in both counters when the effect task ends, panics included
struct EffectGuard {
    tracking: EffectTracking,
    pending: Arc<AtomicUsize>,
}

impl Drop for EffectGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.tracking.decrement();
    }
}

/// The store
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, Duration, Effect, EffectGuard, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreError,
    };
    use crate::metrics::{
        ACTIONS_REJECTED_TOTAL, ACTIONS_TOTAL, EFFECTS_EXECUTED_TOTAL, EFFECTS_PANICKED_TOTAL,
        REDUCER_DURATION_SECONDS,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::broadcast;

    type EffectFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Single owner of one session's state
    ///
    /// Clones share state, shutdown flag and subscribers. Readers go through
    /// [`Store::state`]; writers only through [`Store::send`].
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action the reducer processed, in processing order.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Store whose subscribers may fall up to 64 actions behind
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Store with an explicit subscriber buffer
        ///
        /// # Panics
        ///
        /// Panics if `capacity` is zero.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Effects running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Receiver for every action processed after this call
        ///
        /// Views re-render on each received action.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Reduce `action` and spawn its effects
        ///
        /// The reducer runs under the state write lock and the action is
        /// published before the lock drops, so subscribers observe actions in
        /// the order they were applied. Effects start after the lock is
        /// released; the returned handle tracks them.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownInProgress`] once shutdown started.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!(ACTIONS_REJECTED_TOTAL).increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!(ACTIONS_TOTAL).increment(1);
            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let start = std::time::Instant::now();
                let effects = self
                    .reducer
                    .reduce(&mut *state, action.clone(), &self.environment);
                metrics::histogram!(REDUCER_DURATION_SECONDS)
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!(effects = effects.len(), "Action reduced");

                // No receivers is not an error.
                let _ = self.action_broadcast.send(action);
                effects
            };

            for effect in effects {
                self.spawn_effect(effect, &tracking);
            }

            Ok(handle)
        }

        /// Project the current state through `f`
        ///
        /// ```ignore
        /// let line_count = store.state(|s| s.active_order.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Reject further actions, then drain running effects
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownTimeout`] with the number of effects left when
        /// `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!(?timeout, "Store shutting down");
            self.shutdown.store(true, Ordering::Release);

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("Store drained");
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::error!(pending_effects = pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        }

        /// One task per top-level effect; `Effect::None` spawns nothing
        fn spawn_effect(&self, effect: Effect<A>, tracking: &EffectTracking) {
            if effect.is_none() {
                metrics::counter!(EFFECTS_EXECUTED_TOTAL, "type" => "none").increment(1);
                return;
            }

            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = EffectGuard {
                tracking: tracking.clone(),
                pending: Arc::clone(&self.pending_effects),
            };

            let work = self.run_effect(effect);
            let task = tokio::spawn(async move {
                let _guard = guard;
                work.await;
            });

            tokio::spawn(async move {
                if let Err(error) = task.await {
                    if error.is_panic() {
                        metrics::counter!(EFFECTS_PANICKED_TOTAL).increment(1);
                        tracing::error!(error = %error, "Effect task panicked");
                    }
                }
            });
        }

        /// Future performing `effect`, children included
        fn run_effect(&self, effect: Effect<A>) -> EffectFuture {
            match effect {
                Effect::None => Box::pin(async {}),
                Effect::Future(fut) => {
                    metrics::counter!(EFFECTS_EXECUTED_TOTAL, "type" => "future").increment(1);
                    let store = self.clone();
                    Box::pin(async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Feeding effect output back");
                            if let Err(error) = store.send(action).await {
                                tracing::warn!(error = %error, "Dropped feedback action");
                            }
                        }
                    })
                },
                Effect::Parallel(effects) => {
                    metrics::counter!(EFFECTS_EXECUTED_TOTAL, "type" => "parallel").increment(1);
                    let work: Vec<_> = effects.into_iter().map(|e| self.run_effect(e)).collect();
                    Box::pin(async move {
                        futures::future::join_all(work).await;
                    })
                },
                Effect::Sequential(effects) => {
                    metrics::counter!(EFFECTS_EXECUTED_TOTAL, "type" => "sequential")
                        .increment(1);
                    let work: Vec<_> = effects.into_iter().map(|e| self.run_effect(e)).collect();
                    Box::pin(async move {
                        for step in work {
                            step.await;
                        }
                    })
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
