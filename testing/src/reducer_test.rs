//! Given-When-Then runner for reducers
//!
//! Builds a scenario, reduces it synchronously and runs the recorded checks.
//! Effects are inspected as values; nothing is executed.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use storefront_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Reducer scenario under construction
///
/// Actions queued with [`ReducerTest::when_action`] are reduced in order
/// against the same state. Effect checks see the effects of the final action
/// only, so earlier actions act as setup.
///
/// ```ignore
/// use storefront_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(StorefrontReducer::new())
///     .with_env(test_environment())
///     .given_state(state_with_catalog())
///     .when_action(StorefrontAction::AddToOrder { product_id: "1".into(), quantity: 1 })
///     .when_action(StorefrontAction::AddToOrder { product_id: "1".into(), quantity: 2 })
///     .then_state(|state| assert_eq!(state.active_order[0].quantity, 3))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    given: Option<S>,
    script: Vec<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectCheck<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a scenario for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            script: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment handed to every reduction
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// Given: the state before the first action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// When: append one action
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.script.push(action);
        self
    }

    /// When: append actions in iteration order
    #[must_use]
    pub fn when_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
    {
        self.script.extend(actions);
        self
    }

    /// Then: check the final state
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Then: check the effects of the final action
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce the script and run every check
    ///
    /// # Panics
    ///
    /// Panics when the state, environment or script is missing, and whenever
    /// a check fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let Self {
            reducer,
            env,
            given,
            script,
            state_checks,
            effect_checks,
        } = self;

        let env = env.expect("call with_env() before run()");
        let mut state = given.expect("call given_state() before run()");
        assert!(!script.is_empty(), "call when_action() before run()");

        let last = script.into_iter().fold(Vec::new(), |_, action| {
            reducer.reduce(&mut state, action, &env).into_vec()
        });

        state_checks.into_iter().for_each(|check| check(&state));
        effect_checks.into_iter().for_each(|check| check(&last));
    }
}

/// Ready-made effect checks
pub mod assertions {
    use storefront_core::effect::Effect;

    /// Only `Effect::None`, or nothing at all
    ///
    /// # Panics
    ///
    /// Panics on any real effect.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "expected no effects, got {effects:?}"
        );
    }

    /// Exactly `expected` effects, `Effect::None` included
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected number of effects");
    }

    /// At least one `Effect::Future`
    ///
    /// # Panics
    ///
    /// Panics when no future effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "expected a future effect"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    enum Tally {
        Up,
        Down,
        Save,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = i32;
        type Action = Tally;
        type Environment = ();

        fn reduce(
            &self,
            count: &mut i32,
            action: Tally,
            _env: &(),
        ) -> SmallVec<[Effect<Tally>; 4]> {
            match action {
                Tally::Up => {
                    *count += 1;
                    smallvec![Effect::None]
                },
                Tally::Down => {
                    *count -= 1;
                    SmallVec::new()
                },
                Tally::Save => smallvec![Effect::fire_and_forget(async {})],
            }
        }
    }

    #[test]
    fn single_action_updates_state() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(0)
            .when_action(Tally::Up)
            .then_state(|count| assert_eq!(*count, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn script_reduces_in_order() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(5)
            .when_actions([Tally::Down, Tally::Down])
            .when_action(Tally::Up)
            .then_state(|count| assert_eq!(*count, 4))
            .run();
    }

    #[test]
    fn effects_come_from_final_action() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(0)
            .when_action(Tally::Save)
            .when_action(Tally::Up)
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effect_checks_accept_matching_effects() {
        assertions::assert_has_future_effect::<Tally>(&[Effect::fire_and_forget(async {})]);
        assertions::assert_no_effects::<Tally>(&[Effect::None]);
        assertions::assert_no_effects::<Tally>(&[]);
    }

    #[test]
    #[should_panic(expected = "call when_action() before run()")]
    fn empty_script_is_rejected() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(0)
            .run();
    }
}
