//! Prometheus metrics for the store runtime.
//!
//! The [`Store`](crate::Store) records counters and histograms through the
//! `metrics` facade. Nothing is collected until a recorder is installed;
//! [`MetricsRecorder::install`] wires up an in-process Prometheus recorder
//! whose snapshot can be rendered on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use storefront_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = MetricsRecorder::install()?;
//! // ... run the store ...
//! println!("{}", recorder.render());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Counter: actions accepted by the store.
pub const ACTIONS_TOTAL: &str = "store_actions_total";
/// Counter: actions rejected because shutdown was in progress.
pub const ACTIONS_REJECTED_TOTAL: &str = "store_actions_rejected_total";
/// Histogram: time spent inside the reducer.
pub const REDUCER_DURATION_SECONDS: &str = "store_reducer_duration_seconds";
/// Counter: effects handed to the executor, labelled by `type`.
pub const EFFECTS_EXECUTED_TOTAL: &str = "store_effects_executed_total";
/// Counter: effect tasks that panicked.
pub const EFFECTS_PANICKED_TOTAL: &str = "store_effects_panicked_total";

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Handle to the installed Prometheus recorder.
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// Install the global Prometheus recorder and describe the store metrics.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built, or if a
    /// global recorder was already installed in this process.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_1, 0.001, 0.01, 0.1, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        tracing::info!("Prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder").finish_non_exhaustive()
    }
}

fn register_metrics() {
    describe_counter!(ACTIONS_TOTAL, "Total number of actions processed by the store");
    describe_counter!(
        ACTIONS_REJECTED_TOTAL,
        "Actions rejected because the store was shutting down"
    );
    describe_histogram!(REDUCER_DURATION_SECONDS, "Time taken to execute the reducer");
    describe_counter!(EFFECTS_EXECUTED_TOTAL, "Total number of effects executed");
    describe_counter!(EFFECTS_PANICKED_TOTAL, "Effect tasks that panicked");
}
