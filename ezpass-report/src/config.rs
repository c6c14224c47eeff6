//! Orchestrator configuration types
//!
//! The orchestrator needs very little: the worker pool size, how long to wait
//! for the report pipelines, and whether tables are written as they finish or
//! in fixed report order.

use crate::types::ReportKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a report run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Number of worker threads (at least one per report)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Overall wait for the report pipelines, in milliseconds (default: 5 minutes)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// When tables are written to the output
    #[serde(default)]
    pub output_order: OutputOrder,
}

fn default_workers() -> usize {
    3
}

fn default_timeout_ms() -> u64 {
    300_000
}

/// Order in which finished tables reach the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputOrder {
    /// Each table is written as soon as its pipeline finishes
    Completion,
    /// Tables are buffered and written as Transponders, Vehicles, Transactions
    #[default]
    Fixed,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_ms: default_timeout_ms(),
            output_order: OutputOrder::default(),
        }
    }
}

impl FetchConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the worker pool size
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Builder method: set the overall pipeline timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Builder method: set the output order
    pub fn with_output_order(mut self, order: OutputOrder) -> Self {
        self.output_order = order;
        self
    }

    /// Worker count, never below one thread per report
    ///
    /// Fewer threads would run some fetches one after another.
    pub fn worker_count(&self) -> usize {
        if self.workers < ReportKind::ALL.len() {
            log::warn!(
                "workers = {} is too few for {} concurrent reports, using {}",
                self.workers,
                ReportKind::ALL.len(),
                ReportKind::ALL.len()
            );
        }
        self.workers.max(ReportKind::ALL.len())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::new()
            .with_workers(4)
            .with_timeout(Duration::from_secs(30))
            .with_output_order(OutputOrder::Fixed);

        assert_eq!(config.workers, 4);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.output_order, OutputOrder::Fixed);
    }

    #[test]
    fn test_defaults() {
        let config = FetchConfig::new();
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.timeout_ms, 300_000);
        assert_eq!(config.output_order, OutputOrder::Fixed);
    }

    #[test]
    fn test_worker_count_covers_every_report() {
        assert_eq!(FetchConfig::new().with_workers(0).worker_count(), 3);
        assert_eq!(FetchConfig::new().with_workers(1).worker_count(), 3);
        assert_eq!(FetchConfig::new().with_workers(5).worker_count(), 5);
    }

    #[test]
    fn test_output_order_names() {
        let config: FetchConfig =
            serde_json::from_str(r#"{"output_order": "completion"}"#).unwrap();
        assert_eq!(config.output_order, OutputOrder::Completion);
        assert_eq!(config.workers, 3);

        let config: FetchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.output_order, OutputOrder::Fixed);
    }
}
