//! Metric value and result types.

use core::time::Duration;
use serde::Serialize;
use std::collections::BTreeMap;

/// Value produced by a metric: a single score, or one sub-score per
/// deployment target (the size metric).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    PerTarget(BTreeMap<String, f64>),
}

impl MetricValue {
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::PerTarget(_) => None,
        }
    }
}

/// What a metric implementation returns, before the engine normalizes it.
#[derive(Debug, Clone)]
pub struct MetricOutcome {
    pub value: MetricValue,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl MetricOutcome {
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        Self {
            value: MetricValue::Scalar(value),
            details: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn per_target(values: BTreeMap<String, f64>) -> Self {
        Self {
            value: MetricValue::PerTarget(values),
            details: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let _ = self.details.insert(key.to_owned(), value.into());
        self
    }
}

/// One metric's final, normalized result. Immutable after creation.
#[derive(Debug, Clone)]
pub struct MetricResult {
    pub name: &'static str,
    pub value: MetricValue,
    pub latency: Duration,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl MetricResult {
    /// Latency in whole milliseconds, as emitted in NDJSON records.
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX)
    }
}
