//! Weighted aggregation of metric results into the net score.

use super::{METRIC_DEFINITIONS, MetricResult, MetricValue};
use crate::Result;
use crate::error::Error;
use std::collections::BTreeMap;
use std::time::Instant;

/// Fixed weight applied to each metric when folding into the net score.
/// Weights sum to 1.0 and the names mirror the registry.
pub const NET_SCORE_WEIGHTS: &[(&str, f64)] = &[
    ("license", 0.20),
    ("ramp_up_time", 0.15),
    ("bus_factor", 0.15),
    ("dataset_and_code_score", 0.10),
    ("dataset_quality", 0.10),
    ("code_quality", 0.10),
    ("performance_claims", 0.10),
    ("size_score", 0.10),
];

/// Verify the weight table: it must sum to 1.0 and reference only registered
/// metric names, each at most once. Run once at process start.
pub fn validate_weights() -> Result<()> {
    let sum: f64 = NET_SCORE_WEIGHTS.iter().map(|(_, w)| w).sum();
    if (sum - 1.0).abs() > 1e-9 {
        return Err(Error::Invariant(format!("net-score weights sum to {sum}, expected 1.0")));
    }

    let mut seen = std::collections::BTreeSet::new();
    for (name, weight) in NET_SCORE_WEIGHTS {
        if !seen.insert(name) {
            return Err(Error::Invariant(format!("duplicate weight entry: {name}")));
        }
        if METRIC_DEFINITIONS.iter().all(|def| def.name != *name) {
            return Err(Error::Invariant(format!("weight entry for unknown metric: {name}")));
        }
        if !(0.0..=1.0).contains(weight) {
            return Err(Error::Invariant(format!("weight for {name} out of range: {weight}")));
        }
    }
    Ok(())
}

fn mean(values: &BTreeMap<String, f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let len = values.len() as f64;
    values.values().sum::<f64>() / len
}

/// Fold metric results into the weighted net score.
///
/// A scalar contributes `weight * value`; a per-target map contributes
/// `weight * mean(values)`; a metric absent from the results contributes
/// `weight * 0`. Result names outside the table are ignored. The reported
/// latency covers this fold alone, not the constituent metrics.
#[must_use]
pub fn aggregate(results: &BTreeMap<&'static str, MetricResult>) -> MetricResult {
    let start = Instant::now();

    let mut total = 0.0;
    for (name, weight) in NET_SCORE_WEIGHTS {
        let Some(result) = results.get(name) else {
            continue;
        };
        total += weight
            * match &result.value {
                MetricValue::Scalar(v) => *v,
                MetricValue::PerTarget(map) => mean(map),
            };
    }

    MetricResult {
        name: "net_score",
        value: MetricValue::Scalar(total.clamp(0.0, 1.0)),
        latency: start.elapsed(),
        details: serde_json::Map::new(),
    }
}
