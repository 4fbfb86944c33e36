//! Failure-isolated execution of registered metrics.
//!
//! Each metric runs in its own wrapper that measures latency, clamps the
//! returned value into [0, 1], and converts errors and panics into a `0.0`
//! result with a diagnostic detail. A failing metric can never abort the
//! evaluation or disturb its siblings. The engine blocks until every
//! dispatched metric has completed; no metric is dropped.

use super::{METRIC_DEFINITIONS, MetricDef, MetricOutcome, MetricResult, MetricValue};
use crate::fetch::EvalContext;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Execution configuration for one `evaluate` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Run metrics one at a time instead of on the worker pool.
    pub sequential: bool,
}

/// Run registered metrics against the context and return results keyed by
/// metric name. `selected = None` runs everything; unknown names in
/// `selected` are silently ignored.
pub async fn evaluate(ctx: &EvalContext, selected: Option<&[&str]>, options: EngineOptions) -> BTreeMap<&'static str, MetricResult> {
    evaluate_defs(METRIC_DEFINITIONS, ctx, selected, options).await
}

pub(crate) async fn evaluate_defs(
    defs: &'static [MetricDef],
    ctx: &EvalContext,
    selected: Option<&[&str]>,
    options: EngineOptions,
) -> BTreeMap<&'static str, MetricResult> {
    let chosen: Vec<&'static MetricDef> = defs
        .iter()
        .filter(|def| selected.is_none_or(|names| names.contains(&def.name)))
        .collect();

    log::debug!("running {} metrics ({})", chosen.len(), if options.sequential { "sequential" } else { "parallel" });

    let mut results = BTreeMap::new();

    if options.sequential {
        for def in chosen {
            let result = run_metric(def, ctx).await;
            let _ = results.insert(def.name, result);
        }
        return results;
    }

    // One task per metric, bounded by a pool sized to available parallelism.
    // Each task owns its context clone and returns its own result; the engine
    // joins them all before producing the mapping.
    let permits = std::thread::available_parallelism().map_or(4, NonZeroUsize::get);
    let pool = Arc::new(Semaphore::new(permits));
    let mut tasks = tokio::task::JoinSet::new();

    for def in chosen {
        let ctx = ctx.clone();
        let pool = Arc::clone(&pool);
        let _abort_handle = tasks.spawn(async move {
            let _permit = pool.acquire_owned().await.ok();
            (def.name, run_metric(def, &ctx).await)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, result)) => {
                let _ = results.insert(name, result);
            }
            Err(e) => log::warn!("metric task failed to join: {e}"),
        }
    }

    results
}

/// Run one metric with timing, clamping, and error capture. Always returns a
/// result, even on failure (value 0.0 and `details.error` set).
async fn run_metric(def: &'static MetricDef, ctx: &EvalContext) -> MetricResult {
    let start = Instant::now();
    log::debug!("metric {}: start", def.name);

    let outcome = AssertUnwindSafe((def.compute)(ctx)).catch_unwind().await;
    let latency = start.elapsed();

    match outcome {
        Ok(Ok(raw)) => {
            let (value, details) = normalize(raw, def.name);
            log::debug!("metric {}: ok latency_ms={}", def.name, latency.as_millis());
            MetricResult {
                name: def.name,
                value,
                latency,
                details,
            }
        }
        Ok(Err(err)) => {
            log::info!("metric {}: error {err} ({} ms)", def.name, latency.as_millis());
            failure_result(def.name, latency, format!("{}: {err}", err.kind()))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::info!("metric {}: panicked: {message}", def.name);
            failure_result(def.name, latency, format!("panic: {message}"))
        }
    }
}

fn failure_result(name: &'static str, latency: core::time::Duration, error: String) -> MetricResult {
    let mut details = serde_json::Map::new();
    let _ = details.insert("error".to_owned(), serde_json::Value::String(error));
    MetricResult {
        name,
        value: MetricValue::Scalar(0.0),
        latency,
        details,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Clamp every produced score into [0, 1]; non-finite values (the invalid
/// shape in a typed language) are neutralized to 0.0 with a details note.
fn normalize(outcome: MetricOutcome, name: &str) -> (MetricValue, serde_json::Map<String, serde_json::Value>) {
    let mut details = outcome.details;
    let mut neutralized = false;

    let mut clamp = |v: f64| -> f64 {
        if v.is_finite() {
            v.clamp(0.0, 1.0)
        } else {
            neutralized = true;
            0.0
        }
    };

    let value = match outcome.value {
        MetricValue::Scalar(v) => MetricValue::Scalar(clamp(v)),
        MetricValue::PerTarget(map) => MetricValue::PerTarget(map.into_iter().map(|(k, v)| (k, clamp(v))).collect()),
    };

    if neutralized {
        log::info!("metric {name}: non-finite value forced to 0.0");
        let _ = details.insert(
            "normalization".to_owned(),
            serde_json::Value::String("non-finite value forced to 0.0".to_owned()),
        );
    }

    (value, details)
}
