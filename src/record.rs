//! NDJSON record assembly.
//!
//! One evaluation produces one flat JSON object: identity fields first, then
//! the net score, then every metric value under its canonical name with a
//! `<name>_latency` integer-millisecond companion. Field order follows the
//! registry so records diff cleanly between runs.

use crate::fetch::ArtifactKind;
use crate::metrics::{METRIC_DEFINITIONS, MetricResult};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

fn insert_metric(out: &mut Map<String, Value>, result: &MetricResult) {
    let value = serde_json::to_value(&result.value).unwrap_or(Value::Null);
    let _ = out.insert(result.name.to_owned(), value);
    let _ = out.insert(format!("{}_latency", result.name), json!(result.latency_ms()));
}

/// Flatten one evaluation into the emitted NDJSON object.
#[must_use]
pub fn flatten_record(
    name: &str,
    category: ArtifactKind,
    results: &BTreeMap<&'static str, MetricResult>,
    net: &MetricResult,
) -> Value {
    let mut out = Map::new();
    let _ = out.insert("name".to_owned(), json!(name));
    let _ = out.insert("category".to_owned(), json!(category.to_string()));

    insert_metric(&mut out, net);

    for def in METRIC_DEFINITIONS {
        if let Some(result) = results.get(def.name) {
            insert_metric(&mut out, result);
        }
    }

    Value::Object(out)
}
