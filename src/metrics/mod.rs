//! Metric contract, registry, and scoring functions.
//!
//! A metric is a named async function of an [`EvalContext`] returning a
//! [`MetricOutcome`]. The registry is a compile-time-visible constant table —
//! no runtime discovery — and name uniqueness is verified once at startup
//! together with the net-score weight table.

mod bus_factor;
mod code_quality;
mod dataset_and_code;
mod dataset_quality;
mod engine;
mod license;
mod net_score;
mod performance_claims;
mod ramp_up_time;
mod result;
mod size_score;

pub use engine::{EngineOptions, evaluate};
pub use net_score::{NET_SCORE_WEIGHTS, aggregate, validate_weights};
pub use result::{MetricOutcome, MetricResult, MetricValue};

use crate::Result;
use crate::error::Error;
use crate::fetch::{ArtifactLocation, EvalContext, HfClient};
use futures::future::BoxFuture;
use std::collections::BTreeSet;

/// Scoring function contract: every registered metric implements this shape.
pub type MetricFn = for<'a> fn(&'a EvalContext) -> BoxFuture<'a, Result<MetricOutcome>>;

/// One registry entry. The name is used verbatim as the NDJSON field name.
#[derive(Debug)]
pub struct MetricDef {
    pub name: &'static str,
    pub description: &'static str,
    pub compute: MetricFn,
}

macro_rules! metric_def {
    ($name:expr, $description:expr, $module:ident) => {
        MetricDef {
            name: $name,
            description: $description,
            compute: $module::metric,
        }
    };
}

/// All registered metrics, in emission order.
pub const METRIC_DEFINITIONS: &[MetricDef] = &[
    metric_def!("ramp_up_time", "How quickly an engineer can start using the model", ramp_up_time),
    metric_def!("bus_factor", "Contributor redundancy and maintenance recency", bus_factor),
    metric_def!("performance_claims", "Evidence of benchmark or evaluation results", performance_claims),
    metric_def!("license", "License compatibility for commercial use", license),
    metric_def!("size_score", "Deployability of the model weights per device class", size_score),
    metric_def!(
        "dataset_and_code_score",
        "Availability of the training dataset and code",
        dataset_and_code
    ),
    metric_def!("dataset_quality", "Documentation and structure of the dataset", dataset_quality),
    metric_def!("code_quality", "Hygiene and popularity of the code repository", code_quality),
];

/// Look up a metric definition by canonical name.
#[must_use]
pub fn find(name: &str) -> Option<&'static MetricDef> {
    METRIC_DEFINITIONS.iter().find(|def| def.name == name)
}

/// Fetch the model's provider metadata. Only Hugging Face hosts a metadata
/// document rich enough for scoring; metrics that consume this fall back to
/// snapshot probing (or degrade) for models hosted elsewhere.
pub(crate) async fn model_metadata(ctx: &EvalContext) -> Result<serde_json::Value> {
    match ctx.bundle.model.location() {
        ArtifactLocation::HuggingFace { repo_id, repo_type } => {
            let client = HfClient::new(&ctx.fetch, ctx.bundle.model.token());
            client.metadata(*repo_type, repo_id, ctx.bundle.model.revision()).await
        }
        ArtifactLocation::GitHub { .. } | ArtifactLocation::GitLab { .. } => Err(Error::schema(
            ctx.bundle.model.url().as_str(),
            "model metadata is only available for Hugging Face-hosted models",
        )),
    }
}

/// Verify registry invariants: names must be unique and non-empty.
/// Run once at process start.
pub fn validate_registry() -> Result<()> {
    let mut seen = BTreeSet::new();
    for def in METRIC_DEFINITIONS {
        if def.name.is_empty() {
            return Err(Error::Invariant("metric with empty name".into()));
        }
        if !seen.insert(def.name) {
            return Err(Error::Invariant(format!("duplicate metric name: {}", def.name)));
        }
    }
    Ok(())
}
