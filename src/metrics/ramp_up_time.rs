//! Ramp-up metric: how quickly an engineer could start using the model,
//! estimated from documentation signals in the snapshot.

use super::{MetricOutcome, MetricValue};
use crate::Result;
use crate::fetch::{EvalContext, RepoView, open_artifact};
use futures::future::BoxFuture;
use regex::Regex;
use std::sync::LazyLock;

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(usage|quick\s*start|getting\s+started|how\s+to\s+use|examples?)\b").expect("section pattern is valid")
});

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

fn first_readme(view: &RepoView) -> Result<Option<String>> {
    match view.glob("README*")?.first() {
        Some(path) => view.read_text(&path.to_string_lossy()).map(Some),
        None => Ok(None),
    }
}

/// Score documentation readiness signals. Signals sum to exactly 1.0.
fn score_signals(readme: Option<&str>, has_manifest: bool) -> MetricOutcome {
    let mut score = 0.0;
    let mut readme_len = 0;
    let mut has_sections = false;
    let mut has_code_fence = false;

    if let Some(text) = readme {
        readme_len = text.len();
        score += 0.3;
        if readme_len >= 300 {
            score += 0.1;
        }
        if readme_len >= 1500 {
            score += 0.1;
        }
        if SECTION_RE.is_match(text) {
            has_sections = true;
            score += 0.25;
        }
        if text.contains("```") {
            has_code_fence = true;
            score += 0.15;
        }
    }
    if has_manifest {
        score += 0.1;
    }

    MetricOutcome {
        value: MetricValue::Scalar(score),
        details: serde_json::Map::new(),
    }
    .with_detail("readme_len", readme_len)
    .with_detail("has_usage_sections", has_sections)
    .with_detail("has_code_fence", has_code_fence)
    .with_detail("has_manifest", has_manifest)
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    open_artifact(&ctx.fetch, &ctx.bundle.model, |view| async move {
        let readme = first_readme(&view)?;
        let has_manifest = view.exists("config.json") || view.exists("model_index.json");
        Ok(score_signals(readme.as_deref(), has_manifest))
    })
    .await
}
