//! Performance-claims metric: evidence that the model's quality has been
//! measured. Structured eval results (`model-index`) in the metadata are the
//! strongest signal; otherwise the README is scanned for benchmark language.

use super::{MetricOutcome, model_metadata};
use crate::Result;
use crate::fetch::{EvalContext, open_artifact};
use futures::future::BoxFuture;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(benchmarks?|evaluations?|accuracy|f1|bleu|rouge|perplexity|leaderboard|sota)\b").expect("keyword pattern is valid")
});

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

/// True when the metadata carries a non-empty `model-index` (structured eval
/// results on the hub).
fn has_model_index(meta: &serde_json::Value) -> bool {
    meta.pointer("/cardData/model-index")
        .and_then(serde_json::Value::as_array)
        .is_some_and(|entries| !entries.is_empty())
}

/// Bucketed score from README benchmark language.
fn keyword_score(readme: &str) -> MetricOutcome {
    let keywords: BTreeSet<String> = KEYWORD_RE
        .captures_iter(readme)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();

    let has_table = readme.contains("|---") || readme.contains("| ---");

    let mut score = match keywords.len() {
        0 => 0.0,
        1 | 2 => 0.4,
        _ => 0.7,
    };
    if has_table && score > 0.0 {
        score += 0.1;
    }

    MetricOutcome::scalar(score)
        .with_detail("keywords", keywords.len())
        .with_detail("has_results_table", has_table)
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    match model_metadata(ctx).await {
        Ok(meta) if has_model_index(&meta) => {
            return Ok(MetricOutcome::scalar(1.0).with_detail("source", "model-index"));
        }
        Ok(_) => {}
        Err(e) => log::debug!("performance_claims: metadata lookup failed: {e}"),
    }

    open_artifact(&ctx.fetch, &ctx.bundle.model, |view| async move {
        let mut readme = String::new();
        if let Some(path) = view.glob("README*")?.first() {
            readme = view.read_text(&path.to_string_lossy())?;
        }
        Ok(keyword_score(&readme))
    })
    .await
}
