//! Bus-factor metric: contributor redundancy scaled by maintenance recency.
//!
//! Contributor and commit counts come from the code repository's
//! contributors endpoint when the code artifact is a GitHub repo; otherwise
//! conservative defaults of 1 apply. Recency decays exponentially from the
//! model's `lastModified` timestamp with a one-year half-life.

use super::{MetricOutcome, model_metadata};
use crate::Result;
use crate::fetch::{ArtifactLocation, EvalContext, contributors};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

const RECENCY_HALF_LIFE_DAYS: f64 = 365.0;

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

/// `0.5 * min(1, contributors/10) + 0.5 * min(1, commits/100)`.
fn base_score(contributor_count: u64, commit_count: u64) -> f64 {
    let contributor_score = (contributor_count as f64 / 10.0).min(1.0);
    let commit_score = (commit_count as f64 / 100.0).min(1.0);
    0.5 * contributor_score + 0.5 * commit_score
}

/// `exp(-ln 2 * days_since / 365)`; missing or unparsable timestamps score
/// a neutral 1.0.
fn recency_score(last_modified: Option<&str>, now: DateTime<Utc>) -> f64 {
    let Some(raw) = last_modified else {
        return 1.0;
    };
    let Ok(parsed) = DateTime::parse_from_rfc3339(raw) else {
        return 1.0;
    };
    let days = (now - parsed.with_timezone(&Utc)).num_days().max(0) as f64;
    (-(2.0_f64.ln()) * days / RECENCY_HALF_LIFE_DAYS).exp()
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let mut contributor_count = 1_u64;
    let mut commit_count = 1_u64;

    if let Some(code) = &ctx.bundle.code
        && let ArtifactLocation::GitHub { owner, repo } = code.location()
    {
        match contributors(&ctx.fetch, code.token(), owner, repo).await {
            Ok(list) if !list.is_empty() => {
                contributor_count = list.len() as u64;
                commit_count = list.iter().map(|c| c.contributions).sum::<u64>().max(1);
            }
            Ok(_) => {}
            Err(e) => log::debug!("bus_factor: contributor lookup failed: {e}"),
        }
    }

    let last_modified = model_metadata(ctx)
        .await
        .ok()
        .and_then(|meta| meta.get("lastModified").and_then(serde_json::Value::as_str).map(str::to_owned));

    let base = base_score(contributor_count, commit_count);
    let recency = recency_score(last_modified.as_deref(), Utc::now());
    let value = (base * recency).clamp(0.0, 1.0);

    Ok(MetricOutcome::scalar(value)
        .with_detail("contributors", contributor_count)
        .with_detail("commits", commit_count)
        .with_detail("last_modified", last_modified)
        .with_detail("base_score", base)
        .with_detail("recency_score", recency))
}
