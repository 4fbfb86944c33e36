//! Dataset-quality metric: documentation and structure signals from the
//! dataset snapshot.

use super::{MetricOutcome, MetricValue};
use crate::Result;
use crate::fetch::{EvalContext, RepoView, open_artifact};
use futures::future::BoxFuture;

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

/// Score the dataset snapshot. Signals sum to exactly 1.0.
fn score_view(view: &RepoView) -> Result<MetricOutcome> {
    let mut score = 0.0;
    let mut readme_len = 0;

    let readme_paths = view.glob("README*")?;
    if let Some(path) = readme_paths.first() {
        let text = view.read_text(&path.to_string_lossy())?;
        readme_len = text.len();
        score += 0.3;
        if readme_len >= 500 {
            score += 0.2;
        }
    }

    let has_info = view.exists("dataset_info.json");
    if has_info {
        score += 0.3;
    }

    let data_files = view.glob("data/*")?.len();
    if data_files > 0 {
        score += 0.2;
    }

    Ok(MetricOutcome {
        value: MetricValue::Scalar(score),
        details: serde_json::Map::new(),
    }
    .with_detail("readme_len", readme_len)
    .with_detail("has_dataset_info", has_info)
    .with_detail("data_files", data_files))
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let Some(dataset) = &ctx.bundle.dataset else {
        return Ok(MetricOutcome::scalar(0.0).with_detail("note", "no dataset provided"));
    };

    open_artifact(&ctx.fetch, dataset, |view| async move { score_view(&view) }).await
}
