//! License metric: how compatible the model's license is with commercial
//! use.
//!
//! The license id comes from the provider's metadata when available (the
//! `cardData.license` field or a `license:*` tag), otherwise from probing
//! `LICENSE`/`COPYING` files and README front matter in the snapshot.

use super::{MetricOutcome, model_metadata};
use crate::Result;
use crate::fetch::{EvalContext, open_artifact};
use futures::future::BoxFuture;

/// Score per recognized license id, most permissive first.
const LICENSE_SCORES: &[(&str, f64)] = &[
    ("mit", 1.0),
    ("apache-2.0", 0.95),
    ("bsd-2-clause", 0.95),
    ("bsd-3-clause", 0.95),
    ("mpl-2.0", 0.9),
    ("lgpl-2.1", 0.7),
    ("lgpl-3.0", 0.7),
    ("gpl-2.0", 0.35),
    ("gpl-3.0", 0.3),
    ("agpl-3.0", 0.25),
];

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

fn score_for(id: &str) -> Option<f64> {
    let id = id.trim().to_ascii_lowercase();
    LICENSE_SCORES.iter().find(|(name, _)| *name == id).map(|(_, score)| *score)
}

/// Pull a license id out of Hugging Face model metadata.
fn license_from_metadata(meta: &serde_json::Value) -> Option<String> {
    if let Some(id) = meta.pointer("/cardData/license").and_then(serde_json::Value::as_str) {
        return Some(id.to_owned());
    }
    meta.get("tags")?
        .as_array()?
        .iter()
        .filter_map(serde_json::Value::as_str)
        .find_map(|tag| tag.strip_prefix("license:").map(str::to_owned))
}

/// Guess a license id from the head of a LICENSE/COPYING file.
fn license_from_text(text: &str) -> Option<&'static str> {
    let head: String = text.chars().take(400).collect::<String>().to_ascii_lowercase();
    if head.contains("mit license") {
        Some("mit")
    } else if head.contains("apache license") {
        Some("apache-2.0")
    } else if head.contains("gnu affero") {
        Some("agpl-3.0")
    } else if head.contains("gnu lesser") {
        Some("lgpl-3.0")
    } else if head.contains("gnu general public license") {
        if head.contains("version 2") { Some("gpl-2.0") } else { Some("gpl-3.0") }
    } else if head.contains("mozilla public license") {
        Some("mpl-2.0")
    } else if head.contains("bsd") {
        Some("bsd-3-clause")
    } else {
        None
    }
}

/// Model cards declare their license in YAML front matter (`license: mit`).
fn license_from_front_matter(text: &str) -> Option<String> {
    text.lines()
        .take(40)
        .map(str::trim)
        .find_map(|line| line.strip_prefix("license:").map(|v| v.trim().to_owned()))
        .filter(|v| !v.is_empty())
}

async fn license_from_snapshot(ctx: &EvalContext) -> Result<Option<String>> {
    open_artifact(&ctx.fetch, &ctx.bundle.model, |view| async move {
        for pattern in ["LICENSE*", "COPYING*"] {
            for path in view.glob(pattern)? {
                let text = view.read_text(&path.to_string_lossy())?;
                if let Some(id) = license_from_text(&text) {
                    return Ok(Some(id.to_owned()));
                }
            }
        }
        for path in view.glob("README*")? {
            let text = view.read_text(&path.to_string_lossy())?;
            if let Some(id) = license_from_front_matter(&text) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    })
    .await
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let mut license = match model_metadata(ctx).await {
        Ok(meta) => license_from_metadata(&meta),
        Err(e) => {
            log::debug!("license: metadata lookup failed: {e}");
            None
        }
    };

    if license.is_none() {
        license = license_from_snapshot(ctx).await?;
    }

    let score = license.as_deref().and_then(score_for).unwrap_or(0.0);
    Ok(MetricOutcome::scalar(score).with_detail("license", license))
}
