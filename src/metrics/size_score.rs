//! Size metric: deployability of the model weights, one sub-score per
//! device class.
//!
//! Total weight bytes come from the hub's per-file blob sizes for Hugging
//! Face models (weight files are never downloaded), falling back to a
//! snapshot glob for models hosted elsewhere. Each device budget maps the
//! total linearly onto [0, 1]; no weight files at all scores 1.0 everywhere.

use super::MetricOutcome;
use crate::Result;
use crate::error::Error;
use crate::fetch::{ArtifactLocation, EvalContext, HfClient, open_artifact};
use futures::future::BoxFuture;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;

const GIB: u64 = 1024 * 1024 * 1024;

/// Weight budget per deployment-target class.
const DEVICE_BUDGETS: &[(&str, u64)] = &[
    ("raspberry_pi", GIB),
    ("jetson_nano", 4 * GIB),
    ("desktop_pc", 16 * GIB),
    ("aws_server", 128 * GIB),
];

/// File patterns counted as model weights.
const WEIGHT_PATTERNS: &[&str] = &[
    "*.safetensors",
    "*.bin",
    "*.pt",
    "*.pth",
    "*.onnx",
    "*.gguf",
    "*.h5",
    "*.msgpack",
    "*.ckpt",
];

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

fn weight_matcher() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in WEIGHT_PATTERNS {
        let glob = Glob::new(pattern).map_err(|e| Error::Pattern {
            pattern: (*pattern).to_owned(),
            message: e.to_string(),
        })?;
        let _ = builder.add(glob);
    }
    builder.build().map_err(|e| Error::Pattern {
        pattern: WEIGHT_PATTERNS.join(","),
        message: e.to_string(),
    })
}

/// `clamp(1 - total/budget)` per device; an absent payload deploys anywhere.
fn scores_for(total_bytes: u64) -> BTreeMap<String, f64> {
    DEVICE_BUDGETS
        .iter()
        .map(|(device, budget)| {
            let score = if total_bytes == 0 {
                1.0
            } else {
                (1.0 - total_bytes as f64 / *budget as f64).clamp(0.0, 1.0)
            };
            ((*device).to_owned(), score)
        })
        .collect()
}

/// Sum weight-file sizes from hub metadata (`?blobs=true` sibling sizes).
fn total_from_siblings(meta: &serde_json::Value, matcher: &GlobSet) -> (u64, u64) {
    let mut total = 0;
    let mut files = 0;
    if let Some(siblings) = meta.get("siblings").and_then(serde_json::Value::as_array) {
        for sibling in siblings {
            let Some(name) = sibling.get("rfilename").and_then(serde_json::Value::as_str) else {
                continue;
            };
            if !matcher.is_match(name) {
                continue;
            }
            if let Some(size) = sibling.get("size").and_then(serde_json::Value::as_u64) {
                total += size;
                files += 1;
            }
        }
    }
    (total, files)
}

async fn total_weight_bytes(ctx: &EvalContext) -> Result<(u64, u64)> {
    let matcher = weight_matcher()?;

    match ctx.bundle.model.location() {
        ArtifactLocation::HuggingFace { repo_id, repo_type } => {
            let client = HfClient::new(&ctx.fetch, ctx.bundle.model.token());
            let meta = client
                .metadata_with_files(*repo_type, repo_id, ctx.bundle.model.revision())
                .await?;
            Ok(total_from_siblings(&meta, &matcher))
        }
        ArtifactLocation::GitHub { .. } | ArtifactLocation::GitLab { .. } => {
            open_artifact(&ctx.fetch, &ctx.bundle.model, |view| async move {
                let mut total = 0;
                let mut files = 0;
                for pattern in WEIGHT_PATTERNS {
                    for path in view.glob(pattern)? {
                        total += view.size_bytes(&path.to_string_lossy())?;
                        files += 1;
                    }
                }
                Ok((total, files))
            })
            .await
        }
    }
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let (total, files) = total_weight_bytes(ctx).await?;
    Ok(MetricOutcome::per_target(scores_for(total))
        .with_detail("total_weight_bytes", total)
        .with_detail("weight_files", files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_weights_scores_one_everywhere() {
        let scores = scores_for(0);
        assert_eq!(scores.len(), DEVICE_BUDGETS.len());
        assert!(scores.values().all(|v| *v == 1.0));
    }

    #[test]
    fn test_small_model_fits_everywhere() {
        let scores = scores_for(1024 * 1024);
        for (device, score) in &scores {
            assert!(*score > 0.99, "{device} should accept a 1 MiB model, got {score}");
        }
    }

    #[test]
    fn test_large_model_excluded_from_small_devices() {
        // 8 GiB of weights: over the pi budget, partially over jetson.
        let scores = scores_for(8 * GIB);
        assert_eq!(scores["raspberry_pi"], 0.0);
        assert_eq!(scores["jetson_nano"], 0.0);
        assert!((scores["desktop_pc"] - 0.5).abs() < 1e-9);
        assert!(scores["aws_server"] > 0.9);
    }

    #[test]
    fn test_scores_bounded() {
        let scores = scores_for(u64::MAX / 2);
        assert!(scores.values().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_total_from_siblings_filters_weights() {
        let matcher = weight_matcher().unwrap();
        let meta = json!({"siblings": [
            {"rfilename": "model.safetensors", "size": 1000},
            {"rfilename": "pytorch_model.bin", "size": 500},
            {"rfilename": "README.md", "size": 99999},
            {"rfilename": "tokenizer.json", "size": 1234}
        ]});

        let (total, files) = total_from_siblings(&meta, &matcher);
        assert_eq!(total, 1500);
        assert_eq!(files, 2);
    }

    #[test]
    fn test_total_from_siblings_missing_sizes_skipped() {
        let matcher = weight_matcher().unwrap();
        let meta = json!({"siblings": [{"rfilename": "model.safetensors"}]});
        assert_eq!(total_from_siblings(&meta, &matcher), (0, 0));
    }

    #[test]
    fn test_total_without_siblings_is_zero() {
        let matcher = weight_matcher().unwrap();
        assert_eq!(total_from_siblings(&json!({}), &matcher), (0, 0));
    }

    #[test]
    fn test_weight_matcher_patterns() {
        let matcher = weight_matcher().unwrap();
        assert!(matcher.is_match("model.safetensors"));
        assert!(matcher.is_match("weights/shard-00001.bin"));
        assert!(matcher.is_match("model.onnx"));
        assert!(!matcher.is_match("config.json"));
        assert!(!matcher.is_match("README.md"));
    }
}
