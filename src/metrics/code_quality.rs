//! Code-quality metric: popularity of the code repository averaged with
//! static hygiene signals from its snapshot (tests, CI, build manifests,
//! documentation).

use super::{MetricOutcome, MetricValue};
use crate::Result;
use crate::fetch::{EvalContext, RepoView, star_count, open_artifact};
use futures::future::BoxFuture;

/// Build/lint manifests that indicate a maintained project setup.
const MANIFEST_FILES: &[&str] = &["requirements.txt", "pyproject.toml", "setup.py", "package.json", "Cargo.toml"];

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

/// Popularity buckets: no stars 0.0, under fifty 0.5, otherwise 1.0.
fn stars_score(stars: u64) -> f64 {
    if stars == 0 {
        0.0
    } else if stars < 50 {
        0.5
    } else {
        1.0
    }
}

struct Hygiene {
    has_tests: bool,
    has_readme: bool,
    has_ci: bool,
    has_manifest: bool,
}

impl Hygiene {
    /// Project layout: tests and documentation.
    fn structure_score(&self) -> f64 {
        f64::from(u8::from(self.has_tests) + u8::from(self.has_readme)) * 0.5
    }

    /// Automation: CI configuration and a build manifest.
    fn tooling_score(&self) -> f64 {
        f64::from(u8::from(self.has_ci) + u8::from(self.has_manifest)) * 0.5
    }
}

fn inspect(view: &RepoView) -> Result<Hygiene> {
    let has_tests = view.exists("tests") || view.exists("test") || !view.glob("test_*.py")?.is_empty();
    let has_readme = !view.glob("README*")?.is_empty();
    let has_ci = view.exists(".github/workflows") || view.exists(".gitlab-ci.yml") || view.exists(".travis.yml");
    let has_manifest = MANIFEST_FILES.iter().any(|f| view.exists(f));

    Ok(Hygiene {
        has_tests,
        has_readme,
        has_ci,
        has_manifest,
    })
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let Some(code) = &ctx.bundle.code else {
        return Ok(MetricOutcome::scalar(0.0).with_detail("note", "no code repository provided"));
    };

    let stars = match star_count(&ctx.fetch, code).await {
        Ok(stars) => stars,
        Err(e) => {
            log::debug!("code_quality: star lookup failed for {code}: {e}");
            0
        }
    };

    let hygiene = open_artifact(&ctx.fetch, code, |view| async move { inspect(&view) }).await?;

    let structure = hygiene.structure_score();
    let tooling = hygiene.tooling_score();
    let popularity = stars_score(stars);
    let score = (structure + tooling + popularity) / 3.0;

    Ok(MetricOutcome {
        value: MetricValue::Scalar(score),
        details: serde_json::Map::new(),
    }
    .with_detail("stars", stars)
    .with_detail("structure_score", structure)
    .with_detail("tooling_score", tooling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stars_buckets() {
        assert_eq!(stars_score(0), 0.0);
        assert_eq!(stars_score(1), 0.5);
        assert_eq!(stars_score(49), 0.5);
        assert_eq!(stars_score(50), 1.0);
        assert_eq!(stars_score(100_000), 1.0);
    }

    #[test]
    fn test_inspect_empty_repo() {
        let dir = tempfile::tempdir().unwrap();
        let hygiene = inspect(&RepoView::new(dir.path())).unwrap();
        assert_eq!(hygiene.structure_score(), 0.0);
        assert_eq!(hygiene.tooling_score(), 0.0);
    }

    #[test]
    fn test_inspect_full_hygiene() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        fs::create_dir_all(dir.path().join(".github/workflows")).unwrap();
        fs::write(dir.path().join("README.md"), "# proj").unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[project]").unwrap();

        let hygiene = inspect(&RepoView::new(dir.path())).unwrap();
        assert_eq!(hygiene.structure_score(), 1.0);
        assert_eq!(hygiene.tooling_score(), 1.0);
    }

    #[test]
    fn test_inspect_pytest_files_count_as_tests() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test_app.py"), "def test(): pass").unwrap();

        let hygiene = inspect(&RepoView::new(dir.path())).unwrap();
        assert!(hygiene.has_tests);
    }

    #[test]
    fn test_inspect_gitlab_ci_detected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitlab-ci.yml"), "stages: []").unwrap();

        let hygiene = inspect(&RepoView::new(dir.path())).unwrap();
        assert!(hygiene.has_ci);
    }

    #[tokio::test]
    async fn test_no_code_scores_zero_with_note() {
        use crate::fetch::{AuthTokens, FetchOptions, ResourceBundle, RetryPolicy};

        let bundle = ResourceBundle::from_line("https://huggingface.co/org/model", &AuthTokens::default()).unwrap();
        let fetch = FetchOptions::new(
            RetryPolicy {
                max_retries: 0,
                backoff_base: core::time::Duration::ZERO,
            },
            core::time::Duration::from_secs(1),
        )
        .unwrap();
        let ctx = EvalContext { bundle, fetch };

        let outcome = compute(&ctx).await.unwrap();
        assert_eq!(outcome.value, MetricValue::Scalar(0.0));
        assert_eq!(outcome.details["note"], "no code repository provided");
    }
}
