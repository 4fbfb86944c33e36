//! Dataset-and-code metric: are the training dataset and the code
//! repository available alongside the model? Each reachable resource is
//! worth half the score.

use super::MetricOutcome;
use crate::Result;
use crate::fetch::{ArtifactRef, EvalContext, FetchOptions, probe_artifact};
use futures::future::BoxFuture;

pub(super) fn metric(ctx: &EvalContext) -> BoxFuture<'_, Result<MetricOutcome>> {
    Box::pin(compute(ctx))
}

async fn reachable(options: &FetchOptions, artifact: Option<&ArtifactRef>) -> bool {
    match artifact {
        Some(artifact) => match probe_artifact(options, artifact).await {
            Ok(()) => true,
            Err(e) => {
                log::debug!("dataset_and_code: probe failed for {artifact}: {e}");
                false
            }
        },
        None => false,
    }
}

async fn compute(ctx: &EvalContext) -> Result<MetricOutcome> {
    let dataset_available = reachable(&ctx.fetch, ctx.bundle.dataset.as_ref()).await;
    let code_available = reachable(&ctx.fetch, ctx.bundle.code.as_ref()).await;

    let mut score = 0.0;
    if dataset_available {
        score += 0.5;
    }
    if code_available {
        score += 0.5;
    }

    Ok(MetricOutcome::scalar(score)
        .with_detail("dataset_available", dataset_available)
        .with_detail("code_available", code_available))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{AuthTokens, ResourceBundle, RetryPolicy};
    use crate::metrics::MetricValue;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx_for(server: &MockServer, line: &str) -> EvalContext {
        let bundle = ResourceBundle::from_line(line, &AuthTokens::default()).unwrap();
        let fetch = FetchOptions::new(
            RetryPolicy {
                max_retries: 0,
                backoff_base: core::time::Duration::ZERO,
            },
            core::time::Duration::from_secs(5),
        )
        .unwrap()
        .with_hugging_face_base(server.uri())
        .with_github_api(server.uri());
        EvalContext { bundle, fetch }
    }

    #[tokio::test]
    async fn test_model_only_scores_zero() {
        let server = MockServer::start().await;
        let ctx = ctx_for(&server, "https://huggingface.co/org/model");

        let outcome = compute(&ctx).await.unwrap();
        assert_eq!(outcome.value, MetricValue::Scalar(0.0));
        assert_eq!(outcome.details["dataset_available"], false);
        assert_eq!(outcome.details["code_available"], false);
    }

    #[tokio::test]
    async fn test_reachable_dataset_and_code_score_full() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasets/org/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/org/code"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/models/org/model"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let line = "https://github.com/org/code,https://huggingface.co/datasets/org/data,https://huggingface.co/org/model";
        let ctx = ctx_for(&server, line);

        let outcome = compute(&ctx).await.unwrap();
        assert_eq!(outcome.value, MetricValue::Scalar(1.0));
    }

    #[tokio::test]
    async fn test_unreachable_dataset_degrades_gracefully() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/datasets/org/data"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/org/code"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let line = "https://github.com/org/code,https://huggingface.co/datasets/org/data,https://huggingface.co/org/model";
        let ctx = ctx_for(&server, line);

        let outcome = compute(&ctx).await.unwrap();
        assert_eq!(outcome.value, MetricValue::Scalar(0.5));
        assert_eq!(outcome.details["dataset_available"], false);
        assert_eq!(outcome.details["code_available"], true);
    }
}
