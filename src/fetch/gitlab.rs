//! GitLab fetcher: ref-scoped archive download plus project metadata.

use super::artifact::{ArtifactLocation, ArtifactRef};
use super::{FetchOptions, descend_single_dir, unpack_tar_gz};
use crate::Result;
use crate::error::Error;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Minimal project info with only the fields we need.
#[derive(Debug, Deserialize)]
pub(crate) struct Project {
    pub default_branch: Option<String>,
    pub star_count: Option<u64>,
}

/// GitLab authenticates with a `PRIVATE-TOKEN` header rather than a bearer
/// token.
fn gitlab_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(t) = token {
        match HeaderValue::from_str(t) {
            Ok(mut value) => {
                value.set_sensitive(true);
                let _ = headers.insert(HeaderName::from_static("private-token"), value);
            }
            Err(_) => log::warn!("ignoring auth token with invalid header characters"),
        }
    }
    headers
}

/// Percent-encode a (possibly nested) project namespace for use as a single
/// path segment, `group/sub/proj` becoming `group%2Fsub%2Fproj`.
fn encoded_namespace(namespace: &str) -> String {
    utf8_percent_encode(namespace, NON_ALPHANUMERIC).to_string()
}

/// Fetch project metadata.
pub(crate) async fn project(options: &FetchOptions, token: Option<&str>, namespace: &str) -> Result<Project> {
    let url = format!("{}/projects/{}", options.gitlab_api, encoded_namespace(namespace));
    let body = options.http.get(&url, gitlab_headers(token)).await?;
    serde_json::from_slice(&body).map_err(|e| Error::schema(&url, e.to_string()))
}

/// Resolve the default branch, falling back to `main` on any failure.
async fn default_branch(options: &FetchOptions, token: Option<&str>, namespace: &str) -> String {
    match project(options, token, namespace).await {
        Ok(info) => info.default_branch.unwrap_or_else(|| "main".to_owned()),
        Err(e) => {
            log::debug!("default-branch lookup failed for {namespace}: {e}; assuming \"main\"");
            "main".to_owned()
        }
    }
}

/// Download the project's `archive.tar.gz` for the artifact's ref into
/// `dest` and return the snapshot root.
pub(crate) async fn fetch_into(options: &FetchOptions, artifact: &ArtifactRef, dest: &Path) -> Result<PathBuf> {
    let ArtifactLocation::GitLab { namespace } = artifact.location() else {
        return Err(Error::unsupported(artifact.url().as_str()));
    };

    let git_ref = match artifact.revision() {
        Some(rev) => rev.to_owned(),
        None => default_branch(options, artifact.token(), namespace).await,
    };

    let url = format!(
        "{}/projects/{}/repository/archive.tar.gz?sha={git_ref}",
        options.gitlab_api,
        encoded_namespace(namespace)
    );
    log::debug!("fetching GitLab archive {url}");
    let body = options.http.get(&url, gitlab_headers(artifact.token())).await?;

    unpack_tar_gz(&body, dest)?;
    Ok(descend_single_dir(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_options(server: &MockServer) -> FetchOptions {
        FetchOptions::new(
            super::super::RetryPolicy {
                max_retries: 0,
                backoff_base: core::time::Duration::ZERO,
            },
            core::time::Duration::from_secs(5),
        )
        .unwrap()
        .with_gitlab_api(server.uri())
    }

    #[test]
    fn test_encoded_namespace_escapes_slashes() {
        assert_eq!(encoded_namespace("group/subgroup/proj"), "group%2Fsubgroup%2Fproj");
    }

    #[test]
    fn test_project_deserialize() {
        let json = r#"{"default_branch": "master", "star_count": 7}"#;
        let info: Project = serde_json::from_str(json).unwrap();
        assert_eq!(info.default_branch.as_deref(), Some("master"));
        assert_eq!(info.star_count, Some(7));
    }

    #[test]
    fn test_gitlab_headers_private_token() {
        let headers = gitlab_headers(Some("glpat-xyz"));
        assert_eq!(headers.get("private-token").unwrap(), "glpat-xyz");
    }

    #[test]
    fn test_gitlab_headers_empty_without_token() {
        assert!(gitlab_headers(None).is_empty());
    }

    #[tokio::test]
    async fn test_default_branch_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/org%2Fproj"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let options = test_options(&server);
        assert_eq!(default_branch(&options, None, "org/proj").await, "main");
    }

    #[tokio::test]
    async fn test_project_metadata_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/org%2Fproj"))
            .and(header("private-token", "glpat-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"star_count": 55}"#))
            .expect(1)
            .mount(&server)
            .await;

        let options = test_options(&server);
        let info = project(&options, Some("glpat-abc"), "org/proj").await.unwrap();
        assert_eq!(info.star_count, Some(55));
    }
}
