//! Resource fetching: provider routing, retrying HTTP, scoped snapshots.
//!
//! Every remote artifact is materialized through [`open_artifact`], a scoped
//! acquisition: the snapshot lives in a temporary directory that exists for
//! exactly the duration of the caller's closure and is removed on every exit
//! path, including panics. Provider selection is decided by
//! [`ArtifactRef::parse`] before any network traffic happens.

mod artifact;
mod bundle;
mod github;
mod gitlab;
mod hugging_face;
mod repo_view;
mod resilient_http;

pub use artifact::{ArtifactKind, ArtifactLocation, ArtifactRef, HfRepoType};
pub use bundle::{AuthTokens, EvalContext, ResourceBundle};
pub use hugging_face::{DATASET_ALLOW, HfClient, MAX_FILE_BYTES, MODEL_ALLOW, SPACE_ALLOW};
pub use repo_view::RepoView;
pub use resilient_http::{DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT, HttpClient, RetryPolicy};

pub(crate) use github::contributors;

use crate::Result;
use crate::error::Error;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::fs;
use std::path::{Path, PathBuf};

/// Default API endpoint for GitHub.
pub const GITHUB_API: &str = "https://api.github.com";

/// Default API endpoint for GitLab.
pub const GITLAB_API: &str = "https://gitlab.com/api/v4";

/// Default base URL for Hugging Face.
pub const HUGGING_FACE_BASE: &str = "https://huggingface.co";

/// Endpoint and retry configuration shared by all fetchers. Endpoints are
/// overridable so tests can point fetchers at a mock server.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub http: HttpClient,
    pub github_api: String,
    pub gitlab_api: String,
    pub hugging_face_base: String,
}

impl FetchOptions {
    /// Create options with production endpoints.
    pub fn new(policy: RetryPolicy, timeout: core::time::Duration) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(policy, timeout)?,
            github_api: GITHUB_API.to_owned(),
            gitlab_api: GITLAB_API.to_owned(),
            hugging_face_base: HUGGING_FACE_BASE.to_owned(),
        })
    }

    #[must_use]
    pub fn with_github_api(mut self, base: impl Into<String>) -> Self {
        self.github_api = base.into();
        self
    }

    #[must_use]
    pub fn with_gitlab_api(mut self, base: impl Into<String>) -> Self {
        self.gitlab_api = base.into();
        self
    }

    #[must_use]
    pub fn with_hugging_face_base(mut self, base: impl Into<String>) -> Self {
        self.hugging_face_base = base.into();
        self
    }
}

/// Fetch an artifact's snapshot and run `body` over the resulting view.
///
/// The snapshot's temporary directory is removed when this function returns,
/// whether the fetch or the body succeeded, failed, or unwound; after that,
/// paths handed out by the view are invalid. Cleanup failures are logged and
/// never mask the body's outcome.
pub async fn open_artifact<T, F, Fut>(options: &FetchOptions, artifact: &ArtifactRef, body: F) -> Result<T>
where
    F: FnOnce(RepoView) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let temp = tempfile::Builder::new()
        .prefix("model-audit-")
        .tempdir()
        .map_err(|e| Error::io("creating snapshot directory", e))?;

    let root = match artifact.location() {
        ArtifactLocation::GitHub { .. } => github::fetch_into(options, artifact, temp.path()).await?,
        ArtifactLocation::GitLab { .. } => gitlab::fetch_into(options, artifact, temp.path()).await?,
        ArtifactLocation::HuggingFace { .. } => hugging_face::fetch_into(options, artifact, temp.path()).await?,
    };

    let result = body(RepoView::new(root)).await;

    if let Err(e) = temp.close() {
        log::warn!("failed to remove snapshot directory: {e}");
    }
    result
}

/// Cheap reachability check: one metadata call, no snapshot.
///
/// Used for the required-model precheck and for presence scoring of optional
/// resources.
pub async fn probe_artifact(options: &FetchOptions, artifact: &ArtifactRef) -> Result<()> {
    match artifact.location() {
        ArtifactLocation::GitHub { owner, repo } => {
            let _ = github::repository(options, artifact.token(), owner, repo).await?;
        }
        ArtifactLocation::GitLab { namespace } => {
            let _ = gitlab::project(options, artifact.token(), namespace).await?;
        }
        ArtifactLocation::HuggingFace { repo_id, repo_type } => {
            let client = HfClient::new(options, artifact.token());
            let _ = client.metadata(*repo_type, repo_id, artifact.revision()).await?;
        }
    }
    Ok(())
}

/// Fetch star/like counts for a code artifact's repository, when the
/// provider exposes them.
pub(crate) async fn star_count(options: &FetchOptions, artifact: &ArtifactRef) -> Result<u64> {
    match artifact.location() {
        ArtifactLocation::GitHub { owner, repo } => {
            let info = github::repository(options, artifact.token(), owner, repo).await?;
            Ok(info.stargazers_count.unwrap_or(0))
        }
        ArtifactLocation::GitLab { namespace } => {
            let info = gitlab::project(options, artifact.token(), namespace).await?;
            Ok(info.star_count.unwrap_or(0))
        }
        ArtifactLocation::HuggingFace { repo_id, repo_type } => {
            let client = HfClient::new(options, artifact.token());
            let meta = client.metadata(*repo_type, repo_id, artifact.revision()).await?;
            Ok(meta.get("likes").and_then(serde_json::Value::as_u64).unwrap_or(0))
        }
    }
}

/// Build headers carrying a bearer token, when one is present. Tokens with
/// characters that cannot appear in a header are skipped with a warning
/// rather than failing the request.
pub(crate) fn bearer_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(t) = token {
        match HeaderValue::from_str(&format!("Bearer {t}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                let _ = headers.insert(AUTHORIZATION, value);
            }
            Err(_) => log::warn!("ignoring auth token with invalid header characters"),
        }
    }
    headers
}

/// Unpack a gzip-compressed tar archive into `dest`.
pub(crate) fn unpack_tar_gz(bytes: &[u8], dest: &Path) -> Result<()> {
    let gz = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(gz);
    archive
        .unpack(dest)
        .map_err(|e| Error::io(format!("unpacking archive into {}", dest.display()), e))
}

/// Tag archives wrap their contents in a single top-level directory; descend
/// into it when present.
pub(crate) fn descend_single_dir(root: &Path) -> PathBuf {
    let Ok(entries) = fs::read_dir(root) else {
        return root.to_path_buf();
    };
    let entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    match entries.as_slice() {
        [only] if only.file_type().is_ok_and(|t| t.is_dir()) => only.path(),
        _ => root.to_path_buf(),
    }
}
