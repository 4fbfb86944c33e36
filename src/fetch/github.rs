//! GitHub fetcher: API-tarball download plus the metadata calls metrics need.

use super::artifact::{ArtifactLocation, ArtifactRef};
use super::{FetchOptions, bearer_headers, descend_single_dir, unpack_tar_gz};
use crate::Result;
use crate::error::Error;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Minimal repository info with only the fields we need.
#[derive(Debug, Deserialize)]
pub(crate) struct Repository {
    pub default_branch: Option<String>,
    pub stargazers_count: Option<u64>,
}

/// One entry from the contributors endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Contributor {
    pub contributions: u64,
}

fn github_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = bearer_headers(token);
    let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers
}

/// Fetch repository metadata.
pub(crate) async fn repository(options: &FetchOptions, token: Option<&str>, owner: &str, repo: &str) -> Result<Repository> {
    let url = format!("{}/repos/{owner}/{repo}", options.github_api);
    let body = options.http.get(&url, github_headers(token)).await?;
    serde_json::from_slice(&body).map_err(|e| Error::schema(&url, e.to_string()))
}

/// Fetch the contributor list (first page, which is enough for scoring).
pub(crate) async fn contributors(options: &FetchOptions, token: Option<&str>, owner: &str, repo: &str) -> Result<Vec<Contributor>> {
    let url = format!("{}/repos/{owner}/{repo}/contributors?per_page=100", options.github_api);
    let body = options.http.get(&url, github_headers(token)).await?;
    serde_json::from_slice(&body).map_err(|e| Error::schema(&url, e.to_string()))
}

/// Resolve the default branch, falling back to `main` on any failure so a
/// missing metadata call never fails the whole fetch.
async fn default_branch(options: &FetchOptions, token: Option<&str>, owner: &str, repo: &str) -> String {
    match repository(options, token, owner, repo).await {
        Ok(info) => info.default_branch.unwrap_or_else(|| "main".to_owned()),
        Err(e) => {
            log::debug!("default-branch lookup failed for {owner}/{repo}: {e}; assuming \"main\"");
            "main".to_owned()
        }
    }
}

/// Download the repository tarball for the artifact's ref into `dest` and
/// return the snapshot root.
pub(crate) async fn fetch_into(options: &FetchOptions, artifact: &ArtifactRef, dest: &Path) -> Result<PathBuf> {
    let ArtifactLocation::GitHub { owner, repo } = artifact.location() else {
        return Err(Error::unsupported(artifact.url().as_str()));
    };

    let git_ref = match artifact.revision() {
        Some(rev) => rev.to_owned(),
        None => default_branch(options, artifact.token(), owner, repo).await,
    };

    let url = format!("{}/repos/{owner}/{repo}/tarball/{git_ref}", options.github_api);
    log::debug!("fetching GitHub tarball {url}");
    let body = options.http.get(&url, github_headers(artifact.token())).await?;

    unpack_tar_gz(&body, dest)?;
    Ok(descend_single_dir(dest))
}
