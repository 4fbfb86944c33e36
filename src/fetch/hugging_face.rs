//! Hugging Face client and managed-snapshot fetcher.
//!
//! Snapshots are sparse: only files matching the artifact-type allow-list
//! are downloaded, and anything that still exceeds [`MAX_FILE_BYTES`] is
//! deleted afterwards so a stray large binary can never exhaust disk space.

use super::artifact::{ArtifactLocation, ArtifactRef, HfRepoType};
use super::repo_view::is_clean_relative;
use super::{FetchOptions, HttpClient, bearer_headers};
use crate::Result;
use crate::error::Error;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files downloaded for model snapshots.
pub const MODEL_ALLOW: &[&str] = &["README.md", "README.*", "config.json", "model_index.json"];

/// Files downloaded for dataset snapshots.
pub const DATASET_ALLOW: &[&str] = &["README.md", "README.*", "dataset_info.json", "data/*"];

/// Files downloaded for space snapshots.
pub const SPACE_ALLOW: &[&str] = &["app.*", "requirements*.txt", "runtime.txt", "*.py", "README.*"];

/// Snapshot files larger than this are deleted after download.
pub const MAX_FILE_BYTES: u64 = 256 * 1024;

const fn allow_patterns(repo_type: HfRepoType) -> &'static [&'static str] {
    match repo_type {
        HfRepoType::Model => MODEL_ALLOW,
        HfRepoType::Dataset => DATASET_ALLOW,
        HfRepoType::Space => SPACE_ALLOW,
    }
}

/// Compile an allow-list into one matcher.
fn build_allow_matcher(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::Pattern {
            pattern: (*pattern).to_owned(),
            message: e.to_string(),
        })?;
        let _ = builder.add(glob);
    }
    builder.build().map_err(|e| Error::Pattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}

/// Client for the Hugging Face metadata API and file downloads.
#[derive(Debug, Clone)]
pub struct HfClient {
    base_url: String,
    http: HttpClient,
    token: Option<String>,
}

impl HfClient {
    pub fn new(options: &FetchOptions, token: Option<&str>) -> Self {
        Self {
            base_url: options.hugging_face_base.clone(),
            http: options.http.clone(),
            token: token.map(str::to_owned),
        }
    }

    fn metadata_url(&self, repo_type: HfRepoType, repo_id: &str, revision: Option<&str>, with_files: bool) -> String {
        let mut url = format!("{}/api/{}/{repo_id}", self.base_url, repo_type.api_segment());
        if let Some(rev) = revision {
            url.push_str("/revision/");
            url.push_str(rev);
        }
        if with_files {
            url.push_str("?blobs=true");
        }
        url
    }

    /// Fetch repository metadata. The response must be a JSON object.
    pub async fn metadata(&self, repo_type: HfRepoType, repo_id: &str, revision: Option<&str>) -> Result<serde_json::Value> {
        self.metadata_inner(repo_type, repo_id, revision, false).await
    }

    /// Fetch metadata including per-file blob sizes (`?blobs=true`).
    pub async fn metadata_with_files(&self, repo_type: HfRepoType, repo_id: &str, revision: Option<&str>) -> Result<serde_json::Value> {
        self.metadata_inner(repo_type, repo_id, revision, true).await
    }

    async fn metadata_inner(&self, repo_type: HfRepoType, repo_id: &str, revision: Option<&str>, with_files: bool) -> Result<serde_json::Value> {
        let url = self.metadata_url(repo_type, repo_id, revision, with_files);
        let value = self.http.get_json(&url, bearer_headers(self.token.as_deref())).await?;
        if !value.is_object() {
            return Err(Error::schema(&url, "expected a JSON object"));
        }
        Ok(value)
    }

    /// Download a sparse snapshot into `dest`: metadata lists the repo's
    /// files, the allow-list filters them, and each match is fetched through
    /// the `resolve/` endpoint. Oversized files are removed at the end.
    pub async fn snapshot(
        &self,
        repo_type: HfRepoType,
        repo_id: &str,
        revision: Option<&str>,
        allow: &[&str],
        dest: &Path,
    ) -> Result<()> {
        let meta = self.metadata(repo_type, repo_id, revision).await?;
        let meta_url = self.metadata_url(repo_type, repo_id, revision, false);
        let siblings = meta
            .get("siblings")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| Error::schema(&meta_url, "missing `siblings` array"))?;

        let matcher = build_allow_matcher(allow)?;
        let revision = revision.unwrap_or("main");

        for sibling in siblings {
            let Some(name) = sibling.get("rfilename").and_then(serde_json::Value::as_str) else {
                continue;
            };
            if !matcher.is_match(name) {
                continue;
            }
            // Remote-supplied names must stay inside the snapshot directory.
            if !is_clean_relative(name) {
                log::warn!("skipping snapshot file with unsafe path: {name}");
                continue;
            }

            let file_url = format!(
                "{}/{}{repo_id}/resolve/{revision}/{name}",
                self.base_url,
                repo_type.resolve_prefix()
            );
            log::debug!("fetching snapshot file {file_url}");
            let body = self.http.get(&file_url, bearer_headers(self.token.as_deref())).await?;

            let target = dest.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(format!("creating {}", parent.display()), e))?;
            }
            fs::write(&target, &body).map_err(|e| Error::io(format!("writing {}", target.display()), e))?;
        }

        remove_oversize_files(dest)
    }
}

/// Delete every file under `root` larger than [`MAX_FILE_BYTES`].
fn remove_oversize_files(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if meta.len() > MAX_FILE_BYTES {
            log::debug!("removing oversized snapshot file {}", entry.path().display());
            fs::remove_file(entry.path()).map_err(|e| Error::io(format!("removing {}", entry.path().display()), e))?;
        }
    }
    Ok(())
}

/// Materialize a Hugging Face artifact snapshot into `dest` and return the
/// snapshot root.
pub(crate) async fn fetch_into(options: &FetchOptions, artifact: &ArtifactRef, dest: &Path) -> Result<PathBuf> {
    let ArtifactLocation::HuggingFace { repo_id, repo_type } = artifact.location() else {
        return Err(Error::unsupported(artifact.url().as_str()));
    };

    let client = HfClient::new(options, artifact.token());
    client
        .snapshot(*repo_type, repo_id, artifact.revision(), allow_patterns(*repo_type), dest)
        .await?;
    Ok(dest.to_path_buf())
}
