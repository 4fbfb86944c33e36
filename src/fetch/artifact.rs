//! Artifact references: URL parsing and provider classification.
//!
//! A URL is classified into one of a closed set of provider locations by a
//! pure function of its host and path segments, before any network call is
//! made. Revision refs embedded in `/tree/<ref>`-style paths are extracted
//! here so fetchers receive them explicitly.

use crate::Result;
use crate::error::Error;
use core::fmt::{Display, Formatter};
use url::Url;

/// Path segments that mark the next segment as a revision ref.
const REVISION_MARKERS: [&str; 3] = ["tree", "blob", "resolve"];

/// Role of an artifact within a resource bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ArtifactKind {
    Model,
    Dataset,
    Code,
}

/// Hugging Face repository flavor, selecting API routes and allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HfRepoType {
    Model,
    Dataset,
    Space,
}

impl HfRepoType {
    /// Path segment used by the metadata API (`/api/<segment>/<repo_id>`).
    pub(crate) const fn api_segment(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
            Self::Space => "spaces",
        }
    }

    /// Prefix inserted before the repo id in `resolve/` download URLs.
    pub(crate) const fn resolve_prefix(self) -> &'static str {
        match self {
            Self::Model => "",
            Self::Dataset => "datasets/",
            Self::Space => "spaces/",
        }
    }
}

/// Provider-specific routing information derived from a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    HuggingFace { repo_id: String, repo_type: HfRepoType },
    GitHub { owner: String, repo: String },
    GitLab { namespace: String },
}

/// One remote artifact: a parsed URL, its provider classification, an
/// optional revision ref, and an optional auth token. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    url: Url,
    location: ArtifactLocation,
    revision: Option<String>,
    token: Option<String>,
}

impl ArtifactRef {
    /// Parse and classify an artifact URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedLocation`] when the URL cannot be parsed
    /// or its host/shape does not match a supported provider.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|_| Error::unsupported(raw))?;
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let parts: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let location = classify(&host, &parts).ok_or_else(|| Error::unsupported(raw))?;
        let revision = extract_revision(&parts);

        Ok(Self {
            url,
            location,
            revision,
            token: None,
        })
    }

    /// Attach an auth token for the artifact's provider.
    #[must_use]
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Short human-readable identifier: the repo id or `owner/repo` path.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.location {
            ArtifactLocation::HuggingFace { repo_id, .. } => repo_id.clone(),
            ArtifactLocation::GitHub { owner, repo } => format!("{owner}/{repo}"),
            ArtifactLocation::GitLab { namespace } => namespace.clone(),
        }
    }
}

impl Display for ArtifactRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Classify a URL into a provider location. Pure; returns `None` for
/// unsupported hosts or malformed paths.
fn classify(host: &str, parts: &[&str]) -> Option<ArtifactLocation> {
    if host == "huggingface.co" || host == "www.huggingface.co" {
        return match parts {
            ["datasets", owner, repo, ..] => Some(ArtifactLocation::HuggingFace {
                repo_id: format!("{owner}/{repo}"),
                repo_type: HfRepoType::Dataset,
            }),
            ["spaces", owner, repo, ..] => Some(ArtifactLocation::HuggingFace {
                repo_id: format!("{owner}/{repo}"),
                repo_type: HfRepoType::Space,
            }),
            [owner, repo, ..] if *owner != "datasets" && *owner != "spaces" => Some(ArtifactLocation::HuggingFace {
                repo_id: format!("{owner}/{repo}"),
                repo_type: HfRepoType::Model,
            }),
            _ => None,
        };
    }

    if host == "github.com" || host.ends_with(".github.com") {
        return match parts {
            [owner, repo, ..] => Some(ArtifactLocation::GitHub {
                owner: (*owner).to_owned(),
                repo: repo.trim_end_matches(".git").to_owned(),
            }),
            _ => None,
        };
    }

    if host == "gitlab.com" || host.ends_with(".gitlab.com") {
        // Nested namespaces are allowed; stop at the `/-/` separator or at a
        // revision marker so `/tree/<ref>` never leaks into the project path.
        let mut namespace = Vec::new();
        for part in parts {
            if *part == "-" || REVISION_MARKERS.contains(part) {
                break;
            }
            namespace.push(*part);
        }
        if namespace.len() < 2 {
            return None;
        }
        if let Some(last) = namespace.last_mut() {
            *last = last.trim_end_matches(".git");
        }
        return Some(ArtifactLocation::GitLab {
            namespace: namespace.join("/"),
        });
    }

    None
}

/// Extract a revision ref from `tree/<ref>`, `blob/<ref>`, or
/// `resolve/<ref>` path segments.
fn extract_revision(parts: &[&str]) -> Option<String> {
    parts
        .windows(2)
        .find(|w| REVISION_MARKERS.contains(&w[0]))
        .map(|w| w[1].to_owned())
}
