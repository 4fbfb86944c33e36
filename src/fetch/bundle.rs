//! Resource bundles: the set of artifacts jointly evaluated for one input
//! line.

use super::FetchOptions;
use super::artifact::{ArtifactLocation, ArtifactRef};
use crate::Result;
use crate::error::Error;

/// Per-provider auth tokens, attached to artifact refs as they are parsed.
/// A missing token only disables private-resource access.
#[derive(Debug, Clone, Default)]
pub struct AuthTokens {
    pub github: Option<String>,
    pub gitlab: Option<String>,
    pub hugging_face: Option<String>,
}

impl AuthTokens {
    fn for_location(&self, location: &ArtifactLocation) -> Option<&str> {
        match location {
            ArtifactLocation::GitHub { .. } => self.github.as_deref(),
            ArtifactLocation::GitLab { .. } => self.gitlab.as_deref(),
            ArtifactLocation::HuggingFace { .. } => self.hugging_face.as_deref(),
        }
    }
}

/// Up to three artifacts evaluated together: the model is required, dataset
/// and code are optional. No fetcher mutates another member's state.
#[derive(Debug, Clone)]
pub struct ResourceBundle {
    pub model: ArtifactRef,
    pub dataset: Option<ArtifactRef>,
    pub code: Option<ArtifactRef>,
}

impl ResourceBundle {
    /// Parse one input line of comma-separated URLs in
    /// `[code,][dataset,]model` order: the last field is always the model,
    /// and empty fields mean the resource is absent.
    pub fn from_line(line: &str, tokens: &AuthTokens) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() > 3 {
            return Err(Error::unsupported(line));
        }

        let model_raw = fields.last().copied().unwrap_or_default();
        if model_raw.is_empty() {
            return Err(Error::unsupported(line));
        }

        let parse = |raw: &str| -> Result<Option<ArtifactRef>> {
            if raw.is_empty() {
                return Ok(None);
            }
            let artifact = ArtifactRef::parse(raw)?;
            let token = tokens.for_location(artifact.location());
            Ok(Some(artifact.with_token(token)))
        };

        let model = parse(model_raw)?.ok_or_else(|| Error::unsupported(line))?;
        let dataset = if fields.len() >= 2 { parse(fields[fields.len() - 2])? } else { None };
        let code = if fields.len() == 3 { parse(fields[0])? } else { None };

        Ok(Self { model, dataset, code })
    }
}

/// Everything a metric needs: the bundle under evaluation plus fetch
/// configuration. Cloned per metric task so concurrent metrics never share
/// mutable state.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub bundle: ResourceBundle,
    pub fetch: FetchOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HfRepoType;

    const MODEL: &str = "https://huggingface.co/google-bert/bert-base-uncased";
    const DATASET: &str = "https://huggingface.co/datasets/squad/squad";
    const CODE: &str = "https://github.com/google-research/bert";

    #[test]
    fn test_single_url_is_model_only() {
        let bundle = ResourceBundle::from_line(MODEL, &AuthTokens::default()).unwrap();
        assert_eq!(bundle.model.name(), "google-bert/bert-base-uncased");
        assert!(bundle.dataset.is_none());
        assert!(bundle.code.is_none());
    }

    #[test]
    fn test_full_triple() {
        let line = format!("{CODE},{DATASET},{MODEL}");
        let bundle = ResourceBundle::from_line(&line, &AuthTokens::default()).unwrap();

        assert_eq!(bundle.model.name(), "google-bert/bert-base-uncased");
        assert!(matches!(
            bundle.dataset.as_ref().unwrap().location(),
            ArtifactLocation::HuggingFace {
                repo_type: HfRepoType::Dataset,
                ..
            }
        ));
        assert!(matches!(bundle.code.as_ref().unwrap().location(), ArtifactLocation::GitHub { .. }));
    }

    #[test]
    fn test_empty_fields_mean_absent() {
        let line = format!(",,{MODEL}");
        let bundle = ResourceBundle::from_line(&line, &AuthTokens::default()).unwrap();
        assert!(bundle.dataset.is_none());
        assert!(bundle.code.is_none());
    }

    #[test]
    fn test_two_fields_are_dataset_and_model() {
        let line = format!("{DATASET},{MODEL}");
        let bundle = ResourceBundle::from_line(&line, &AuthTokens::default()).unwrap();
        assert!(bundle.dataset.is_some());
        assert!(bundle.code.is_none());
    }

    #[test]
    fn test_missing_model_is_error() {
        let line = format!("{CODE},{DATASET},");
        assert!(ResourceBundle::from_line(&line, &AuthTokens::default()).is_err());
    }

    #[test]
    fn test_too_many_fields_is_error() {
        let line = format!("{CODE},{DATASET},{MODEL},{MODEL}");
        assert!(ResourceBundle::from_line(&line, &AuthTokens::default()).is_err());
    }

    #[test]
    fn test_unsupported_model_url_is_error() {
        let err = ResourceBundle::from_line("https://example.com/not/supported", &AuthTokens::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLocation { .. }));
    }

    #[test]
    fn test_tokens_attached_per_provider() {
        let tokens = AuthTokens {
            github: Some("gh".into()),
            gitlab: None,
            hugging_face: Some("hf".into()),
        };
        let line = format!("{CODE},{DATASET},{MODEL}");
        let bundle = ResourceBundle::from_line(&line, &tokens).unwrap();

        assert_eq!(bundle.model.token(), Some("hf"));
        assert_eq!(bundle.dataset.as_ref().unwrap().token(), Some("hf"));
        assert_eq!(bundle.code.as_ref().unwrap().token(), Some("gh"));
    }

    #[test]
    fn test_whitespace_trimmed() {
        let line = format!("  {CODE} , {DATASET} , {MODEL}  ");
        let bundle = ResourceBundle::from_line(&line, &AuthTokens::default()).unwrap();
        assert!(bundle.code.is_some());
        assert!(bundle.dataset.is_some());
    }
}
