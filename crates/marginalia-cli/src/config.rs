use kdl::KdlDocument;
use marginalia_core::{Corpus, Epistemic, FacetSet, FacetSets, MarginaliaError, SmolStr};
use miette::Diagnostic;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("couldn't read config file {}", path.display())]
    #[diagnostic(code(marginalia::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid KDL in {}", path.display())]
    #[diagnostic(code(marginalia::config::kdl))]
    Kdl {
        path: PathBuf,
        #[source]
        source: kdl::KdlError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Facet(#[from] MarginaliaError),
}

/// Settings read from `config.kdl`:
///
/// ```kdl
/// corpus "/path/to/corpus.json"
/// types "biblical" "patristic"
/// epistemic "FACTUAL" "INTERPRETIVE"
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub corpus: Option<PathBuf>,
    pub types: Vec<SmolStr>,
    pub epistemic: Vec<Epistemic>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("marginalia").join("config.kdl"))
    }

    /// Load from `path`. A missing file at the default location is not an
    /// error; pass `required` for paths the user named explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: KdlDocument = src.parse().map_err(|source| ConfigError::Kdl {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_document(&doc)
    }

    pub fn from_document(doc: &KdlDocument) -> Result<Self, ConfigError> {
        let corpus = string_args(doc, "corpus").first().map(PathBuf::from);
        let types = string_args(doc, "types")
            .into_iter()
            .map(SmolStr::new)
            .collect();
        let epistemic = string_args(doc, "epistemic")
            .into_iter()
            .map(|s| s.parse::<Epistemic>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            corpus,
            types,
            epistemic,
        })
    }
}

/// String arguments of the first node called `name`.
fn string_args<'a>(doc: &'a KdlDocument, name: &str) -> Vec<&'a str> {
    let Some(node) = doc.get(name) else {
        return Vec::new();
    };
    node.entries()
        .iter()
        .filter_map(|entry| {
            let value = entry.value().as_string();
            if value.is_none() {
                tracing::warn!(node = name, "ignoring non-string config value");
            }
            value
        })
        .collect()
}

/// Flags win over the config file, which wins over the corpus defaults.
/// An empty list at any layer falls through to the next one.
pub fn resolve_facets(
    corpus: &Corpus,
    config: &Config,
    type_flags: &[String],
    epistemic_flags: &[String],
) -> Result<FacetSets, MarginaliaError> {
    let types: Vec<SmolStr> = if !type_flags.is_empty() {
        type_flags.iter().map(SmolStr::new).collect()
    } else if !config.types.is_empty() {
        config.types.clone()
    } else {
        corpus.entity_type_ids()
    };
    let known = corpus.entity_type_ids();
    for id in types.iter().filter(|id| !known.contains(id)) {
        tracing::warn!(entity_type = %id, "no references of this type in the corpus");
    }
    let types = FacetSet::new(types).ok_or(MarginaliaError::EmptyFacets("entity type"))?;

    let epistemic: Vec<Epistemic> = if !epistemic_flags.is_empty() {
        epistemic_flags
            .iter()
            .map(|s| s.parse::<Epistemic>())
            .collect::<Result<Vec<_>, _>>()?
    } else if !config.epistemic.is_empty() {
        config.epistemic.clone()
    } else {
        FacetSets::DEFAULT_EPISTEMIC.to_vec()
    };
    let epistemic = FacetSet::new(epistemic).ok_or(MarginaliaError::EmptyFacets("epistemic"))?;

    Ok(FacetSets::new(types, epistemic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus::from_json(
            "config-test.json",
            r#"{
                "entity_types": [
                    {"id": "biblical", "label": "Biblical Citation"},
                    {"id": "classical", "label": "Classical Reference"}
                ],
                "chapters": []
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_config() {
        let doc: KdlDocument = r#"
            corpus "data/corpus.json"
            types "biblical" "patristic"
            epistemic "FACTUAL" "deferred"
        "#
        .parse()
        .unwrap();

        let config = Config::from_document(&doc).unwrap();
        assert_eq!(config.corpus, Some(PathBuf::from("data/corpus.json")));
        assert_eq!(config.types, vec!["biblical", "patristic"]);
        assert_eq!(config.epistemic, vec![Epistemic::Factual, Epistemic::Deferred]);
    }

    #[test]
    fn test_unknown_epistemic_is_an_error() {
        let doc: KdlDocument = r#"epistemic "CERTAIN""#.parse().unwrap();
        assert!(matches!(
            Config::from_document(&doc),
            Err(ConfigError::Facet(MarginaliaError::UnknownEpistemic(_)))
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let corpus = corpus();
        let config = Config {
            corpus: None,
            types: vec!["biblical".into()],
            epistemic: vec![Epistemic::Deferred],
        };

        let facets = resolve_facets(&corpus, &config, &[], &[]).unwrap();
        assert!(facets.types.contains("biblical"));
        assert!(!facets.types.contains("classical"));
        assert!(facets.epistemic.contains(&Epistemic::Deferred));
        assert!(!facets.epistemic.contains(&Epistemic::Factual));

        let facets =
            resolve_facets(&corpus, &config, &["classical".to_string()], &["factual".to_string()])
                .unwrap();
        assert!(facets.types.contains("classical"));
        assert!(!facets.types.contains("biblical"));
        assert_eq!(
            facets.epistemic.iter().copied().collect::<Vec<_>>(),
            vec![Epistemic::Factual]
        );
    }

    #[test]
    fn test_corpus_without_type_catalog() {
        let bare = Corpus::from_json("bare.json", r#"{"chapters": []}"#).unwrap();

        let facets = resolve_facets(&bare, &Config::default(), &["biblical".to_string()], &[])
            .unwrap();
        assert_eq!(facets.types.iter().collect::<Vec<_>>(), vec!["biblical"]);

        let config = Config {
            types: vec!["patristic".into()],
            ..Config::default()
        };
        let facets = resolve_facets(&bare, &config, &[], &[]).unwrap();
        assert!(facets.types.contains("patristic"));

        assert!(matches!(
            resolve_facets(&bare, &Config::default(), &[], &[]),
            Err(MarginaliaError::EmptyFacets("entity type"))
        ));
    }

    #[test]
    fn test_types_default_to_referenced_types() {
        let corpus = Corpus::from_json(
            "uncatalogued.json",
            r#"{"chapters": [{"id": "de-deo", "title": "DE DEO", "start_page": 7, "end_page": 7,
                "pages": [{"page": 7, "text": "Rom. 5", "references": [
                    {"start": 0, "text": "Rom. 5", "type": "biblical", "confidence": 0.85,
                     "epistemic": "FACTUAL"}]}]}]}"#,
        )
        .unwrap();

        let facets = resolve_facets(&corpus, &Config::default(), &[], &[]).unwrap();
        assert_eq!(facets.types.iter().collect::<Vec<_>>(), vec!["biblical"]);
        assert_eq!(
            facets.epistemic.iter().copied().collect::<Vec<_>>(),
            vec![Epistemic::Factual, Epistemic::Interpretive]
        );
    }

    #[test]
    fn test_defaults_without_config() {
        let facets = resolve_facets(&corpus(), &Config::default(), &[], &[]).unwrap();
        assert_eq!(facets.types.count(), 2);
        assert!(!facets.epistemic.contains(&Epistemic::Deferred));
    }
}
