use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{MarginaliaError, ParseError};
use crate::stats::CorpusStats;

/// Evidential status of a detected reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Epistemic {
    /// Consensus between detectors, or a well-formed citation pattern.
    Factual,
    /// Single detector with moderate confidence.
    Interpretive,
    /// Detectors disagree or confidence is low; needs human review.
    Deferred,
}

impl Epistemic {
    pub const ALL: [Epistemic; 3] = [Self::Factual, Self::Interpretive, Self::Deferred];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Factual => "FACTUAL",
            Self::Interpretive => "INTERPRETIVE",
            Self::Deferred => "DEFERRED",
        }
    }
}

impl fmt::Display for Epistemic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Epistemic {
    type Err = MarginaliaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MarginaliaError::UnknownEpistemic(s.to_string()))
    }
}

/// A detected mention of an entity within a page's text.
///
/// `start` is a hint produced by an upstream tokenizer, counted in
/// characters. It may drift by a few positions from where `text` actually
/// occurs in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: SmolStr,
    pub confidence: f64,
    pub epistemic: Epistemic,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<SmolStr>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub consensus: bool,
}

impl Reference {
    /// Detection methods, falling back to the joined `method` tag when the
    /// record predates the `methods` list.
    pub fn detection_methods(&self) -> Vec<SmolStr> {
        if !self.methods.is_empty() {
            return self.methods.clone();
        }
        if self.method.is_empty() {
            return vec![SmolStr::new_static("rule-based")];
        }
        self.method
            .split(" + ")
            .map(|m| SmolStr::new(m.trim()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    #[serde(default)]
    pub chapter_id: Option<SmolStr>,
    pub text: String,
    /// Detection order, not position order.
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: SmolStr,
    pub title: String,
    #[serde(default)]
    pub title_en: String,
    pub start_page: u32,
    pub end_page: u32,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub reference_counts: BTreeMap<SmolStr, usize>,
}

impl Chapter {
    pub fn reference_count(&self) -> usize {
        self.pages.iter().map(|p| p.references.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub id: SmolStr,
    pub label: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpistemicType {
    pub id: Epistemic,
    pub label: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_full: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(default)]
    pub generated: Option<String>,
}

/// An annotated document plus the catalogs needed to present it.
///
/// Loaded once and treated as immutable; renderers only borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub metadata: CorpusMetadata,
    #[serde(default)]
    pub stats: CorpusStats,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub epistemic_types: Vec<EpistemicType>,
    pub chapters: Vec<Chapter>,
}

impl Corpus {
    /// Parse a corpus from its JSON form. `name` labels the source in
    /// diagnostics, usually the file path.
    pub fn from_json(name: impl AsRef<str>, src: &str) -> Result<Self, ParseError> {
        serde_json::from_str(src).map_err(|err| ParseError::from_json(err, name, src))
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Find a page by number along with the chapter that holds it.
    pub fn page(&self, number: u32) -> Option<(&Chapter, &Page)> {
        self.chapters.iter().find_map(|chapter| {
            chapter
                .pages
                .iter()
                .find(|p| p.page == number)
                .map(|page| (chapter, page))
        })
    }

    pub fn entity_type(&self, id: &str) -> Option<&EntityType> {
        self.entity_types.iter().find(|t| t.id == id)
    }

    /// Catalogued entity type ids, or the distinct types used by the
    /// references when the corpus ships without a catalog.
    pub fn entity_type_ids(&self) -> Vec<SmolStr> {
        if !self.entity_types.is_empty() {
            return self.entity_types.iter().map(|t| t.id.clone()).collect();
        }
        let used: BTreeSet<&SmolStr> = self
            .pages()
            .flat_map(|p| p.references.iter())
            .map(|r| &r.entity_type)
            .collect();
        used.into_iter().cloned().collect()
    }

    pub fn epistemic_type(&self, id: Epistemic) -> Option<&EpistemicType> {
        self.epistemic_types.iter().find(|t| t.id == id)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.chapters.iter().flat_map(|c| c.pages.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_reference() {
        let json = r#"{
            "start": 12,
            "end": 19,
            "text": "Rom. 5",
            "type": "biblical",
            "confidence": 0.85,
            "epistemic": "FACTUAL",
            "methods": ["rule-based"],
            "method": "rule-based",
            "consensus": false
        }"#;

        let reference: Reference = serde_json::from_str(json).unwrap();
        assert_eq!(reference.start, 12);
        assert_eq!(reference.text, "Rom. 5");
        assert_eq!(reference.entity_type, "biblical");
        assert_eq!(reference.epistemic, Epistemic::Factual);
        assert_eq!(reference.detection_methods(), vec!["rule-based"]);
    }

    #[test]
    fn test_deserialize_minimal_reference() {
        let json = r#"{
            "start": 0,
            "text": "Augustinus",
            "type": "patristic",
            "confidence": 0.75,
            "epistemic": "INTERPRETIVE",
            "method": "rule-based + CRF"
        }"#;

        let reference: Reference = serde_json::from_str(json).unwrap();
        assert!(!reference.consensus);
        assert_eq!(reference.detection_methods(), vec!["rule-based", "CRF"]);
    }

    #[test]
    fn test_epistemic_from_str() {
        assert_eq!("factual".parse::<Epistemic>().unwrap(), Epistemic::Factual);
        assert_eq!(" DEFERRED ".parse::<Epistemic>().unwrap(), Epistemic::Deferred);
        assert!(matches!(
            "SPECULATIVE".parse::<Epistemic>(),
            Err(MarginaliaError::UnknownEpistemic(_))
        ));
    }

    #[test]
    fn test_page_lookup() {
        let json = r#"{
            "chapters": [
                {"id": "praefatio", "title": "PRAEFATIO", "start_page": 2, "end_page": 3,
                 "pages": [{"page": 2, "text": "alpha"}, {"page": 3, "text": "beta"}]},
                {"id": "de-deo", "title": "DE DEO", "start_page": 7, "end_page": 7,
                 "pages": [{"page": 7, "text": "gamma"}]}
            ]
        }"#;

        let corpus = Corpus::from_json("corpus.json", json).unwrap();
        let (chapter, page) = corpus.page(7).unwrap();
        assert_eq!(chapter.id, "de-deo");
        assert_eq!(page.text, "gamma");
        assert!(corpus.page(5).is_none());
        assert_eq!(corpus.pages().count(), 3);
    }

    #[test]
    fn test_entity_type_ids_without_catalog() {
        let json = r#"{
            "chapters": [{"id": "de-deo", "title": "DE DEO", "start_page": 7, "end_page": 7,
                "pages": [{"page": 7, "text": "Rom. 5 et Augustinus et Gen. 1", "references": [
                    {"start": 0, "text": "Rom. 5", "type": "biblical", "confidence": 0.85,
                     "epistemic": "FACTUAL"},
                    {"start": 10, "text": "Augustinus", "type": "patristic", "confidence": 0.75,
                     "epistemic": "INTERPRETIVE"},
                    {"start": 24, "text": "Gen. 1", "type": "biblical", "confidence": 0.85,
                     "epistemic": "FACTUAL"}
                ]}]}]
        }"#;
        let corpus = Corpus::from_json("bare.json", json).unwrap();
        assert_eq!(corpus.entity_type_ids(), vec!["biblical", "patristic"]);
    }

    #[test]
    fn test_catalog_lookups() {
        let json = r##"{
            "entity_types": [{"id": "classical", "label": "Classical Reference"}],
            "epistemic_types": [{"id": "DEFERRED", "label": "Deferred", "color": "#9E9E9E"}],
            "chapters": []
        }"##;
        let corpus = Corpus::from_json("catalog.json", json).unwrap();
        assert_eq!(corpus.entity_type_ids(), vec!["classical"]);
        assert_eq!(
            corpus.epistemic_type(Epistemic::Deferred).map(|t| t.label.as_str()),
            Some("Deferred")
        );
        assert!(corpus.epistemic_type(Epistemic::Factual).is_none());
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = Corpus::from_json("broken.json", "{\n  \"chapters\": [\n    {\"id\": }\n]}")
            .unwrap_err();
        assert_eq!(err.line_col().0, 3);
    }
}
