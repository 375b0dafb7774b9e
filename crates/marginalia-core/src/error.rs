//! Error types for marginalia.
//!
//! Rendering itself never fails; these cover loading a corpus and resolving
//! caller-supplied identifiers against it.

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use serde_json::error::Category;
use smol_str::SmolStr;

/// Main error type for marginalia operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum MarginaliaError {
    /// Corpus JSON could not be parsed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown chapter `{0}`")]
    #[diagnostic(
        code(marginalia::unknown_chapter),
        help("run `marginalia stats` to list the chapter ids in this corpus")
    )]
    UnknownChapter(SmolStr),

    #[error("page {0} is not part of any chapter")]
    #[diagnostic(code(marginalia::unknown_page))]
    UnknownPage(u32),

    #[error("unknown epistemic category `{0}`")]
    #[diagnostic(
        code(marginalia::unknown_epistemic),
        help("expected one of FACTUAL, INTERPRETIVE, DEFERRED")
    )]
    UnknownEpistemic(String),

    /// A facet set would end up with no active members
    #[error("no active {0} facets")]
    #[diagnostic(
        code(marginalia::empty_facets),
        help("the corpus names no entity types; pass --types or set `types` in the config file")
    )]
    EmptyFacets(&'static str),
}

/// Parse error with source code location information
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("failed to parse corpus: {source}")]
#[diagnostic(code(marginalia::parse))]
pub struct ParseError {
    source: serde_json::Error,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    err_location: SourceSpan,
    #[help]
    advice: Option<String>,
}

impl ParseError {
    pub fn from_json(err: serde_json::Error, name: impl AsRef<str>, src: &str) -> Self {
        let location = SourceSpan::new(
            SourceOffset::from_location(src, err.line(), err.column()),
            0,
        );
        let advice = match err.classify() {
            Category::Syntax => Some("the file is not valid JSON".to_string()),
            Category::Data => {
                Some("the JSON is well-formed but does not match the corpus layout".to_string())
            }
            Category::Eof => Some("the file ends early; it may be truncated".to_string()),
            Category::Io => None,
        };
        Self {
            source: err,
            src: NamedSource::new(name, src.to_string()),
            err_location: location,
            advice,
        }
    }

    /// One-based line and column reported by the JSON parser.
    pub fn line_col(&self) -> (usize, usize) {
        (self.source.line(), self.source.column())
    }
}
