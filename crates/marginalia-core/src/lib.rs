//! marginalia-core: annotation overlays for annotated corpus pages.
//!
//! This crate provides:
//! - the corpus data model (`Corpus`, `Chapter`, `Page`, `Reference`)
//! - facet filtering over entity types and epistemic categories
//! - span resolution from approximate reference offsets to exact ranges
//! - literal, case-insensitive search and corpus-wide match counts
//! - the overlay engine that merges both layers into nested, escaped markup
//!
//! Everything is synchronous and side-effect free; the caller owns the
//! corpus and the [`ViewState`] and passes them in on every render.

pub mod error;
pub mod escape;
pub mod facet;
pub mod overlay;
pub mod render;
pub mod resolve;
pub mod search;
pub mod stats;
pub mod types;

pub use error::{MarginaliaError, ParseError};
pub use facet::{FacetSet, FacetSets, ToggleOutcome, filter_references};
pub use overlay::{ByteRange, OverlayOutput, ResolvedSpan, render_overlay_html};
pub use render::{
    RenderOutput, ViewState, render, render_chapter, render_page, render_page_text,
    render_search_overview,
};
pub use resolve::{resolve_references, resolve_span};
pub use search::{ChapterMatches, SearchQuery, SearchSummary, summarize};
pub use smol_str::SmolStr;
pub use stats::CorpusStats;
pub use types::{Chapter, Corpus, Epistemic, EntityType, EpistemicType, Page, Reference};
