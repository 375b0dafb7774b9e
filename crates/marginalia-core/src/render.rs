//! Page, chapter and search-overview markup.
//!
//! Every function here is a pure function of the corpus and a [`ViewState`]
//! snapshot; none of them fail. A page whose overlay cannot be written falls
//! back to its plain escaped text.

use smol_str::SmolStr;
use std::fmt::Write;

use crate::escape::{escape_attr, escape_body, escape_body_string};
use crate::facet::{FacetSets, filter_references};
use crate::overlay::render_overlay_html;
use crate::resolve::resolve_references;
use crate::search::{SearchQuery, SearchSummary, summarize};
use crate::types::{Chapter, Corpus, Page};

/// Everything a render depends on besides the corpus. Owned by the caller
/// and only ever read here.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub facets: FacetSets,
    pub query: Option<SearchQuery>,
    pub chapter: Option<SmolStr>,
}

impl ViewState {
    pub fn new(facets: FacetSets) -> Self {
        Self {
            facets,
            query: None,
            chapter: None,
        }
    }

    /// Replace the active search. Too-short input clears it.
    pub fn set_query(&mut self, raw: &str) {
        self.query = SearchQuery::parse(raw);
    }

    pub fn select_chapter(&mut self, id: Option<SmolStr>) {
        self.chapter = id;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    Chapter(String),
    SearchOverview { summary: SearchSummary, html: String },
    /// Nothing selected and no search with results.
    Idle,
}

/// Annotated, escaped text of a single page.
pub fn render_page_text(page: &Page, state: &ViewState) -> String {
    let eligible = filter_references(&page.references, &state.facets);
    let spans = resolve_references(&page.text, eligible);
    let matches = state
        .query
        .as_ref()
        .map(|q| q.find_matches(&page.text))
        .unwrap_or_default();

    tracing::trace!(
        page = page.page,
        references = spans.len(),
        matches = matches.len(),
        "rendering page overlay"
    );

    match render_overlay_html(&page.text, &spans, &matches) {
        Ok(html) => html,
        Err(_) => {
            tracing::warn!(page = page.page, "overlay failed, rendering plain text");
            escape_body_string(&page.text)
        }
    }
}

fn write_page(out: &mut String, page: &Page, state: &ViewState) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"page-block\" id=\"page-{n}\"><div class=\"page-label\">Page {n}</div><div class=\"text-content\">",
        n = page.page
    )?;
    out.push_str(&render_page_text(page, state));
    out.push_str("</div></div>");
    Ok(())
}

pub fn render_page(page: &Page, state: &ViewState) -> String {
    let mut out = String::new();
    let _ = write_page(&mut out, page, state);
    out
}

fn write_chapter(
    out: &mut String,
    corpus: &Corpus,
    chapter: &Chapter,
    state: &ViewState,
) -> std::fmt::Result {
    out.push_str("<div class=\"chapter-header\"><h2>");
    escape_body(out, &chapter.title)?;
    out.push_str("</h2><div class=\"chapter-en\">");
    escape_body(out, &chapter.title_en)?;
    write!(
        out,
        " — Pages {}–{}</div><div class=\"chapter-stats\">",
        chapter.start_page, chapter.end_page
    )?;

    // Counts cover every facet-eligible reference, resolved or not
    for entity_type in &corpus.entity_types {
        let count = chapter
            .pages
            .iter()
            .flat_map(|p| p.references.iter())
            .filter(|r| r.entity_type == entity_type.id && state.facets.admits(r))
            .count();
        if count == 0 {
            continue;
        }
        out.push_str("<span class=\"stat\"><span class=\"dot\" style=\"background:");
        escape_attr(out, &entity_type.color)?;
        out.push_str("\"></span>");
        escape_body(out, &entity_type.label)?;
        write!(out, ": {count}</span>")?;
    }
    out.push_str("</div></div>");

    if chapter.pages.is_empty() {
        out.push_str("<div class=\"no-results\">No content available for this chapter.</div>");
    }
    for page in &chapter.pages {
        write_page(out, page, state)?;
    }
    Ok(())
}

/// Chapter header followed by every page of the chapter.
#[tracing::instrument(skip_all, fields(chapter = %chapter.id))]
pub fn render_chapter(corpus: &Corpus, chapter: &Chapter, state: &ViewState) -> String {
    let mut out = String::new();
    let _ = write_chapter(&mut out, corpus, chapter, state);
    out
}

fn write_search_overview(
    out: &mut String,
    summary: &SearchSummary,
    query: &SearchQuery,
) -> std::fmt::Result {
    out.push_str("<div class=\"info-banner\"><h2>Search Results: &quot;");
    escape_body(out, query.as_str())?;
    write!(
        out,
        "&quot;</h2><p>{} found across {} chapter{}. Select a chapter to view the matches in context.</p></div>",
        if summary.total == 1 {
            "1 match".to_string()
        } else {
            format!("{} matches", summary.total)
        },
        summary.chapters.len(),
        if summary.chapters.len() == 1 { "" } else { "s" },
    )?;

    for chapter in &summary.chapters {
        out.push_str("<div class=\"page-block search-result\" data-chapter=\"");
        escape_attr(out, &chapter.chapter_id)?;
        out.push_str("\"><div class=\"page-label\">");
        escape_body(out, &chapter.title)?;
        if !chapter.title_en.is_empty() {
            out.push_str(" — ");
            escape_body(out, &chapter.title_en)?;
        }
        write!(
            out,
            " ({} match{})</div></div>",
            chapter.count,
            if chapter.count == 1 { "" } else { "es" }
        )?;
    }
    Ok(())
}

pub fn render_search_overview(summary: &SearchSummary, query: &SearchQuery) -> String {
    let mut out = String::new();
    let _ = write_search_overview(&mut out, summary, query);
    out
}

/// Render whatever the view state selects: the active chapter if any,
/// otherwise the search overview when the query has matches.
pub fn render(corpus: &Corpus, state: &ViewState) -> RenderOutput {
    if let Some(id) = &state.chapter {
        return match corpus.chapter(id) {
            Some(chapter) => RenderOutput::Chapter(render_chapter(corpus, chapter, state)),
            None => {
                tracing::warn!(chapter = %id, "selected chapter not in corpus");
                RenderOutput::Idle
            }
        };
    }

    let Some(query) = &state.query else {
        return RenderOutput::Idle;
    };
    let summary = summarize(&corpus.chapters, query);
    if summary.is_empty() {
        return RenderOutput::Idle;
    }
    let html = render_search_overview(&summary, query);
    RenderOutput::SearchOverview { summary, html }
}
