//! Literal, case-insensitive search over page text.

use regex::{Regex, RegexBuilder};
use smol_str::SmolStr;

use crate::overlay::ByteRange;
use crate::types::Chapter;

/// Queries shorter than this (in characters, after trimming) are treated
/// as no search at all.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    query: String,
    pattern: Regex,
}

impl SearchQuery {
    /// `None` when the trimmed input is too short to count as a search.
    pub fn parse(raw: &str) -> Option<Self> {
        let query = raw.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return None;
        }
        // Metacharacters are escaped, so the only way to fail is the size limit
        let pattern = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(err) => {
                tracing::warn!(error = %err, "search query rejected");
                return None;
            }
        };
        Some(Self {
            query: query.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }

    /// Non-overlapping matches, left to right.
    pub fn find_matches(&self, text: &str) -> Vec<ByteRange> {
        self.pattern
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| ByteRange::new(m.start(), m.end()))
            .collect()
    }

    pub fn count_matches(&self, text: &str) -> usize {
        self.pattern.find_iter(text).filter(|m| !m.is_empty()).count()
    }
}

impl PartialEq for SearchQuery {
    fn eq(&self, other: &Self) -> bool {
        self.query == other.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMatches {
    pub chapter_id: SmolStr,
    pub title: String,
    pub title_en: String,
    pub count: usize,
}

/// Match counts across a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub total: usize,
    /// Chapters with at least one match, in document order.
    pub chapters: Vec<ChapterMatches>,
}

impl SearchSummary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// One-line description, e.g. `4 matches in 2 chapters`.
    pub fn describe(&self) -> String {
        if self.total == 0 {
            return "No matches".to_string();
        }
        let chapters = self.chapters.len();
        format!(
            "{} match{} in {} chapter{}",
            self.total,
            if self.total == 1 { "" } else { "es" },
            chapters,
            if chapters == 1 { "" } else { "s" },
        )
    }
}

/// Count matches per chapter over every page of the document.
pub fn summarize(chapters: &[Chapter], query: &SearchQuery) -> SearchSummary {
    let mut summary = SearchSummary::default();
    for chapter in chapters {
        let count: usize = chapter
            .pages
            .iter()
            .map(|page| query.count_matches(&page.text))
            .sum();
        if count > 0 {
            summary.total += count;
            summary.chapters.push(ChapterMatches {
                chapter_id: chapter.id.clone(),
                title: chapter.title.clone(),
                title_en: chapter.title_en.clone(),
                count,
            });
        }
    }
    tracing::debug!(
        query = query.as_str(),
        total = summary.total,
        chapters = summary.chapters.len(),
        "search summarized"
    );
    summary
}
