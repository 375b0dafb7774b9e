//! Locating references in page text.
//!
//! Reference offsets come from a different tokenization pass and drift, so
//! the matched text is searched for starting a few characters before the
//! hint. The first occurrence at or after the window start wins, even when
//! a later one sits closer to the hint.

use crate::overlay::{ByteRange, ResolvedSpan};
use crate::types::Reference;

/// How many characters before the hint the search starts.
pub const HINT_WINDOW: usize = 10;

/// Byte offset of the `n`th char, or `text.len()` when `n` is exactly the
/// char count. `None` past the end.
fn char_to_byte(text: &str, n: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(n)
}

/// Exact byte range of `reference` in `text`, or `None` when its text does
/// not occur at or after the search window.
pub fn resolve_span(text: &str, reference: &Reference) -> Option<ByteRange> {
    if reference.text.is_empty() {
        return None;
    }
    let from = char_to_byte(text, reference.start.saturating_sub(HINT_WINDOW))?;
    let found = text[from..].find(reference.text.as_str())?;
    let start = from + found;
    Some(ByteRange::new(start, start + reference.text.len()))
}

/// Resolve every reference, silently dropping those that can't be located.
pub fn resolve_references<'a>(
    text: &str,
    references: impl IntoIterator<Item = &'a Reference>,
) -> Vec<ResolvedSpan<'a>> {
    references
        .into_iter()
        .filter_map(|reference| match resolve_span(text, reference) {
            Some(range) => Some(ResolvedSpan { range, reference }),
            None => {
                tracing::debug!(
                    text = %reference.text,
                    hint = reference.start,
                    entity_type = %reference.entity_type,
                    "reference not found near hint, skipping"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Epistemic;

    fn reference(text: &str, start: usize) -> Reference {
        Reference {
            start,
            end: start + text.chars().count(),
            text: text.to_string(),
            entity_type: "biblical".into(),
            confidence: 0.85,
            epistemic: Epistemic::Factual,
            methods: vec![],
            method: "rule-based".to_string(),
            consensus: false,
        }
    }

    #[test]
    fn test_exact_hint() {
        let text = "Vide Rom. 5 et Gen. 1";
        assert_eq!(resolve_span(text, &reference("Gen. 1", 15)), Some(ByteRange::new(15, 21)));
    }

    #[test]
    fn test_backward_window_absorbs_drift() {
        let text = "the word word appears";
        // first match at or after the window start, not the occurrence nearest the hint (9)
        let range = resolve_span(text, &reference("word", 14)).unwrap();
        assert_eq!(range, ByteRange::new(4, 8));
        assert_eq!(&text[range.to_range()], "word");
    }

    #[test]
    fn test_first_match_in_window_wins() {
        let text = "the word word appears";
        // window starts at 2, so the occurrence at 4 wins over the one at 9
        assert_eq!(resolve_span(text, &reference("word", 12)), Some(ByteRange::new(4, 8)));
        // window starts at 5, past the first occurrence
        assert_eq!(resolve_span(text, &reference("word", 15)), Some(ByteRange::new(9, 13)));
    }

    #[test]
    fn test_occurrence_before_window_is_not_found() {
        let text = "Lutherus scripsit multa et varia de fide et operibus";
        assert_eq!(resolve_span(text, &reference("Lutherus", 40)), None);
    }

    #[test]
    fn test_hint_past_end_of_text() {
        assert_eq!(resolve_span("short", &reference("short", 100)), None);
    }

    #[test]
    fn test_hint_counts_characters_not_bytes() {
        let text = "Stöckel — Melanchthon";
        // char 10 is 'M', at byte 13
        let range = resolve_span(text, &reference("Melanchthon", 10)).unwrap();
        assert_eq!(range.start(), 13);
        assert_eq!(&text[range.to_range()], "Melanchthon");
    }

    #[test]
    fn test_resolve_references_drops_misses() {
        let text = "Augustinus et Hieronymus";
        let refs = vec![
            reference("Hieronymus", 14),
            reference("Ambrosius", 3),
            reference("Augustinus", 0),
        ];
        let spans = resolve_references(text, &refs);
        let found: Vec<_> = spans.iter().map(|s| s.reference.text.as_str()).collect();
        assert_eq!(found, vec!["Hieronymus", "Augustinus"]);
        assert_eq!(spans[0].range, ByteRange::new(14, 24));
    }

    #[test]
    fn test_empty_reference_text() {
        assert_eq!(resolve_span("anything", &reference("", 0)), None);
    }
}
