use super::types::{ByteRange, OverlayEvent, ResolvedSpan, Wrapper};

/// Merge the reference layer and the search layer into one ordered event
/// stream over `text`.
///
/// Events are ordered by position, with closes ahead of opens at the same
/// position. Ties between events of the same role keep insertion order
/// (references, then search matches) but callers should not rely on it.
/// Ranges that don't fit the text are dropped.
pub fn merge_layers<'a>(
    text: &str,
    references: &[ResolvedSpan<'a>],
    matches: &[ByteRange],
) -> Vec<OverlayEvent<'a>> {
    let mut events: Vec<OverlayEvent<'a>> =
        Vec::with_capacity(2 * (references.len() + matches.len()));

    let layers = references
        .iter()
        .map(|span| (span.range, Wrapper::Reference(span.reference)))
        .chain(matches.iter().map(|range| (*range, Wrapper::SearchMatch)));

    for (slot, (range, wrapper)) in layers.enumerate() {
        if !range.fits(text) {
            tracing::debug!(
                start = range.start(),
                end = range.end(),
                text_len = text.len(),
                search = wrapper.is_search(),
                "dropping malformed overlay range"
            );
            continue;
        }
        events.push(OverlayEvent::open(range, wrapper, slot));
        events.push(OverlayEvent::close(range, wrapper, slot));
    }

    // stable, so equal keys stay in insertion order
    events.sort();
    events
}
