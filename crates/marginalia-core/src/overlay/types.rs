use std::cmp::Ordering;
use std::ops::Range;

use crate::types::Reference;

/// Half-open byte range into a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteRange {
    pub byte_start: usize,
    pub byte_end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            byte_start: start,
            byte_end: end,
        }
    }

    pub fn to_range(self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    pub fn is_empty(&self) -> bool {
        self.byte_start >= self.byte_end
    }

    pub fn start(&self) -> usize {
        self.byte_start
    }

    pub fn end(&self) -> usize {
        self.byte_end
    }

    /// Non-empty, inside `text`, and on char boundaries at both ends.
    pub fn fits(&self, text: &str) -> bool {
        !self.is_empty()
            && self.byte_end <= text.len()
            && text.is_char_boundary(self.byte_start)
            && text.is_char_boundary(self.byte_end)
    }
}

/// A reference located at an exact range of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSpan<'a> {
    pub range: ByteRange,
    pub reference: &'a Reference,
}

/// What an overlay event opens or closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wrapper<'a> {
    Reference(&'a Reference),
    SearchMatch,
}

impl Wrapper<'_> {
    pub fn is_search(&self) -> bool {
        matches!(self, Self::SearchMatch)
    }
}

/// Declaration order is sort order: a wrapper ending at a position is
/// closed before one starting there is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Close,
    Open,
}

/// An open or close marker at a byte position of the text.
///
/// `slot` pairs an open with its close. `end` is the end of the wrapped
/// range, carried on both markers.
#[derive(Debug, Clone, Copy)]
pub struct OverlayEvent<'a> {
    pub pos: usize,
    pub role: Role,
    pub wrapper: Wrapper<'a>,
    pub slot: usize,
    pub end: usize,
}

impl<'a> OverlayEvent<'a> {
    pub fn open(range: ByteRange, wrapper: Wrapper<'a>, slot: usize) -> Self {
        Self {
            pos: range.start(),
            role: Role::Open,
            wrapper,
            slot,
            end: range.end(),
        }
    }

    pub fn close(range: ByteRange, wrapper: Wrapper<'a>, slot: usize) -> Self {
        Self {
            pos: range.end(),
            role: Role::Close,
            wrapper,
            slot,
            end: range.end(),
        }
    }

}

impl OverlayEvent<'_> {
    fn sort_key(&self) -> (usize, Role) {
        (self.pos, self.role)
    }
}

// Only position and role take part in ordering; `sort` is stable, so ties
// keep the order the layers were merged in.
impl PartialEq for OverlayEvent<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for OverlayEvent<'_> {}

impl PartialOrd for OverlayEvent<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OverlayEvent<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
