//! Markup escaping for body text and attribute values.

use std::fmt::{self, Write};

fn body_escape(b: u8) -> Option<&'static str> {
    match b {
        b'&' => Some("&amp;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        b'"' => Some("&quot;"),
        b'\'' => Some("&#39;"),
        _ => None,
    }
}

/// Attribute values additionally keep their whitespace controls, which
/// attribute-value normalization would otherwise fold into spaces.
fn attr_escape(b: u8) -> Option<&'static str> {
    match b {
        b'\n' => Some("&#10;"),
        b'\r' => Some("&#13;"),
        b'\t' => Some("&#9;"),
        _ => body_escape(b),
    }
}

fn escape_with<W: Write>(
    w: &mut W,
    s: &str,
    table: fn(u8) -> Option<&'static str>,
) -> fmt::Result {
    let mut last = 0;
    // only ASCII bytes are replaced, so every slice lands on a char boundary
    for (i, b) in s.bytes().enumerate() {
        if let Some(replacement) = table(b) {
            w.write_str(&s[last..i])?;
            w.write_str(replacement)?;
            last = i + 1;
        }
    }
    w.write_str(&s[last..])
}

/// Escape text for use between tags.
pub fn escape_body<W: Write>(w: &mut W, s: &str) -> fmt::Result {
    escape_with(w, s, body_escape)
}

/// Escape text for use inside a double- or single-quoted attribute value.
pub fn escape_attr<W: Write>(w: &mut W, s: &str) -> fmt::Result {
    escape_with(w, s, attr_escape)
}

pub fn escape_body_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing to a String cannot fail
    let _ = escape_body(&mut out, s);
    out
}
