use super::types::{ByteRange, ResolvedSpan, Wrapper};
use super::{OverlayOutput, emit_overlay, merge_layers};
use crate::escape::{escape_attr, escape_body};
use crate::types::Reference;
use std::fmt::Write;

pub struct HtmlOverlayOutput<W: Write> {
    writer: W,
}

impl<W: Write> HtmlOverlayOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_attr(&mut self, name: &str, value: &str) -> std::fmt::Result {
        write!(self.writer, " {name}=\"")?;
        escape_attr(&mut self.writer, value)?;
        self.writer.write_char('"')
    }

    fn open_reference(&mut self, reference: &Reference) -> std::fmt::Result {
        self.writer.write_str("<span class=\"ref-highlight\"")?;
        self.write_attr("data-type", &reference.entity_type)?;
        write!(self.writer, " data-confidence=\"{}\"", reference.confidence)?;
        self.write_attr("data-epistemic", reference.epistemic.as_str())?;
        self.write_attr("data-text", &reference.text)?;
        if reference.method.is_empty() {
            self.write_attr("data-method", &reference.detection_methods().join(" + "))?;
        } else {
            self.write_attr("data-method", &reference.method)?;
        }
        self.writer.write_char('>')
    }
}

impl<W: Write> OverlayOutput for HtmlOverlayOutput<W> {
    type Error = std::fmt::Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        escape_body(&mut self.writer, text)
    }

    fn open(&mut self, wrapper: &Wrapper<'_>) -> Result<(), Self::Error> {
        match wrapper {
            Wrapper::Reference(reference) => self.open_reference(reference),
            Wrapper::SearchMatch => self.writer.write_str("<span class=\"search-highlight\">"),
        }
    }

    fn close(&mut self, _wrapper: &Wrapper<'_>) -> Result<(), Self::Error> {
        self.writer.write_str("</span>")
    }
}

/// Render `text` with both annotation layers as an escaped markup fragment.
pub fn render_overlay_html(
    text: &str,
    references: &[ResolvedSpan<'_>],
    matches: &[ByteRange],
) -> Result<String, std::fmt::Error> {
    let events = merge_layers(text, references, matches);
    let mut output = HtmlOverlayOutput::new(String::with_capacity(text.len() + events.len() * 48));
    emit_overlay(text, &events, &mut output)?;
    Ok(output.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_body_string;
    use crate::types::Epistemic;

    fn reference(text: &str) -> Reference {
        Reference {
            start: 0,
            end: text.chars().count(),
            text: text.to_string(),
            entity_type: "biblical".into(),
            confidence: 0.85,
            epistemic: Epistemic::Factual,
            methods: vec!["rule-based".into()],
            method: "rule-based".to_string(),
            consensus: false,
        }
    }

    #[test]
    fn test_plain_text_is_escaped_once() {
        let text = "Si <deus> & \"homo\"";
        let html = render_overlay_html(text, &[], &[]).unwrap();
        assert_eq!(html, escape_body_string(text));
    }

    #[test]
    fn test_reference_wrapper_attributes() {
        let r = reference("Rom. 5");
        let spans = [ResolvedSpan {
            range: ByteRange::new(5, 11),
            reference: &r,
        }];
        let html = render_overlay_html("Vide Rom. 5 & c.", &spans, &[]).unwrap();
        insta::assert_snapshot!(html, @r#"Vide <span class="ref-highlight" data-type="biblical" data-confidence="0.85" data-epistemic="FACTUAL" data-text="Rom. 5" data-method="rule-based">Rom. 5</span> &amp; c."#);
    }

    #[test]
    fn test_quote_in_reference_text_is_escaped_in_attribute() {
        let r = reference("\"Symbolo\"");
        let spans = [ResolvedSpan {
            range: ByteRange::new(3, 12),
            reference: &r,
        }];
        let html = render_overlay_html("in \"Symbolo\" Niceno", &spans, &[]).unwrap();
        assert!(html.contains("data-text=\"&quot;Symbolo&quot;\""));
        assert!(html.contains(">&quot;Symbolo&quot;</span>"));
        assert!(!html.contains("\"Symbolo\""));
    }

    #[test]
    fn test_search_highlight() {
        let html = render_overlay_html("a<b>a", &[], &[ByteRange::new(1, 4)]).unwrap();
        assert_eq!(html, "a<span class=\"search-highlight\">&lt;b&gt;</span>a");
    }

    #[test]
    fn test_joined_methods_when_tag_missing() {
        let mut r = reference("Gen. 1");
        r.method.clear();
        r.methods = vec!["rule-based".into(), "CRF".into()];
        let spans = [ResolvedSpan {
            range: ByteRange::new(0, 6),
            reference: &r,
        }];
        let html = render_overlay_html("Gen. 1", &spans, &[]).unwrap();
        assert!(html.contains("data-method=\"rule-based + CRF\""));
    }
}
