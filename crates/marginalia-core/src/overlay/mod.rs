//! Annotation overlay: merging the reference and search layers into one
//! properly nested event stream, and walking it against the text.

mod html_output;
mod merge;
mod processor;
mod types;

pub use html_output::{HtmlOverlayOutput, render_overlay_html};
pub use merge::merge_layers;
pub use processor::emit_overlay;
pub use types::{ByteRange, OverlayEvent, ResolvedSpan, Role, Wrapper};

/// Sink for an overlay walk. Text passed to `write_text` is raw; escaping
/// is the sink's job.
pub trait OverlayOutput {
    type Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn open(&mut self, wrapper: &Wrapper<'_>) -> Result<(), Self::Error>;
    fn close(&mut self, wrapper: &Wrapper<'_>) -> Result<(), Self::Error>;
}
