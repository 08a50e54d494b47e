//! Optional rendering capabilities layered onto the base renderer.
//!
//! Extensions are registered on a [`RendererBuilder`](crate::RendererBuilder)
//! and consulted in registration order. The first extension that claims a
//! code block or an event wins; an extension can never remove another.

use pulldown_cmark::{CowStr, Event, Options};

use crate::render::events_to_html;

pub trait Extension {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Parser flags the extension needs.
    fn options(&self) -> Options {
        Options::empty()
    }

    /// Render a fenced code block instead of the highlighter.
    ///
    /// Returns `None` to leave the block to later extensions or the highlighter.
    fn code_block(&self, _lang: &str, _source: &str) -> Option<String> {
        None
    }

    /// Replace a single parser event with zero or more events.
    ///
    /// Returns `None` to pass the event on unchanged.
    fn event<'a>(&self, _event: &Event<'a>) -> Option<Vec<Event<'a>>> {
        None
    }
}

/// `$…$` and `$$…$$` math, emitted with MathJax delimiters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Math;

impl Extension for Math {
    fn name(&self) -> &'static str {
        "math"
    }

    fn options(&self) -> Options {
        Options::ENABLE_MATH
    }

    fn event<'a>(&self, event: &Event<'a>) -> Option<Vec<Event<'a>>> {
        let (open, tex, close) = match event {
            Event::InlineMath(tex) => (r#"<span class="math inline">\("#, tex, r"\)</span>"),
            Event::DisplayMath(tex) => (r#"<span class="math display">\["#, tex, r"\]</span>"),
            _ => return None,
        };
        Some(vec![
            Event::InlineHtml(CowStr::Borrowed(open)),
            Event::Text(tex.clone()),
            Event::InlineHtml(CowStr::Borrowed(close)),
        ])
    }
}

/// Fenced `mermaid` blocks become diagram containers for the Mermaid runtime.
#[derive(Debug, Clone)]
pub struct Mermaid {
    theme: String,
}

impl Mermaid {
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
        }
    }
}

impl Extension for Mermaid {
    fn name(&self) -> &'static str {
        "mermaid"
    }

    fn code_block(&self, lang: &str, source: &str) -> Option<String> {
        if lang != "mermaid" {
            return None;
        }
        // The init directive carries the theme, the diagram itself stays escaped text.
        let directive = format!("%%{{init: {{'theme': '{}'}}}}%%\n", self.theme);
        Some(events_to_html([
            Event::Html(CowStr::Borrowed(r#"<pre class="mermaid">"#)),
            Event::Text(CowStr::from(directive)),
            Event::Text(CowStr::Borrowed(source)),
            Event::Html(CowStr::Borrowed("</pre>\n")),
        ]))
    }
}

/// Footnote references (`[^1]`) and definitions (`[^1]: …`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Footnotes;

impl Extension for Footnotes {
    fn name(&self) -> &'static str {
        "footnotes"
    }

    fn options(&self) -> Options {
        Options::ENABLE_FOOTNOTES
    }
}
