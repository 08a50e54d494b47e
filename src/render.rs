use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use tracing::debug;

use crate::config::EffectiveConfig;
use crate::extension::{Extension, Footnotes, Math, Mermaid};
use crate::highlight::Highlighter;

/// Parser flags every document gets, before extensions add their own.
fn base_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options
}

/// Markdown to HTML fragment renderer.
///
/// Raw HTML passes through, void elements are written XHTML style and
/// fenced code goes through the highlighter unless an extension claims it.
pub struct Renderer {
    highlighter: Highlighter,
    extensions: Vec<Box<dyn Extension>>,
    options: Options,
}

pub struct RendererBuilder {
    highlighter: Highlighter,
    extensions: Vec<Box<dyn Extension>>,
}

impl RendererBuilder {
    /// Append an extension. Earlier extensions keep precedence.
    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        debug!(extension = extension.name(), "registering extension");
        self.extensions.push(Box::new(extension));
        self
    }

    pub fn build(self) -> Renderer {
        let options = self
            .extensions
            .iter()
            .fold(base_options(), |options, ext| options | ext.options());
        Renderer {
            highlighter: self.highlighter,
            extensions: self.extensions,
            options,
        }
    }
}

impl Renderer {
    pub fn builder(highlighter: Highlighter) -> RendererBuilder {
        RendererBuilder {
            highlighter,
            extensions: Vec::new(),
        }
    }

    /// Renderer with the extensions enabled in `config`, in the order
    /// math, mermaid, footnotes.
    pub fn for_config(config: &EffectiveConfig, highlighter: Highlighter) -> Self {
        let mut builder = Self::builder(highlighter);
        if config.math_enabled {
            builder = builder.with_extension(Math);
        }
        if config.mermaid_enabled {
            builder = builder.with_extension(Mermaid::new(&config.mermaid_theme));
        }
        if config.footnotes_enabled {
            builder = builder.with_extension(Footnotes);
        }
        builder.build()
    }

    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    /// Render markdown text to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let mut events = Vec::new();
        // Language and accumulated source of the fenced block being read.
        let mut fence: Option<(String, String)> = None;

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let lang = info.split_whitespace().next().unwrap_or("").to_string();
                    fence = Some((lang, String::new()));
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some((_, source)) = fence.as_mut() {
                        source.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((lang, source)) = fence.take() {
                        let html = self.code_block(&lang, &source);
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                event => {
                    let replacement = self.extensions.iter().find_map(|ext| ext.event(&event));
                    match replacement {
                        Some(replacement) => events.extend(replacement),
                        None => events.push(event),
                    }
                }
            }
        }

        events_to_html(events)
    }

    fn code_block(&self, lang: &str, source: &str) -> String {
        self.extensions
            .iter()
            .find_map(|ext| ext.code_block(lang, source))
            .unwrap_or_else(|| self.highlighter.highlight(source, lang))
    }
}

/// Text content of an HTML string with all tags removed.
#[cfg(test)]
pub(crate) fn text_of(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text
}

/// Serialize events with pulldown-cmark's HTML writer.
pub(crate) fn events_to_html<'a>(events: impl IntoIterator<Item = Event<'a>>) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}
