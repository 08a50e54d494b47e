//! Syntax highlighting for fenced code blocks.
//!
//! Wraps `syntect`: the bundled grammars plus any extra grammars named in the
//! configuration, and one theme. Output uses inline styles so the document
//! needs no extra stylesheet.

use std::io::Cursor;
use std::path::Path;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::render::events_to_html;

// Monokai is not among syntect's built-in themes.
static MONOKAI: &[u8] = include_bytes!("../assets/Monokai.tmTheme");

pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Load the theme and grammar set.
    ///
    /// `theme` is a bundled theme name (case-insensitive) or a path to a
    /// `.tmTheme` file. Each entry of `languages` is either a token a bundled
    /// grammar already answers to, or a path to a `.sublime-syntax` file or
    /// a directory of them. Relative paths are resolved against `root`.
    pub fn new(theme: &str, languages: &[String], root: &Path) -> Result<Self> {
        let theme = load_theme(theme, root)?;
        let syntaxes = load_syntaxes(languages, root)?;
        debug!(syntaxes = syntaxes.syntaxes().len(), "highlighter ready");
        Ok(Self { syntaxes, theme })
    }

    /// Whether a fence language resolves to a grammar.
    pub(crate) fn supports(&self, lang: &str) -> bool {
        self.syntaxes.find_syntax_by_token(lang).is_some()
    }

    /// Render `code` as a styled `<pre>` block.
    ///
    /// Unknown languages are rendered with the plain-text grammar.
    pub fn highlight(&self, code: &str, lang: &str) -> String {
        if !lang.is_empty() && !self.supports(lang) {
            debug!(lang, "no grammar for fence language, using plain text");
        }
        let syntax = self
            .syntaxes
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme) {
            Ok(html) => html,
            Err(e) => {
                warn!(lang, error = %e, "highlighting failed, emitting plain code block");
                plain_code_block(code, lang)
            }
        }
    }
}

fn load_theme(name: &str, root: &Path) -> Result<Theme> {
    let mut themes = ThemeSet::load_defaults();
    let monokai = ThemeSet::load_from_reader(&mut Cursor::new(MONOKAI))
        .map_err(|e| Error::HighlighterInit(format!("bundled Monokai theme: {e}")))?;
    themes.themes.insert("Monokai".to_string(), monokai);

    if let Some(key) = themes
        .themes
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned()
    {
        if let Some(theme) = themes.themes.remove(&key) {
            return Ok(theme);
        }
    }

    let path = root.join(name);
    if path.extension().is_some_and(|ext| ext == "tmTheme") && path.is_file() {
        return ThemeSet::get_theme(&path)
            .map_err(|e| Error::HighlighterInit(format!("theme {}: {e}", path.display())));
    }

    let known: Vec<_> = themes.themes.keys().map(String::as_str).collect();
    Err(Error::HighlighterInit(format!(
        "unknown theme `{name}` (available: {})",
        known.join(", ")
    )))
}

fn load_syntaxes(languages: &[String], root: &Path) -> Result<SyntaxSet> {
    let bundled = SyntaxSet::load_defaults_newlines();
    let extra: Vec<&String> = languages
        .iter()
        .filter(|lang| bundled.find_syntax_by_token(lang).is_none())
        .collect();
    if extra.is_empty() {
        return Ok(bundled);
    }

    let mut builder = bundled.into_builder();
    for lang in extra {
        let path = root.join(lang);
        if !path.exists() {
            return Err(Error::HighlighterInit(format!("unknown language `{lang}`")));
        }

        let before = builder.syntaxes().len();
        builder
            .add_from_folder(&path, true)
            .map_err(|e| Error::HighlighterInit(format!("grammar {}: {e}", path.display())))?;
        if builder.syntaxes().len() == before {
            return Err(Error::HighlighterInit(format!(
                "no grammar found in {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), "loaded extra grammar");
    }

    Ok(builder.build())
}

fn plain_code_block(code: &str, lang: &str) -> String {
    let events = [
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::from(lang)))),
        Event::Text(CowStr::from(code)),
        Event::End(TagEnd::CodeBlock),
    ];
    events_to_html(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GREET_GRAMMAR: &str = r"%YAML 1.2
---
name: Greeting
file_extensions: [greet]
scope: source.greet
contexts:
  main:
    - match: '\bhello\b'
      scope: keyword.control.greet
";

    fn default_highlighter() -> Highlighter {
        Highlighter::new("monokai", &[], Path::new(".")).unwrap()
    }

    #[test]
    fn bundled_monokai_is_default_theme() {
        let highlighter = default_highlighter();
        let html = highlighter.highlight("print(1)\n", "python");
        assert!(html.starts_with("<pre style=\"background-color:#272822;\">"), "{html}");
    }

    #[test]
    fn theme_lookup_ignores_case() {
        assert!(Highlighter::new("inspiredgithub", &[], Path::new(".")).is_ok());
        assert!(Highlighter::new("Solarized (dark)", &[], Path::new(".")).is_ok());
    }

    #[test]
    fn unknown_theme_fails() {
        let err = Highlighter::new("no-such-theme", &[], Path::new(".")).err().unwrap();
        assert!(matches!(err, Error::HighlighterInit(_)), "got {err:?}");
        assert!(err.to_string().contains("unknown theme `no-such-theme`"));
    }

    #[test]
    fn bundled_language_token_is_accepted() {
        let languages = vec!["python".to_string(), "rs".to_string()];
        let highlighter = Highlighter::new("monokai", &languages, Path::new(".")).unwrap();
        assert!(highlighter.supports("python"));
    }

    #[test]
    fn unknown_language_fails() {
        let dir = tempfile::tempdir().unwrap();
        let languages = vec!["klingon".to_string()];
        let err = Highlighter::new("monokai", &languages, dir.path()).err().unwrap();
        assert!(err.to_string().contains("unknown language `klingon`"), "{err}");
    }

    #[test]
    fn directory_without_grammars_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("grammars")).unwrap();
        let languages = vec!["grammars".to_string()];
        let err = Highlighter::new("monokai", &languages, dir.path()).err().unwrap();
        assert!(err.to_string().contains("no grammar found"), "{err}");
    }

    #[test]
    fn extra_grammar_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("greet.sublime-syntax"), GREET_GRAMMAR).unwrap();
        let languages = vec!["greet.sublime-syntax".to_string()];

        let highlighter = Highlighter::new("monokai", &languages, dir.path()).unwrap();
        assert!(highlighter.supports("greet"));

        let html = highlighter.highlight("hello world\n", "greet");
        assert!(html.contains("color:#f92672;\">hello</span>"), "{html}");
    }

    #[test]
    fn unknown_fence_language_uses_plain_text() {
        let highlighter = default_highlighter();
        assert!(!highlighter.supports("klingon"));
        let html = highlighter.highlight("a < b\n", "klingon");
        assert!(html.starts_with("<pre style="), "{html}");
        assert!(html.contains("a &lt; b"), "{html}");
    }

    #[test]
    fn plain_code_block_escapes() {
        assert_eq!(
            plain_code_block("<b>\n", "txt"),
            "<pre><code class=\"language-txt\">&lt;b&gt;\n</code></pre>\n"
        );
    }
}
