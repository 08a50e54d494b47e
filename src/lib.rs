mod config;
mod document;
mod error;
mod extension;
mod highlight;
mod render;

pub use config::{CONFIG_FILE, ConfigFile, EffectiveConfig, InvalidField, resolve};
pub use document::Published;
pub use error::{Error, Result};
pub use extension::{Extension, Footnotes, Math, Mermaid};
pub use highlight::Highlighter;
pub use render::{Renderer, RendererBuilder};

use std::fs;
use std::path::Path;

use tracing::info;

/// Convert markdown text to a complete HTML document.
pub fn markdown_to_html(markdown: &str, renderer: &Renderer) -> String {
    document::wrap(&renderer.render(markdown))
}

/// Run the whole pipeline for one configuration.
///
/// Relative `entry`, `output`, theme and grammar paths are resolved against `root`.
pub fn publish(config: &EffectiveConfig, root: &Path) -> Result<Published> {
    let highlighter = Highlighter::new(&config.code_theme, &config.code_languages, root)?;
    let renderer = Renderer::for_config(config, highlighter);
    info!(
        theme = %config.theme,
        code_theme = %config.code_theme,
        extensions = ?renderer.extension_names(),
        "renderer ready"
    );

    let entry = root.join(&config.entry);
    let markdown = fs::read_to_string(&entry).map_err(|source| Error::InputNotFound {
        path: entry.clone(),
        source,
    })?;

    let html = markdown_to_html(&markdown, &renderer);
    let published = document::write(&root.join(&config.output), &html)?;
    info!(path = %published.path.display(), bytes = html.len(), "document written");
    Ok(published)
}
