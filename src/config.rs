use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Project configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "mkpub.json";

/// Settings for one conversion run.
///
/// Built once by [`resolve`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub entry: PathBuf,
    pub output: PathBuf,
    /// Document theme name. Carried through but not interpreted by the pipeline.
    pub theme: String,
    pub code_theme: String,
    /// Extra grammars to load: bundled grammar tokens or paths to `.sublime-syntax` files.
    pub code_languages: Vec<String>,
    pub styles: Vec<String>,
    pub math_enabled: bool,
    pub mermaid_enabled: bool,
    pub mermaid_theme: String,
    pub footnotes_enabled: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("index.md"),
            output: PathBuf::from("index.html"),
            theme: "academic".to_string(),
            code_theme: "monokai".to_string(),
            code_languages: Vec::new(),
            styles: Vec::new(),
            math_enabled: true,
            mermaid_enabled: false,
            mermaid_theme: "forest".to_string(),
            footnotes_enabled: false,
        }
    }
}

/// Raw contents of `mkpub.json`.
///
/// Values are kept untyped so each field can apply the override-if-truthy rule.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub entry: Option<Value>,
    pub output: Option<Value>,
    pub theme: Option<Value>,
    pub mathjax: Option<Value>,
    pub footnotes: Option<Value>,
    pub styles: Option<Value>,
    pub code: Option<Value>,
    pub mermaid: Option<Value>,
}

/// A config value that is truthy but has the wrong JSON type.
#[derive(Debug, thiserror::Error)]
#[error("`{field}` must be {expected}")]
pub struct InvalidField {
    field: &'static str,
    expected: &'static str,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(Error::ConfigParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl EffectiveConfig {
    /// Configuration for a single input given on the command line.
    ///
    /// The output lands next to the working directory, named after the input's stem.
    pub fn for_entry(entry: impl Into<PathBuf>) -> Self {
        let entry = entry.into();
        let output = html_output_for(&entry);
        Self {
            entry,
            output,
            ..Self::default()
        }
    }

    /// Combine these settings with a configuration file into a new record.
    ///
    /// Scalars are only replaced by truthy values. `styles` is replaced,
    /// `code.languages` is appended. Without an explicit `output` the
    /// output is derived from the resulting `entry`.
    pub fn with_file(self, file: &ConfigFile) -> Result<Self, InvalidField> {
        let entry = string_field("entry", file.entry.as_ref())?
            .map(PathBuf::from)
            .unwrap_or(self.entry);
        let output = string_field("output", file.output.as_ref())?
            .map(PathBuf::from)
            .unwrap_or_else(|| html_output_for(&entry));
        let theme = string_field("theme", file.theme.as_ref())?.unwrap_or(self.theme);
        let math_enabled = self.math_enabled || flag_field(file.mathjax.as_ref());
        let footnotes_enabled = self.footnotes_enabled || flag_field(file.footnotes.as_ref());
        let styles = string_list_field("styles", file.styles.as_ref())?.unwrap_or(self.styles);

        let code = file.code.as_ref().filter(|v| is_truthy(v));
        let code_theme = string_field("code.theme", code.and_then(|c| c.get("theme")))?
            .unwrap_or(self.code_theme);
        let mut code_languages = self.code_languages;
        if let Some(extra) =
            string_list_field("code.languages", code.and_then(|c| c.get("languages")))?
        {
            code_languages.extend(extra);
        }

        let mermaid = file.mermaid.as_ref().filter(|v| is_truthy(v));
        let mermaid_enabled =
            self.mermaid_enabled || flag_field(mermaid.and_then(|m| m.get("enabled")));
        let mermaid_theme = string_field(
            "mermaid.mermaid-theme",
            mermaid.and_then(|m| m.get("mermaid-theme")),
        )?
        .unwrap_or(self.mermaid_theme);

        Ok(Self {
            entry,
            output,
            theme,
            code_theme,
            code_languages,
            styles,
            math_enabled,
            mermaid_enabled,
            mermaid_theme,
            footnotes_enabled,
        })
    }
}

/// Resolve the effective configuration from positional arguments.
///
/// With one argument the configuration file is never read. With none,
/// `mkpub.json` in `dir` is required.
pub fn resolve(args: &[PathBuf], dir: &Path) -> Result<EffectiveConfig> {
    match args {
        [] => {
            let path = dir.join(CONFIG_FILE);
            debug!(path = %path.display(), "loading configuration file");
            let file = ConfigFile::load(&path)?;
            EffectiveConfig::default()
                .with_file(&file)
                .map_err(|e| Error::ConfigParse {
                    path,
                    message: e.to_string(),
                })
        }
        [entry] => {
            debug!(entry = %entry.display(), "using command-line entry, skipping configuration file");
            Ok(EffectiveConfig::for_entry(entry))
        }
        _ => Err(Error::TooManyArguments(args.len())),
    }
}

/// `<stem>.html`, without the input's directory.
fn html_output_for(entry: &Path) -> PathBuf {
    match entry.file_stem() {
        Some(stem) => {
            let mut name = stem.to_os_string();
            name.push(".html");
            PathBuf::from(name)
        }
        None => PathBuf::from("index.html"),
    }
}

/// Truthiness as the configuration format defines it: `null`, `false`, `0`
/// and `""` are falsy, everything else is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn flag_field(value: Option<&Value>) -> bool {
    value.is_some_and(is_truthy)
}

fn string_field(field: &'static str, value: Option<&Value>) -> Result<Option<String>, InvalidField> {
    match value.filter(|v| is_truthy(v)) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn string_list_field(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<Vec<String>>, InvalidField> {
    let invalid = InvalidField {
        field,
        expected: "an array of strings",
    };
    match value.filter(|v| is_truthy(v)) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Some)
            .ok_or(invalid),
        Some(_) => Err(invalid),
    }
}
