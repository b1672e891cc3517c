use crate::render::Templates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const FILENAME: &str = "claudebook.toml";

const DEFAULT_MAX_CHARS: usize = 4000;

/// A page template: either an inline Jinja2 string or a path to a template
/// file (relative to the directory holding `claudebook.toml`).
///
/// In TOML this looks like one of:
///
/// ```toml
/// [templates.user]
/// inline = "# {{ title }}\n\n{{ body }}"
///
/// # or
///
/// [templates.tool]
/// file = "templates/tool.md.j2"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// An inline Jinja2 template string.
    Inline(String),
    /// Path to a template file.
    File(String),
}

/// Per-page template overrides; unset entries use the built-in templates.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<TemplateSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TemplateSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<TemplateSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TemplateSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<TemplateSource>,
}

/// User-facing preferences stored in `claudebook.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Preferences {
    /// Book title. Derived from the session when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default = "default_language")]
    pub language: String,

    /// Tool results longer than this many characters are truncated.
    #[serde(default = "default_max_chars")]
    pub max_result_chars: usize,

    /// Rendered tool inputs (file contents, diffs) are truncated likewise.
    #[serde(default = "default_max_chars")]
    pub max_input_chars: usize,

    /// Render assistant thinking blocks on text pages.
    #[serde(default = "default_include_thinking")]
    pub include_thinking: bool,

    #[serde(default)]
    pub templates: TemplateOverrides,

    /// Directory that relative template paths resolve against.
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_language() -> String {
    "en".into()
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_include_thinking() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            title: None,
            authors: Vec::new(),
            language: default_language(),
            max_result_chars: default_max_chars(),
            max_input_chars: default_max_chars(),
            include_thinking: default_include_thinking(),
            templates: TemplateOverrides::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Preferences {
    /// Load preferences from `explicit` if given (it must exist), otherwise
    /// from `claudebook.toml` in `dir` if present. Missing keys are filled
    /// in with defaults via serde.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            return Self::parse(&contents, path);
        }
        let path = dir.join(FILENAME);
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents, &path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self {
                base_dir: dir.to_path_buf(),
                ..Self::default()
            }),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut prefs: Preferences =
            toml::from_str(contents).with_context(|| format!("parsing {}", path.display()))?;
        prefs.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tracing::debug!(path = %path.display(), "loaded preferences");
        Ok(prefs)
    }

    /// Write a default `claudebook.toml` into `dir` unless one exists.
    /// Returns the path and whether it was created.
    pub fn write_default(dir: &Path) -> Result<(PathBuf, bool)> {
        let path = dir.join(FILENAME);
        if path.exists() {
            return Ok((path, false));
        }
        let toml_str =
            toml::to_string_pretty(&Preferences::default()).context("serializing default preferences")?;
        fs::write(&path, &toml_str)
            .with_context(|| format!("writing default {}", path.display()))?;
        Ok((path, true))
    }

    fn resolve(&self, source: &TemplateSource) -> Result<String> {
        match source {
            TemplateSource::Inline(s) => Ok(s.clone()),
            TemplateSource::File(name) => {
                let path = self.base_dir.join(name);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template file {}", path.display()))
            }
        }
    }

    /// The built-in templates with every configured override applied.
    pub fn templates(&self) -> Result<Templates> {
        let mut templates = Templates::default();
        let overrides = [
            (&self.templates.user, &mut templates.user),
            (&self.templates.text, &mut templates.text),
            (&self.templates.tool, &mut templates.tool),
            (&self.templates.summary, &mut templates.summary),
            (&self.templates.index, &mut templates.index),
        ];
        for (source, slot) in overrides {
            if let Some(source) = source {
                *slot = self.resolve(source)?;
            }
        }
        Ok(templates)
    }
}
