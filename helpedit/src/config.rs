//! Editor configuration from helpedit.toml

use crate::document::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default name of the configuration file
pub const CONFIG_FILE_NAME: &str = "helpedit.toml";

/// Configuration of the embedded editing widget and of help loading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Kind of help being edited
    pub kind: DocumentKind,

    /// Widget width; when unset the kind's default is used
    pub width: Option<String>,

    /// Widget height in pixels
    pub height: u32,

    /// Whether the user may resize the widget
    pub resize_enabled: bool,

    /// Whether the toolbar can be collapsed
    pub toolbar_can_collapse: bool,

    /// Toolbar button groups, in display order
    pub toolbar: Vec<Vec<String>>,

    /// Paragraph styles offered by the style combo
    pub styles: Vec<ParagraphStyle>,

    /// File name of the help stylesheet referenced by help pages
    pub stylesheet_name: String,

    /// Location the stylesheet link is rewritten to on load
    pub css_href: String,
}

/// A named paragraph style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Name shown in the style combo
    pub name: String,

    /// Element the style produces (e.g. "p", "h2")
    pub element: String,

    /// Optional class set on the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl ParagraphStyle {
    fn new(name: &str, element: &str, class: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            element: element.to_string(),
            class: class.map(str::to_string),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::for_kind(DocumentKind::default())
    }
}

impl EditorConfig {
    /// Default configuration for editing help of `kind`
    pub fn for_kind(kind: DocumentKind) -> Self {
        Self {
            kind,
            width: None,
            height: 300,
            resize_enabled: false,
            toolbar_can_collapse: false,
            toolbar: default_toolbar(),
            styles: default_styles(kind),
            stylesheet_name: "gebr.css".to_string(),
            css_href: "gebr.css".to_string(),
        }
    }

    /// Effective widget width
    ///
    /// Menu help is edited next to the menu tree, so its editor is narrower.
    pub fn width(&self) -> String {
        match (&self.width, self.kind) {
            (Some(width), _) => width.clone(),
            (None, DocumentKind::Menu) => "390".to_string(),
            (None, DocumentKind::Program) => "100%".to_string(),
        }
    }

    /// Load configuration from a helpedit.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(EditorConfig)` - Successfully loaded configuration
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(ConfigError::IoError)?;

        let config: EditorConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        Ok(config)
    }

    /// Load configuration, falling back to the defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::info!(
                "No configuration at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Save configuration to a helpedit.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }
}

fn default_toolbar() -> Vec<Vec<String>> {
    let groups: [&[&str]; 10] = [
        &["Source"],
        &["Bold", "Italic", "Underline"],
        &["Subscript", "Superscript"],
        &["Undo", "Redo"],
        &["JustifyLeft", "JustifyCenter", "JustifyRight", "JustifyBlock"],
        &["NumberedList", "BulletedList"],
        &["Outdent", "Indent", "Blockquote", "Styles"],
        &["Link", "Unlink"],
        &["RemoveFormat"],
        &["Find", "Replace", "Table"],
    ];
    groups
        .iter()
        .map(|group| group.iter().map(|button| button.to_string()).collect())
        .collect()
}

fn default_styles(kind: DocumentKind) -> Vec<ParagraphStyle> {
    let mut styles = vec![
        ParagraphStyle::new("Paragraph", "p", None),
        ParagraphStyle::new("Section", "h2", None),
        ParagraphStyle::new("Subsection", "h3", None),
        ParagraphStyle::new("Code", "pre", None),
    ];
    if kind == DocumentKind::Program {
        styles.push(ParagraphStyle::new("Parameter label", "span", Some("label")));
    }
    styles
}

/// Errors that can occur when loading or saving the editor configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
