//! Embedded help templates
//!
//! New help pages start from one of the templates compiled into the binary.
//! Placeholders in the template are replaced by the title, description,
//! categories and parameter labels of the documented menu or program.

use crate::document::{DocumentError, DocumentKind, HelpDocument};
use crate::dom;
use crate::navigation;
use itertools::Itertools;
use thiserror::Error;

/// Placeholder replaced by the menu or program title
pub const TITLE_PLACEHOLDER: &str = "Flow/Program Title";

/// Placeholder replaced by the one-line description
pub const DESCRIPTION_PLACEHOLDER: &str = "Put here an one-line description";

/// Placeholder replaced by the category list
pub const CATEGORIES_PLACEHOLDER: &str = "First category | Second category | ...";

/// Placeholder replaced by one list item per parameter
pub const PARAMETER_PLACEHOLDER: &str =
    "<li><span class=\"label\">[label for parameter]</span> detailed description comes here.</li>";

/// Class of the block documenting parameters (program help only)
pub const PARAMETERS_CLASS: &str = "parameters";

/// Errors that can occur when rendering a template
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to render help: {0}")]
    Document(#[from] DocumentError),
}

/// Template metadata for display and lookup
#[derive(Debug, Clone)]
pub struct TemplateInfo {
    /// Template identifier (e.g., "program-help")
    pub id: &'static str,
    /// Kind of help the template produces
    pub kind: DocumentKind,
    /// Template HTML content
    pub content: &'static str,
}

/// Get all available templates
pub fn get_all_templates() -> Vec<TemplateInfo> {
    vec![
        get_template(DocumentKind::Menu),
        get_template(DocumentKind::Program),
    ]
}

/// Get the built-in template for a kind of help
pub fn get_template(kind: DocumentKind) -> TemplateInfo {
    match kind {
        DocumentKind::Menu => TemplateInfo {
            id: "menu-help",
            kind,
            content: include_str!("templates/menu-help.html"),
        },
        DocumentKind::Program => TemplateInfo {
            id: "program-help",
            kind,
            content: include_str!("templates/program-help.html"),
        },
    }
}

/// Values substituted into a template
#[derive(Debug, Clone, Default)]
pub struct HelpFields {
    /// Menu or program title
    pub title: String,
    /// One-line description
    pub description: String,
    /// Categories the menu belongs to
    pub categories: Vec<String>,
    /// Labels of the program parameters
    pub parameters: Vec<String>,
}

/// Render a help page from `template`
///
/// Title, description and categories replace every occurrence of their
/// placeholder; empty values leave the placeholder in place. For program help
/// the parameter placeholder is replaced by one item per label. For menu help
/// the parameters block is removed. The navigation index, if the template has
/// one, is generated from the resulting headings.
///
/// # Returns
/// * `Ok(String)` - Complete page, doctype included
/// * `Err(TemplateError)` - The rendered page could not be serialized
pub fn render_help(
    template: &str,
    kind: DocumentKind,
    fields: &HelpFields,
) -> Result<String, TemplateError> {
    let mut help = template.to_string();

    if !fields.title.is_empty() {
        help = help.replace(TITLE_PLACEHOLDER, &escape_html(&fields.title));
    }
    if !fields.description.is_empty() {
        help = help.replace(DESCRIPTION_PLACEHOLDER, &escape_html(&fields.description));
    }
    if !fields.categories.is_empty() {
        let categories = fields.categories.iter().map(|c| escape_html(c)).join(" | ");
        help = help.replace(CATEGORIES_PLACEHOLDER, &categories);
    }

    if kind == DocumentKind::Program {
        let items = fields
            .parameters
            .iter()
            .map(|label| {
                format!(
                    "<li><span class=\"label\">[{}]</span> detailed description comes here.</li>",
                    escape_html(label)
                )
            })
            .join("\n");
        help = help.replacen(PARAMETER_PLACEHOLDER, &items, 1);
    }

    let doc = HelpDocument::parse(&help);
    if kind == DocumentKind::Menu {
        let blocks: Vec<_> = dom::descendants(doc.root())
            .into_iter()
            .filter(|node| dom::has_class(node, PARAMETERS_CLASS))
            .collect();
        for block in &blocks {
            dom::detach(block);
        }
    }
    navigation::rebuild_index(&doc);

    Ok(format!("<!DOCTYPE html>\n{}\n", doc.to_html()?))
}

/// Escape HTML special characters
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
