//! Help document model
//!
//! A `HelpDocument` is one parsed help page. Two instances exist per editing
//! session: the live document bound to the editing widget and the clone that
//! gets persisted.

use crate::dom;
use clap::ValueEnum;
use markup5ever_rcdom::{Handle, RcDom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class marking the user-authored content subtree
pub const CONTENT_CLASS: &str = "content";

/// Class marking the navigation block
pub const NAVIGATION_CLASS: &str = "navigation";

/// Class marking the links block
pub const LINKS_CLASS: &str = "links";

/// Which kind of help a document holds
///
/// Menu help documents a whole menu and carries a navigation index.
/// Program help documents a single program and may predate the content
/// marker, in which case the content subtree is synthesized on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Help of a menu (navigation index, legacy anchor upgrade)
    #[default]
    Menu,
    /// Help of a single program
    Program,
}

impl DocumentKind {
    /// Whether a missing content subtree may be synthesized from the body
    pub fn synthesizes_content(self) -> bool {
        matches!(self, Self::Program)
    }

    /// Whether documents of this kind go through the legacy anchor upgrade
    pub fn upgrades_anchors(self) -> bool {
        matches!(self, Self::Menu)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Menu => write!(f, "menu"),
            Self::Program => write!(f, "program"),
        }
    }
}

/// Errors raised by document-level operations
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document has no root element")]
    MissingRoot,

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] std::io::Error),
}

/// One parsed help page
pub struct HelpDocument {
    dom: RcDom,
}

impl HelpDocument {
    /// Parse a complete help page
    pub fn parse(markup: &str) -> Self {
        Self {
            dom: dom::parse_document(markup),
        }
    }

    /// The document node (parent of the `<html>` element)
    pub fn root(&self) -> &Handle {
        &self.dom.document
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Option<Handle> {
        self.dom
            .document
            .children
            .borrow()
            .iter()
            .find(|node| dom::is_element(node, "html"))
            .cloned()
    }

    pub fn head(&self) -> Option<Handle> {
        dom::find_by_tag(self.root(), "head")
    }

    pub fn body(&self) -> Option<Handle> {
        dom::find_by_tag(self.root(), "body")
    }

    /// The content subtree, if the document has one
    pub fn content(&self) -> Option<Handle> {
        dom::find_by_class(self.root(), CONTENT_CLASS)
    }

    /// The navigation block, if the document has one
    pub fn navigation(&self) -> Option<Handle> {
        dom::find_by_class(self.root(), NAVIGATION_CLASS)
    }

    /// The links block, if the document has one
    pub fn links(&self) -> Option<Handle> {
        dom::find_by_class(self.root(), LINKS_CLASS)
    }

    /// Create an independent document holding a deep copy of the `<html>` element
    ///
    /// Only the document element is copied; the doctype is not carried over.
    pub fn deep_clone(&self) -> Self {
        let dom = RcDom::default();
        if let Some(html) = self.document_element() {
            dom::append_child(&dom.document, dom::deep_copy(&html));
        }
        Self { dom }
    }

    /// Serialize the `<html>` element, head and body included
    ///
    /// This is the persisted representation of a help page.
    pub fn to_html(&self) -> Result<String, DocumentError> {
        let html = self.document_element().ok_or(DocumentError::MissingRoot)?;
        Ok(dom::outer_html(&html)?)
    }

    /// Serialize the whole page, doctype and top-level comments included
    ///
    /// Used when a file is rewritten in place rather than stored by an
    /// editing session.
    pub fn to_page(&self) -> Result<String, DocumentError> {
        self.document_element().ok_or(DocumentError::MissingRoot)?;
        Ok(dom::inner_html(self.root())?)
    }
}

impl std::fmt::Debug for HelpDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpDocument")
            .field("has_content", &self.content().is_some())
            .field("has_navigation", &self.navigation().is_some())
            .finish()
    }
}
