//! Legacy help format upgrade
//!
//! Older help pages differ from the current format in three ways:
//! - program help may lack the content subtree entirely
//! - headings were anchored with nested empty `<a>` elements instead of ids
//! - the head may declare a charset other than UTF-8
//!
//! The functions here normalize a document once, right after it is loaded and
//! before the first synchronization.

use crate::document::{DocumentKind, HelpDocument, CONTENT_CLASS};
use crate::dom;
use crate::navigation;
use markup5ever_rcdom::Handle;

/// What an upgrade pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// A content subtree was synthesized from the body
    pub content_synthesized: bool,
    /// Number of vestigial empty anchors removed
    pub anchors_removed: usize,
    /// Number of navigation entries written (`None` when there is no navigation block)
    pub index_entries: Option<usize>,
}

/// Make sure the document has a content subtree
///
/// For kinds that allow it, a missing content subtree is created by wrapping
/// every child of `<body>` into `<div class="content">`. Running this on a
/// document that already has one does nothing.
///
/// # Returns
/// * `Some(Handle)` - The (possibly new) content subtree
/// * `None` - No content subtree and none could be synthesized
pub fn ensure_content(doc: &HelpDocument, kind: DocumentKind) -> Option<Handle> {
    if let Some(content) = doc.content() {
        return Some(content);
    }
    if !kind.synthesizes_content() {
        return None;
    }

    let body = doc.body()?;
    let content = dom::create_element("div");
    dom::set_attribute(&content, "class", CONTENT_CLASS);
    for child in dom::take_children(&body) {
        dom::append_child(&content, child);
    }
    dom::append_child(&body, content.clone());

    log::info!("Synthesized content element for legacy {} help", kind);
    Some(content)
}

/// Whether an anchor is a leftover of the old heading-anchor scheme
///
/// An anchor is vestigial when its inner markup (not just its text) is empty
/// or whitespace only, so anchors holding an image or a comment are kept.
fn is_vestigial_anchor(anchor: &Handle) -> bool {
    match dom::inner_html(anchor) {
        Ok(markup) => markup.chars().all(char::is_whitespace),
        Err(e) => {
            log::warn!("Failed to serialize anchor, keeping it: {}", e);
            false
        }
    }
}

/// Remove every empty `<a>` from the content subtree
///
/// All condemned anchors are collected before any is detached.
///
/// # Returns
/// * `usize` - Number of anchors removed
pub fn strip_empty_anchors(doc: &HelpDocument) -> usize {
    let Some(content) = doc.content() else {
        log::warn!("No content element, skipping anchor removal");
        return 0;
    };

    let condemned: Vec<Handle> = dom::elements_by_tag(&content, "a")
        .into_iter()
        .filter(is_vestigial_anchor)
        .collect();

    for anchor in &condemned {
        log::debug!(
            "Removing empty anchor (href={:?})",
            dom::get_attribute(anchor, "href")
        );
        dom::detach(anchor);
    }

    condemned.len()
}

/// Declare UTF-8 as the page charset
///
/// Removes every `<meta http-equiv="content-type">` from the head and inserts
/// a single UTF-8 declaration as its first child.
///
/// # Returns
/// * `true` - The head was updated
/// * `false` - The document has no `<head>`
pub fn force_utf8(doc: &HelpDocument) -> bool {
    let Some(head) = doc.head() else {
        log::warn!("Document has no head, charset not declared");
        return false;
    };

    let declarations: Vec<Handle> = dom::elements_by_tag(&head, "meta")
        .into_iter()
        .filter(|meta| {
            dom::get_attribute(meta, "http-equiv")
                .is_some_and(|value| value.eq_ignore_ascii_case("content-type"))
        })
        .collect();
    for meta in &declarations {
        dom::detach(meta);
    }

    let meta = dom::create_element("meta");
    dom::set_attribute(&meta, "http-equiv", "Content-Type");
    dom::set_attribute(&meta, "content", "text/html; charset=UTF-8");
    dom::prepend_child(&head, meta);
    true
}

/// Strip vestigial anchors, then regenerate the navigation index
pub fn upgrade_help_format(doc: &HelpDocument) -> UpgradeReport {
    let anchors_removed = strip_empty_anchors(doc);
    let index_entries = navigation::rebuild_index(doc);
    UpgradeReport {
        anchors_removed,
        index_entries,
        ..Default::default()
    }
}

/// Run every load-time normalization appropriate for `kind`
pub fn upgrade_document(doc: &HelpDocument, kind: DocumentKind) -> UpgradeReport {
    let had_content = doc.content().is_some();
    let content_synthesized = ensure_content(doc, kind).is_some() && !had_content;

    force_utf8(doc);

    let mut report = if kind.upgrades_anchors() {
        upgrade_help_format(doc)
    } else {
        UpgradeReport::default()
    };
    report.content_synthesized = content_synthesized;

    log::info!(
        "Upgraded {} help: {} anchors removed, content synthesized: {}",
        kind,
        report.anchors_removed,
        report.content_synthesized
    );
    report
}
