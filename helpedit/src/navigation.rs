//! Navigation index generation
//!
//! Rebuilds the navigation block of a help page from the `h2` headings of its
//! content subtree, and the optional links block from a list of external
//! references. Both blocks are rebuilt from scratch on every call.

use crate::document::{HelpDocument, LINKS_CLASS};
use crate::dom;
use markup5ever_rcdom::Handle;
use std::str::FromStr;

/// Heading shown on top of the navigation block
pub const INDEX_TITLE: &str = "Index";

/// Heading shown on top of the links block
pub const LINKS_TITLE: &str = "Links";

/// Tag of the headings listed in the index
pub const SECTION_HEADING: &str = "h2";

/// Anchor identifier assigned to the heading at `position`
pub fn heading_anchor(position: usize) -> String {
    format!("header_{}", position)
}

/// Rebuild the navigation block of `doc`
///
/// Every `h2` of the content subtree gets `id="header_N"` (N being its
/// zero-based position) and one list entry linking to it. The entry's link
/// holds deep copies of the heading's children, so inline formatting is kept.
///
/// # Returns
/// * `Some(usize)` - Number of entries written
/// * `None` - The document has no navigation block; nothing was modified
pub fn rebuild_index(doc: &HelpDocument) -> Option<usize> {
    let navigation = doc.navigation()?;
    let list = reset_block(&navigation, INDEX_TITLE);

    let headings: Vec<Handle> = match doc.content() {
        Some(content) => dom::elements_by_tag(&content, SECTION_HEADING)
            .into_iter()
            .filter(|heading| !dom::contains(&navigation, heading))
            .collect(),
        None => {
            log::warn!("Navigation block found but no content element, index left empty");
            Vec::new()
        }
    };

    for (position, heading) in headings.iter().enumerate() {
        let anchor = heading_anchor(position);

        let link = dom::create_element("a");
        dom::set_attribute(&link, "href", &format!("#{}", anchor));
        for child in heading.children.borrow().iter() {
            dom::append_child(&link, dom::deep_copy(child));
        }

        let item = dom::create_element("li");
        dom::append_child(&item, link);
        dom::append_child(&list, item);

        dom::set_attribute(heading, "id", &anchor);
    }

    log::debug!("Rebuilt navigation index with {} entries", headings.len());
    Some(headings.len())
}

/// Clear `block` and give it a fresh `<h2>title</h2><ul></ul>`
///
/// # Returns
/// * `Handle` - The new, empty list
fn reset_block(block: &Handle, title: &str) -> Handle {
    dom::remove_children(block);

    let heading = dom::create_element(SECTION_HEADING);
    dom::append_child(&heading, dom::create_text(title));
    dom::append_child(block, heading);

    let list = dom::create_element("ul");
    dom::append_child(block, list.clone());
    list
}

/// An entry of the links block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Displayed text, parsed as inline markup
    pub title: String,
    /// Link target
    pub href: String,
}

impl Link {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}

impl FromStr for Link {
    type Err = String;

    /// Parse `TITLE=HREF`; the first `=` separates the two
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((title, href)) if !title.trim().is_empty() && !href.trim().is_empty() => {
                Ok(Self::new(title.trim(), href.trim()))
            }
            _ => Err(format!("expected TITLE=HREF, got '{}'", s)),
        }
    }
}

/// Rebuild the links block of `doc`
///
/// The block is created right after the navigation block when missing.
///
/// # Returns
/// * `true` - The links block was rebuilt
/// * `false` - The document has neither a links nor a navigation block
pub fn rebuild_links(doc: &HelpDocument, links: &[Link]) -> bool {
    let block = match doc.links() {
        Some(block) => block,
        None => {
            let Some(navigation) = doc.navigation() else {
                return false;
            };
            let block = dom::create_element("div");
            dom::set_attribute(&block, "class", LINKS_CLASS);
            if !dom::insert_after(&navigation, block.clone()) {
                return false;
            }
            block
        }
    };

    let list = reset_block(&block, LINKS_TITLE);
    for link in links {
        let anchor = dom::create_element("a");
        dom::set_attribute(&anchor, "href", &link.href);
        for node in dom::parse_fragment(&link.title) {
            dom::append_child(&anchor, node);
        }

        let item = dom::create_element("li");
        dom::append_child(&item, anchor);
        dom::append_child(&list, item);
    }

    log::debug!("Rebuilt links block with {} entries", links.len());
    true
}
