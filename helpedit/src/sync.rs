//! Document synchronization
//!
//! Copies the content subtree of the live document into the clone document,
//! leaving the rest of the clone (head, navigation, links) untouched.

use crate::document::HelpDocument;
use crate::dom;
use thiserror::Error;

/// Errors that can occur during synchronization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The live document has no content subtree to copy from
    #[error("live document has no content element (class=\"content\")")]
    MissingLiveContent,

    /// The clone document has no content subtree to copy into
    #[error("clone document has no content element (class=\"content\")")]
    MissingCloneContent,
}

/// Replace the clone's content subtree children with deep copies of the live ones
///
/// Both content subtrees are resolved before anything is modified, so a
/// failed call leaves the clone untouched.
///
/// # Parameters
/// * `live` - Document bound to the editing widget
/// * `clone` - Document that gets persisted
///
/// # Returns
/// * `Ok(usize)` - Number of top-level nodes copied
/// * `Err(SyncError)` - One of the documents has no content subtree
pub fn synchronize(live: &HelpDocument, clone: &HelpDocument) -> Result<usize, SyncError> {
    let source = live.content().ok_or(SyncError::MissingLiveContent)?;
    let target = clone.content().ok_or(SyncError::MissingCloneContent)?;

    // Copy before clearing so that synchronizing a document with itself is harmless
    let copies: Vec<_> = source.children.borrow().iter().map(dom::deep_copy).collect();

    dom::remove_children(&target);
    let count = copies.len();
    for node in copies {
        dom::append_child(&target, node);
    }

    log::debug!("Synchronized {} content nodes into clone", count);
    Ok(count)
}
