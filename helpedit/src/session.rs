//! Help editing session
//!
//! An `EditSession` owns everything one help page needs while it is being
//! edited: the live document bound to the editing widget, the clone that gets
//! persisted, the document kind and the widget itself. Lifecycle events from
//! the host (load, commit, close, refresh, preview toggle) map to methods.
//!
//! Documents are `Rc` trees, so a session stays on the thread that opened it.
//! Callers must not run session operations while the widget accepts input.

use crate::config::EditorConfig;
use crate::document::{DocumentError, DocumentKind, HelpDocument};
use crate::dom;
use crate::navigation::{self, Link};
use crate::preprocess::{PreprocessError, Preprocessor};
use crate::sync::{self, SyncError};
use crate::upgrade::{self, UpgradeReport};
use markup5ever_rcdom::Handle;
use thiserror::Error;

/// Errors that can occur during an editing session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("help has no content element (class=\"content\") to edit")]
    MissingContent,

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

/// The rich-text editing surface
///
/// The widget edits the live document's content subtree. It buffers changes
/// and only writes them back when asked to.
pub trait EditingWidget {
    /// Bind the widget to a content subtree
    fn load(&mut self, content: &Handle);

    /// Write pending edits into the content subtree
    fn commit_pending(&mut self, content: &Handle);

    /// Whether the content changed since the last reset
    fn is_dirty(&self) -> bool;

    /// Forget about changes made so far
    fn reset_dirty(&mut self);

    /// Current markup of the edited content
    fn data(&self) -> String;
}

/// An editing widget that keeps the pending edit as an HTML fragment
///
/// Dirtiness is judged against a snapshot taken at load and at every reset,
/// so editing back to the snapshot makes the widget clean again.
#[derive(Debug, Clone, Default)]
pub struct BufferedWidget {
    data: String,
    snapshot: String,
    pending: Option<String>,
}

impl BufferedWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the edited content with `markup`, as a user would
    pub fn edit(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        self.data = markup.clone();
        self.pending = Some(markup);
    }
}

impl EditingWidget for BufferedWidget {
    fn load(&mut self, content: &Handle) {
        self.data = dom::inner_html(content).unwrap_or_else(|e| {
            log::warn!("Failed to read content into editor: {}", e);
            String::new()
        });
        self.snapshot = self.data.clone();
        self.pending = None;
    }

    fn commit_pending(&mut self, content: &Handle) {
        if let Some(markup) = self.pending.take() {
            dom::remove_children(content);
            for node in dom::parse_fragment(&markup) {
                dom::append_child(content, node);
            }
        }
    }

    fn is_dirty(&self) -> bool {
        self.data != self.snapshot
    }

    fn reset_dirty(&mut self) {
        self.snapshot = self.data.clone();
    }

    fn data(&self) -> String {
        self.data.clone()
    }
}

/// Which surface is currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The editing widget
    Editing,
    /// The rendered page (preview)
    Rendered,
}

/// One help page being edited
pub struct EditSession<W: EditingWidget> {
    live: HelpDocument,
    clone: HelpDocument,
    kind: DocumentKind,
    widget: W,
    committed: bool,
    surface: Surface,
    upgrade: UpgradeReport,
}

impl<W: EditingWidget> EditSession<W> {
    /// Load a help page and bind the widget to it
    ///
    /// The raw markup is pre-processed, parsed into the live document and
    /// copied into the clone, whose stylesheet link is made relative again.
    /// Both go through the legacy upgrade once before the widget is bound to
    /// the live content subtree.
    pub fn open(
        raw: &str,
        kind: DocumentKind,
        mut widget: W,
        config: &EditorConfig,
    ) -> Result<Self, SessionError> {
        let preprocessor = Preprocessor::new(&config.stylesheet_name, &config.css_href)?;
        let live = HelpDocument::parse(&preprocessor.process(raw));
        let clone = live.deep_clone();
        preprocessor.restore_stylesheet(&clone);

        let report = upgrade::upgrade_document(&live, kind);
        upgrade::upgrade_document(&clone, kind);

        let content = live.content().ok_or(SessionError::MissingContent)?;
        widget.load(&content);

        log::info!("Opened {} help for editing", kind);
        Ok(Self {
            live,
            clone,
            kind,
            widget,
            committed: false,
            surface: Surface::Editing,
            upgrade: report,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn live(&self) -> &HelpDocument {
        &self.live
    }

    pub fn clone_document(&self) -> &HelpDocument {
        &self.clone
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// What the load-time upgrade changed in the live document
    pub fn upgrade_report(&self) -> UpgradeReport {
        self.upgrade
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Mark the content as already committed (or not) by the host
    pub fn set_committed(&mut self, committed: bool) {
        self.committed = committed;
    }

    pub fn is_dirty(&self) -> bool {
        self.widget.is_dirty()
    }

    /// Committed and not changed since
    pub fn is_content_saved(&self) -> bool {
        self.committed && !self.widget.is_dirty()
    }

    pub fn is_content_empty(&self) -> bool {
        self.widget.data().is_empty()
    }

    fn flush_widget(&mut self) -> Result<(), SessionError> {
        let content = self.live.content().ok_or(SessionError::MissingContent)?;
        self.widget.commit_pending(&content);
        Ok(())
    }

    fn rebuild_indexes(&self) {
        navigation::rebuild_index(&self.live);
        navigation::rebuild_index(&self.clone);
    }

    /// Full markup of the help with the current edits
    ///
    /// Flushes the widget, synchronizes the clone and rebuilds both indexes.
    pub fn content(&mut self) -> Result<String, SessionError> {
        self.flush_widget()?;
        sync::synchronize(&self.live, &self.clone)?;
        self.rebuild_indexes();
        Ok(self.clone.to_html()?)
    }

    /// Produce the markup to store and mark it as committed
    pub fn commit(&mut self) -> Result<String, SessionError> {
        let help = self.content()?;
        self.widget.reset_dirty();
        self.committed = true;
        log::info!("Committed {} help ({} bytes)", self.kind, help.len());
        Ok(help)
    }

    /// End the session, returning the final markup
    pub fn close(mut self) -> Result<String, SessionError> {
        self.widget.reset_dirty();
        self.content()
    }

    /// Synchronize the clone without touching the navigation index
    pub fn refresh(&mut self) -> Result<String, SessionError> {
        self.flush_widget()?;
        sync::synchronize(&self.live, &self.clone)?;
        Ok(self.clone.to_html()?)
    }

    /// Switch between the editing widget and the rendered page
    ///
    /// Pending edits are written into the live document and its index is
    /// rebuilt so the rendered page is current. Content is not synchronized.
    pub fn toggle_preview(&mut self) -> Result<Surface, SessionError> {
        self.flush_widget()?;
        navigation::rebuild_index(&self.live);
        self.surface = match self.surface {
            Surface::Editing => Surface::Rendered,
            Surface::Rendered => Surface::Editing,
        };
        Ok(self.surface)
    }

    /// Rebuild the links block of both documents
    pub fn set_links(&mut self, links: &[Link]) -> bool {
        let live = navigation::rebuild_links(&self.live, links);
        let clone = navigation::rebuild_links(&self.clone, links);
        live && clone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU_HELP: &str = r#"<html><head><link rel="stylesheet" href="gebr.css"></head><body>
<div class="navigation"></div>
<div class="content"><h2><a name="old"></a>Intro</h2><p>text</p></div>
</body></html>"#;

    fn open_menu() -> EditSession<BufferedWidget> {
        let config = EditorConfig::default();
        EditSession::open(MENU_HELP, DocumentKind::Menu, BufferedWidget::new(), &config).unwrap()
    }

    #[test]
    fn test_open_upgrades_both_documents() {
        let session = open_menu();

        assert_eq!(session.upgrade_report().anchors_removed, 1);
        for doc in [session.live(), session.clone_document()] {
            let content = doc.content().unwrap();
            assert!(dom::elements_by_tag(&content, "a").is_empty());
            assert_eq!(
                dom::elements_by_tag(&doc.navigation().unwrap(), "li").len(),
                1
            );
        }
        assert_eq!(session.widget().data(), "<h2 id=\"header_0\">Intro</h2><p>text</p>");
        assert!(!session.is_dirty());
        assert_eq!(session.surface(), Surface::Editing);
    }

    fn installed_config() -> EditorConfig {
        let mut config = EditorConfig::default();
        config.css_href = "file:///opt/help/gebr.css".to_string();
        config
    }

    fn stylesheet_href(doc: &HelpDocument) -> Option<String> {
        let head = doc.head().unwrap();
        let link = dom::find_by_tag(&head, "link").unwrap();
        dom::get_attribute(&link, "href")
    }

    #[test]
    fn test_open_rewrites_stylesheet_of_live_only() {
        let session = EditSession::open(
            MENU_HELP,
            DocumentKind::Menu,
            BufferedWidget::new(),
            &installed_config(),
        )
        .unwrap();

        assert_eq!(
            stylesheet_href(session.live()).as_deref(),
            Some("file:///opt/help/gebr.css")
        );
        assert_eq!(
            stylesheet_href(session.clone_document()).as_deref(),
            Some("gebr.css")
        );
    }

    #[test]
    fn test_close_keeps_relative_stylesheet() {
        let mut session = EditSession::open(
            MENU_HELP,
            DocumentKind::Menu,
            BufferedWidget::new(),
            &installed_config(),
        )
        .unwrap();
        session.widget_mut().edit("<h2>Intro</h2><p>edited</p>");

        let help = session.close().unwrap();

        assert!(!help.contains("file:///opt/help"));
        let doc = HelpDocument::parse(&help);
        assert_eq!(stylesheet_href(&doc).as_deref(), Some("gebr.css"));
    }

    #[test]
    fn test_commit_synchronizes_and_indexes() {
        let mut session = open_menu();
        session
            .widget_mut()
            .edit("<h2>First</h2><p>a</p><h2>Second</h2>");
        assert!(session.is_dirty());
        assert!(!session.is_content_saved());

        let help = session.commit().unwrap();

        assert!(help.starts_with("<html>"));
        assert!(help.contains("<li><a href=\"#header_1\">Second</a></li>"));
        assert!(help.contains("<h2 id=\"header_0\">First</h2>"));
        assert!(session.is_content_saved());

        session.widget_mut().edit("<p>changed</p>");
        assert!(!session.is_content_saved());
    }

    #[test]
    fn test_close_returns_final_markup() {
        let mut session = open_menu();
        session.widget_mut().edit("<h2>Only</h2>");

        let help = session.close().unwrap();

        let doc = HelpDocument::parse(&help);
        assert_eq!(dom::text_content(&doc.content().unwrap()), "Only");
        assert!(doc.head().is_some());
    }

    #[test]
    fn test_refresh_does_not_rebuild_index() {
        let mut session = open_menu();
        session.widget_mut().edit("<h2>A</h2><h2>B</h2>");

        let help = session.refresh().unwrap();
        let doc = HelpDocument::parse(&help);

        assert_eq!(dom::text_content(&doc.content().unwrap()), "AB");
        assert_eq!(
            dom::elements_by_tag(&doc.navigation().unwrap(), "li").len(),
            1
        );
    }

    #[test]
    fn test_toggle_preview_updates_live_only() {
        let mut session = open_menu();
        session.widget_mut().edit("<h2>A</h2><h2>B</h2>");

        assert_eq!(session.toggle_preview().unwrap(), Surface::Rendered);

        let live_nav = session.live().navigation().unwrap();
        assert_eq!(dom::elements_by_tag(&live_nav, "li").len(), 2);
        let clone_content = session.clone_document().content().unwrap();
        assert_eq!(dom::text_content(&clone_content), "Introtext");

        assert_eq!(session.toggle_preview().unwrap(), Surface::Editing);
    }

    #[test]
    fn test_program_help_without_content_is_wrapped() {
        let session = EditSession::open(
            "<html><head></head><body><p>legacy program help</p></body></html>",
            DocumentKind::Program,
            BufferedWidget::new(),
            &EditorConfig::for_kind(DocumentKind::Program),
        )
        .unwrap();

        assert!(session.upgrade_report().content_synthesized);
        assert!(session.clone_document().content().is_some());
        assert_eq!(session.widget().data(), "<p>legacy program help</p>");
    }

    #[test]
    fn test_menu_help_without_content_fails() {
        let result = EditSession::open(
            "<html><body><p>no content</p></body></html>",
            DocumentKind::Menu,
            BufferedWidget::new(),
            &EditorConfig::default(),
        );
        assert!(matches!(result, Err(SessionError::MissingContent)));
    }

    #[test]
    fn test_set_links_on_both_documents() {
        let mut session = open_menu();
        assert!(session.set_links(&[Link::new("Manual", "manual.html")]));

        let help = session.commit().unwrap();
        assert!(help.contains("<div class=\"links\"><h2>Links</h2><ul><li><a href=\"manual.html\">Manual</a></li></ul></div>"));
        assert!(session.live().links().is_some());
    }

    #[test]
    fn test_editing_back_to_snapshot_is_clean() {
        let mut session = open_menu();
        let original = session.widget().data();

        session.widget_mut().edit("<p>draft</p>");
        assert!(session.is_dirty());
        session.widget_mut().edit(original);
        assert!(!session.is_dirty());

        session.widget_mut().edit("<p>saved</p>");
        session.commit().unwrap();
        session.widget_mut().edit("<p>again</p>");
        session.widget_mut().edit("<p>saved</p>");
        assert!(!session.is_dirty());
        assert!(session.is_content_saved());
    }

    #[test]
    fn test_content_emptiness() {
        let mut session = open_menu();
        assert!(!session.is_content_empty());
        session.widget_mut().edit("");
        assert!(session.is_content_empty());
    }

    #[test]
    fn test_set_committed() {
        let mut session = open_menu();
        assert!(!session.is_content_saved());
        session.set_committed(true);
        assert!(session.is_content_saved());
    }
}
