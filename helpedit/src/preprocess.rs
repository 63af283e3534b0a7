//! Raw help markup pre-processing
//!
//! Help pages are stored with a relative stylesheet link. Before a page is
//! loaded into the editor the link is pointed at the installed stylesheet so
//! the page renders the same way it does in the help viewer. The persisted
//! copy gets the relative link back.
//!
//! Legacy pages may also predate UTF-8; `decode_help` turns their bytes
//! into text before any of this happens.

use crate::document::HelpDocument;
use crate::dom;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use thiserror::Error;

/// How far into a page a `charset=` declaration is looked for
const CHARSET_SCAN_LIMIT: usize = 1024;

/// Errors that can occur while pre-processing help markup
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("invalid stylesheet pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Rewrites raw help markup before it is parsed
#[derive(Debug, Clone)]
pub struct Preprocessor {
    stylesheet_link: Regex,
    head_tag: Regex,
    replacement: String,
    stylesheet_name: String,
    css_href: String,
}

impl Preprocessor {
    /// Build a pre-processor
    ///
    /// # Parameters
    /// * `stylesheet_name` - File name identifying the help stylesheet link (e.g. `gebr.css`)
    /// * `css_href` - Location the link should point to
    pub fn new(stylesheet_name: &str, css_href: &str) -> Result<Self, PreprocessError> {
        // A tag never spans another '<' nor a line break
        let stylesheet_link = RegexBuilder::new(&format!(
            r"<link[^<\n]*{}[^<\n]*>",
            regex::escape(stylesheet_name)
        ))
        .case_insensitive(true)
        .build()?;
        let head_tag = RegexBuilder::new("<head>").case_insensitive(true).build()?;

        Ok(Self {
            stylesheet_link,
            head_tag,
            replacement: stylesheet_tag(css_href),
            stylesheet_name: stylesheet_name.to_string(),
            css_href: css_href.to_string(),
        })
    }

    /// Normalize raw help markup
    ///
    /// - empty input becomes a single space
    /// - the first link to the help stylesheet is replaced by one pointing at `css_href`
    /// - without such a link, one is inserted right after `<head>`
    pub fn process(&self, raw: &str) -> String {
        if raw.is_empty() {
            return " ".to_string();
        }

        if let Some(found) = self.stylesheet_link.find(raw) {
            let mut help = String::with_capacity(raw.len() + self.replacement.len());
            help.push_str(&raw[..found.start()]);
            help.push_str(&self.replacement);
            help.push_str(&raw[found.end()..]);
            return help;
        }

        if let Some(head) = self.head_tag.find(raw) {
            let mut help = String::with_capacity(raw.len() + self.replacement.len());
            help.push_str(&raw[..head.end()]);
            help.push_str(&self.replacement);
            help.push_str(&raw[head.end()..]);
            return help;
        }

        log::warn!("Help has no <head>, stylesheet link not added");
        raw.to_string()
    }

    /// Point the help stylesheet link of `doc` back at the bare stylesheet name
    ///
    /// Undoes the rewrite done by `process` so stored pages never carry the
    /// installation path. Only the first matching link is changed.
    ///
    /// # Returns
    /// * `true` - A link was found and restored
    /// * `false` - The document has no help stylesheet link
    pub fn restore_stylesheet(&self, doc: &HelpDocument) -> bool {
        let link = dom::elements_by_tag(doc.root(), "link")
            .into_iter()
            .find(|link| {
                dom::get_attribute(link, "href").is_some_and(|href| {
                    href == self.css_href
                        || href
                            .to_ascii_lowercase()
                            .contains(&self.stylesheet_name.to_ascii_lowercase())
                })
            });

        match link {
            Some(link) => {
                dom::set_attribute(&link, "rel", "stylesheet");
                dom::set_attribute(&link, "type", "text/css");
                dom::set_attribute(&link, "href", &self.stylesheet_name);
                true
            }
            None => false,
        }
    }
}

/// Decode the raw bytes of a help page
///
/// Valid UTF-8 is taken as is. Anything else is decoded with the charset the
/// page declares, or as Windows-1252 (the superset of Latin-1) when it
/// declares none.
///
/// # Returns
/// * `(Cow<str>, &Encoding)` - The text and the encoding it was decoded from
pub fn decode_help(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let encoding = if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        declared_charset(bytes)
            .filter(|encoding| *encoding != UTF_8)
            .unwrap_or(WINDOWS_1252)
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!("Help is not valid {}, some characters were replaced", used.name());
    }
    (text, used)
}

/// Encoding named by the first `charset=` near the start of the page
fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes[..bytes.len().min(CHARSET_SCAN_LIMIT)].to_ascii_lowercase();
    let start = head.windows(8).position(|window| window == b"charset=")? + 8;

    let label: Vec<u8> = head[start..]
        .iter()
        .skip_while(|&&b| matches!(b, b'"' | b'\'' | b' '))
        .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .copied()
        .collect();

    Encoding::for_label(&label)
}

fn stylesheet_tag(href: &str) -> String {
    format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\" />",
        href.replace('"', "&quot;")
    )
}
