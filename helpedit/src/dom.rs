//! Host document model helpers
//!
//! A thin layer over `markup5ever_rcdom` offering the tree operations the
//! help editor needs: child enumeration, deep copy, node removal and
//! insertion, attribute access, tag/class lookup and serialization.
//!
//! Nodes are reference counted (`Rc`), so a tree is confined to the thread
//! that parsed it.

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Namespace of every element created by this module
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parse a complete HTML page
///
/// The parser is error tolerant: missing `<html>`, `<head>` or `<body>`
/// elements are synthesized, so the result always has a document element.
pub fn parse_document(markup: &str) -> RcDom {
    html5ever::parse_document(RcDom::default(), Default::default()).one(markup)
}

/// Parse an HTML fragment as if it were the content of a `<body>`
///
/// # Returns
/// * `Vec<Handle>` - Detached top-level nodes of the fragment, in order
pub fn parse_fragment(markup: &str) -> Vec<Handle> {
    let dom = html5ever::parse_fragment(
        RcDom::default(),
        Default::default(),
        html_name("body"),
        Vec::new(),
    )
    .one(markup);

    // Fragment parsing yields document -> <html> -> fragment nodes
    let root = dom.document.children.borrow().first().cloned();
    match root {
        Some(html) => html.children.borrow().iter().map(deep_copy).collect(),
        None => Vec::new(),
    }
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

/// Create a detached element with no attributes
pub fn create_element(tag: &str) -> Handle {
    Node::new(NodeData::Element {
        name: html_name(tag),
        attrs: RefCell::new(Vec::new()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a detached text node
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Local tag name of an element, `None` for any other node type
pub fn tag_name(node: &Node) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

/// Check whether `node` is an element with the given tag (ASCII case-insensitive)
pub fn is_element(node: &Node, tag: &str) -> bool {
    tag_name(node).is_some_and(|name| name.eq_ignore_ascii_case(tag))
}

/// Read an attribute value
pub fn get_attribute(node: &Node, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Set an attribute, replacing any previous value
///
/// Has no effect on non-element nodes.
pub fn set_attribute(node: &Node, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            Some(attr) => attr.value = StrTendril::from(value),
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value: StrTendril::from(value),
            }),
        }
    }
}

/// Check whether the element's `class` attribute lists `class`
pub fn has_class(node: &Node, class: &str) -> bool {
    get_attribute(node, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

/// All descendants of `node` in document (pre-)order, `node` excluded
///
/// The result is a snapshot: mutating the tree afterwards does not change it.
pub fn descendants(node: &Handle) -> Vec<Handle> {
    let mut result = Vec::new();
    let mut stack: Vec<Handle> = node.children.borrow().iter().rev().cloned().collect();

    while let Some(current) = stack.pop() {
        stack.extend(current.children.borrow().iter().rev().cloned());
        result.push(current);
    }

    result
}

/// First descendant element carrying `class`
pub fn find_by_class(root: &Handle, class: &str) -> Option<Handle> {
    descendants(root)
        .into_iter()
        .find(|node| has_class(node, class))
}

/// First descendant element with the given tag
pub fn find_by_tag(root: &Handle, tag: &str) -> Option<Handle> {
    descendants(root)
        .into_iter()
        .find(|node| is_element(node, tag))
}

/// Every descendant element with the given tag, in document order
pub fn elements_by_tag(root: &Handle, tag: &str) -> Vec<Handle> {
    descendants(root)
        .into_iter()
        .filter(|node| is_element(node, tag))
        .collect()
}

/// Check whether `ancestor` contains `node` (or is `node`)
pub fn contains(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if Rc::ptr_eq(&candidate, ancestor) {
            return true;
        }
        current = parent(&candidate);
    }
    false
}

/// Parent of `node`, if attached
pub fn parent(node: &Node) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(Weak::upgrade);
    node.parent.set(weak);
    parent
}

/// Detach `node` from its parent; detached nodes are left alone
pub fn detach(node: &Handle) {
    if let Some(parent) = parent(node) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
    node.parent.set(None);
}

/// Append `child` as the last child of `parent`, detaching it first
pub fn append_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Insert `child` as the first child of `parent`, detaching it first
pub fn prepend_child(parent: &Handle, child: Handle) {
    detach(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// Insert `node` right after `reference` in its parent
///
/// # Returns
/// * `true` - `node` was inserted
/// * `false` - `reference` has no parent, nothing was done
pub fn insert_after(reference: &Handle, node: Handle) -> bool {
    let Some(parent) = parent(reference) else {
        return false;
    };
    detach(&node);

    let position = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, reference));
    let Some(position) = position else {
        return false;
    };

    node.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut().insert(position + 1, node);
    true
}

/// Remove every child of `node`
///
/// # Returns
/// * `Vec<Handle>` - The removed children, detached, in their original order
pub fn take_children(node: &Node) -> Vec<Handle> {
    let children = node.children.take();
    for child in &children {
        child.parent.set(None);
    }
    children
}

/// Remove every child of `node`, discarding them
pub fn remove_children(node: &Node) {
    take_children(node);
}

/// Recursively copy `node` and its subtree
///
/// The copy is detached and shares no node with the source.
pub fn deep_copy(node: &Handle) -> Handle {
    let data = match &node.data {
        NodeData::Document => NodeData::Document,
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        },
        NodeData::Text { contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::Element {
            name,
            attrs,
            template_contents,
            mathml_annotation_xml_integration_point,
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: RefCell::new(template_contents.borrow().as_ref().map(deep_copy)),
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        },
        NodeData::ProcessingInstruction { target, contents } => {
            NodeData::ProcessingInstruction {
                target: target.clone(),
                contents: contents.clone(),
            }
        }
    };

    let copy = Node::new(data);
    for child in node.children.borrow().iter() {
        append_child(&copy, deep_copy(child));
    }
    copy
}

/// Concatenated text of every text node below `node`
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    if let NodeData::Text { contents } = &node.data {
        text.push_str(&contents.borrow());
    }
    for descendant in descendants(node) {
        if let NodeData::Text { contents } = &descendant.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Serialize `node` including its own tag (the DOM `outerHTML`)
pub fn outer_html(node: &Handle) -> std::io::Result<String> {
    serialize_node(node, TraversalScope::IncludeNode)
}

/// Serialize the children of `node` (the DOM `innerHTML`)
pub fn inner_html(node: &Handle) -> std::io::Result<String> {
    serialize_node(node, TraversalScope::ChildrenOnly(None))
}

fn serialize_node(node: &Handle, scope: TraversalScope) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(node.clone()), opts)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
