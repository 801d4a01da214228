use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::io::Read;

/// Builds a DOM from an HTML byte stream. Invalid UTF-8 is replaced, so the
/// only failure is the underlying read.
pub fn parse_html<R: Read>(reader: &mut R) -> std::io::Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(reader)
}

pub fn parse_html_str(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// Value of the node's `class` attribute, or an empty string when the node
/// has none (or is not an element at all).
pub fn class_attr(node: &Handle) -> String {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == "class")
            .map(|a| a.value.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

pub fn text_of(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// Raw text of the first child, or "" if the first child is missing or is
/// not a text node.
pub fn first_child_text(node: &Handle) -> String {
    node.children
        .borrow()
        .first()
        .and_then(text_of)
        .unwrap_or_default()
}

/// Depth-first search for the first element whose class attribute equals
/// `class_name`.
///
/// The returned handle keeps its children only while the owning `RcDom` is
/// alive; dropping the `RcDom` detaches every node's children.
pub fn find_first_by_class(node: &Handle, class_name: &str) -> Option<Handle> {
    if is_element(node) && class_attr(node) == class_name {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_first_by_class(child, class_name) {
            return Some(found);
        }
    }
    None
}
