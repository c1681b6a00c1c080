//! [`TextTree`] over the live page DOM

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CharacterData, Element, Node, Text};

use super::{DomError, NodeKind, TextTree};
use crate::anchor::{Boundary, SelectionRange};

/// Convert a thrown DOM exception into a `DomError`
pub fn host_error(err: JsValue) -> DomError {
    DomError::Host(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// Handle to the page document
#[derive(Debug, Clone)]
pub struct BrowserDom {
    document: web_sys::Document,
}

impl BrowserDom {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Document of the current window
    pub fn from_window() -> Result<Self, DomError> {
        let window = web_sys::window().ok_or_else(|| DomError::Host("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| DomError::Host("window has no document".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }

    /// `<body>` as a node, the default scope for container lookups
    pub fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    /// First range of the window selection, if any
    pub fn current_selection(&self) -> Option<SelectionRange<Node>> {
        let selection = web_sys::window()?.get_selection().ok()??;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        Some(SelectionRange::new(
            Boundary::new(range.start_container().ok()?, range.start_offset().ok()? as usize),
            Boundary::new(range.end_container().ok()?, range.end_offset().ok()? as usize),
        ))
    }

    /// Drop the window selection after it has been consumed
    pub fn clear_selection(&self) {
        if let Some(Ok(Some(selection))) = web_sys::window().map(|w| w.get_selection()) {
            let _ = selection.remove_all_ranges();
        }
    }

    fn element<'a>(&self, node: &'a Node) -> Result<&'a Element, DomError> {
        node.dyn_ref::<Element>().ok_or(DomError::NotElement)
    }
}

impl TextTree for BrowserDom {
    type Node = Node;

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE | Node::CDATA_SECTION_NODE => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn first_child(&self, node: &Node) -> Option<Node> {
        node.first_child()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(|e| e.tag_name().to_ascii_lowercase())
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        self.element(node)?.set_attribute(name, value).map_err(host_error)
    }

    fn text(&self, node: &Node) -> Option<String> {
        match self.kind(node) {
            NodeKind::Text => Some(node.node_value().unwrap_or_default()),
            _ => None,
        }
    }

    fn text_len(&self, node: &Node) -> usize {
        match self.kind(node) {
            NodeKind::Text => node.dyn_ref::<CharacterData>().map(|c| c.length() as usize).unwrap_or(0),
            _ => 0,
        }
    }

    fn split_text(&mut self, node: &Node, offset: usize) -> Result<Node, DomError> {
        let text = node.dyn_ref::<Text>().ok_or(DomError::NotText)?;
        let len = text.length() as usize;
        if offset > len {
            return Err(DomError::IndexSize { offset, len });
        }
        text.split_text(offset as u32).map(Node::from).map_err(host_error)
    }

    fn create_element(&mut self, tag: &str) -> Result<Node, DomError> {
        self.document.create_element(tag).map(Node::from).map_err(host_error)
    }

    fn replace_child(&mut self, parent: &Node, new: &Node, old: &Node) -> Result<(), DomError> {
        parent.replace_child(new, old).map(|_| ()).map_err(host_error)
    }

    fn append_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(host_error)
    }

    fn insert_before(&mut self, parent: &Node, new: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        parent.insert_before(new, reference).map(|_| ()).map_err(host_error)
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), DomError> {
        parent.remove_child(child).map(|_| ()).map_err(host_error)
    }

    fn normalize(&mut self, node: &Node) {
        node.normalize();
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .map(|e| e.class_list().contains(class))
            .unwrap_or(false)
    }
}
