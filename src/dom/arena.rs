//! Arena-backed document tree
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Removed
//! nodes stay in the arena (detached) so ids held by callers never dangle.

use super::{is_inclusive_ancestor, DomError, NodeKind, TextTree};
use crate::text::units::{utf16_len, utf16_to_byte};

/// Index of a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeSlot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document
///
/// The root is a `body` element; parsed markup becomes its children.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeSlot>,
    root: NodeId,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.push(NodeData::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
        });
        doc
    }

    /// Parse an XML fragment (several top-level elements allowed)
    pub fn parse(markup: &str) -> Result<Self, DomError> {
        let wrapped = format!("<body>{}</body>", markup);
        let parsed = roxmltree::Document::parse(&wrapped).map_err(|e| DomError::Parse(e.to_string()))?;

        let mut doc = Self::new();
        let root = doc.root;
        for child in parsed.root_element().children() {
            doc.import(child, root);
        }
        Ok(doc)
    }

    fn import(&mut self, source: roxmltree::Node<'_, '_>, parent: NodeId) {
        let data = if source.is_element() {
            NodeData::Element {
                tag: source.tag_name().name().to_ascii_lowercase(),
                attributes: source
                    .attributes()
                    .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                    .collect(),
            }
        } else if source.is_text() {
            NodeData::Text(source.text().unwrap_or_default().to_string())
        } else if source.is_comment() {
            NodeData::Comment(source.text().unwrap_or_default().to_string())
        } else {
            return;
        };

        let id = self.push(data);
        self.nodes[parent.0].children.push(id);
        self.nodes[id.0].parent = Some(parent);

        for child in source.children() {
            self.import(child, id);
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached text node
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push(NodeData::Text(data.to_string()))
    }

    /// Child list of a node
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// First element (document order) carrying `name="value"`
    pub fn element_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        self.elements_by_attribute(name, value).into_iter().next()
    }

    /// Every element (document order) carrying `name="value"`
    pub fn elements_by_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        super::descendants(self, &self.root)
            .into_iter()
            .filter(|node| self.attribute(node, name).as_deref() == Some(value))
            .collect()
    }

    /// Serialize the children of `node`
    pub fn inner_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.write_markup(*child, &mut out);
        }
        out
    }

    /// Serialize `node` including its own tag
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Text(data) => out.push_str(&quick_xml::escape::escape(data.as_str())),
            NodeData::Comment(data) => {
                out.push_str("<!--");
                out.push_str(data);
                out.push_str("-->");
            }
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&quick_xml::escape::escape(value.as_str()));
                    out.push('"');
                }
                out.push('>');
                for child in &self.nodes[node.0].children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(DomError::NotAChild)
    }

    /// Unlink `node` from its current parent, if any
    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn check_insertable(&self, parent: NodeId, new: NodeId) -> Result<(), DomError> {
        if !matches!(self.nodes[parent.0].data, NodeData::Element { .. }) {
            return Err(DomError::NotElement);
        }
        if is_inclusive_ancestor(self, &new, &parent) {
            return Err(DomError::Hierarchy);
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTree for Document {
    type Node = NodeId;

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes[node.0].data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Other,
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].children.first().copied()
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match &mut self.nodes[node.0].data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(n, _)| n == name) {
                    Some(slot) => slot.1 = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DomError::NotElement),
        }
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        match &self.nodes[node.0].data {
            NodeData::Text(data) => Some(data.clone()),
            _ => None,
        }
    }

    fn text_len(&self, node: &NodeId) -> usize {
        match &self.nodes[node.0].data {
            NodeData::Text(data) => utf16_len(data),
            _ => 0,
        }
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, DomError> {
        let tail = match &mut self.nodes[node.0].data {
            NodeData::Text(data) => {
                let byte = utf16_to_byte(data, offset).ok_or(DomError::IndexSize {
                    offset,
                    len: utf16_len(data),
                })?;
                data.split_off(byte)
            }
            _ => return Err(DomError::NotText),
        };

        let new = self.push(NodeData::Text(tail));
        if let Some(parent) = self.nodes[node.0].parent {
            let index = self.position_in_parent(parent, *node)?;
            self.nodes[parent.0].children.insert(index + 1, new);
            self.nodes[new.0].parent = Some(parent);
        }
        Ok(new)
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        Ok(self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) -> Result<(), DomError> {
        self.position_in_parent(*parent, *old)?;
        self.check_insertable(*parent, *new)?;
        self.detach(*new);

        let index = self.position_in_parent(*parent, *old)?;
        self.nodes[parent.0].children[index] = *new;
        self.nodes[new.0].parent = Some(*parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(&mut self, parent: &NodeId, new: &NodeId, reference: Option<&NodeId>) -> Result<(), DomError> {
        if let Some(reference) = reference {
            self.position_in_parent(*parent, *reference)?;
        }
        self.check_insertable(*parent, *new)?;
        self.detach(*new);

        let index = match reference {
            Some(reference) => self.position_in_parent(*parent, *reference)?,
            None => self.nodes[parent.0].children.len(),
        };
        self.nodes[parent.0].children.insert(index, *new);
        self.nodes[new.0].parent = Some(*parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let index = self.position_in_parent(*parent, *child)?;
        self.nodes[parent.0].children.remove(index);
        self.nodes[child.0].parent = None;
        Ok(())
    }

    fn normalize(&mut self, node: &NodeId) {
        let children = self.nodes[node.0].children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let data = match &self.nodes[child.0].data {
                NodeData::Text(data) => Some(data.clone()),
                _ => None,
            };
            match data {
                Some(data) if data.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(data) => {
                    let previous = kept.last().copied();
                    if let Some(prev) = previous {
                        if let NodeData::Text(prev_data) = &mut self.nodes[prev.0].data {
                            prev_data.push_str(&data);
                            self.nodes[child.0].parent = None;
                            continue;
                        }
                    }
                    kept.push(child);
                }
                None => {
                    self.normalize(&child);
                    kept.push(child);
                }
            }
        }

        self.nodes[node.0].children = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_child(doc: &Document) -> NodeId {
        doc.first_child(&doc.root()).unwrap()
    }

    #[test]
    fn test_parse_and_serialize() {
        let markup = r#"<p class="answer">Grace &amp; <em>faith</em></p>"#;
        let doc = Document::parse(markup).unwrap();

        assert_eq!(doc.inner_markup(doc.root()), markup);
        assert_eq!(doc.text_content(&doc.root()), "Grace & faith");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Document::parse("<p>unclosed"), Err(DomError::Parse(_))));
    }

    #[test]
    fn test_split_text_inserts_sibling() {
        let mut doc = Document::parse("<p>faith alone</p>").unwrap();
        let p = body_child(&doc);
        let text = doc.first_child(&p).unwrap();

        let tail = doc.split_text(&text, 6).unwrap();

        assert_eq!(doc.text(&text).as_deref(), Some("faith "));
        assert_eq!(doc.text(&tail).as_deref(), Some("alone"));
        assert_eq!(doc.next_sibling(&text), Some(tail));
        assert_eq!(doc.children(p).len(), 2);
    }

    #[test]
    fn test_split_text_out_of_range() {
        let mut doc = Document::parse("<p>abc</p>").unwrap();
        let text = doc.first_child(&body_child(&doc)).unwrap();

        assert_eq!(doc.split_text(&text, 4), Err(DomError::IndexSize { offset: 4, len: 3 }));
    }

    #[test]
    fn test_replace_and_append() {
        let mut doc = Document::parse("<p>abc</p>").unwrap();
        let p = body_child(&doc);
        let text = doc.first_child(&p).unwrap();

        let mark = doc.create_element("MARK").unwrap();
        doc.replace_child(&p, &mark, &text).unwrap();
        doc.append_child(&mark, &text).unwrap();

        assert_eq!(doc.inner_markup(p), "<mark>abc</mark>");
        assert_eq!(doc.parent(&text), Some(mark));
    }

    #[test]
    fn test_append_into_own_subtree_rejected() {
        let mut doc = Document::parse("<div><p>x</p></div>").unwrap();
        let div = body_child(&doc);
        let p = doc.first_child(&div).unwrap();

        assert_eq!(doc.append_child(&p, &div), Err(DomError::Hierarchy));
    }

    #[test]
    fn test_normalize_merges_and_drops_empty() {
        let mut doc = Document::parse("<p>ab<em>c</em></p>").unwrap();
        let p = body_child(&doc);
        let text = doc.first_child(&p).unwrap();
        doc.split_text(&text, 1).unwrap();
        let empty = doc.create_text("");
        doc.append_child(&p, &empty).unwrap();
        assert_eq!(doc.children(p).len(), 4);

        doc.normalize(&p);

        assert_eq!(doc.children(p).len(), 2);
        assert_eq!(doc.text(&doc.children(p)[0]).as_deref(), Some("ab"));
    }

    #[test]
    fn test_elements_by_attribute() {
        let doc = Document::parse(
            r#"<div data-commentary-id="3">a</div><div data-commentary-id="4">b</div>"#,
        )
        .unwrap();

        let found = doc.element_by_attribute("data-commentary-id", "4").unwrap();
        assert_eq!(doc.text_content(&found), "b");
        assert!(doc.element_by_attribute("data-commentary-id", "5").is_none());
    }
}
