//! Node tree abstraction
//!
//! The anchor engine never talks to a concrete DOM directly. It works through
//! the [`TextTree`] trait, which exposes the small set of primitives needed to
//! walk text nodes, split them, and wrap them in marker elements.
//!
//! ## Implementations
//!
//! - `arena`: an index-based tree used natively and in tests
//! - `browser`: the live page DOM via `web-sys` (wasm32 only)
//!
//! Offsets handed to [`TextTree::split_text`] and returned by
//! [`TextTree::text_len`] are UTF-16 code units, matching the DOM.

pub mod arena;
pub mod walk;

#[cfg(target_arch = "wasm32")]
pub mod browser;

pub use arena::{Document, NodeId};
pub use walk::{descendants, is_inclusive_ancestor, text_nodes};

use thiserror::Error;

/// Coarse node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Comments, processing instructions, anything without rendered text
    Other,
}

/// Errors raised by tree mutation primitives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node is not attached to a parent")]
    Detached,

    #[error("offset {offset} out of range for text of length {len}")]
    IndexSize { offset: usize, len: usize },

    #[error("expected a text node")]
    NotText,

    #[error("expected an element node")]
    NotElement,

    #[error("node is not a child of the given parent")]
    NotAChild,

    #[error("inserting a node into its own subtree")]
    Hierarchy,

    #[error("markup could not be parsed: {0}")]
    Parse(String),

    /// Exception thrown by the host DOM
    #[error("host DOM error: {0}")]
    Host(String),
}

/// Minimal mutable document tree
///
/// Handles are cheap to clone. Equality on handles is node identity.
pub trait TextTree {
    type Node: Clone + PartialEq + std::fmt::Debug;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Lowercase tag name, `None` for non-elements
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Character data of a text node, `None` for other kinds
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Length of a text node in UTF-16 code units (0 for other kinds)
    fn text_len(&self, node: &Self::Node) -> usize;

    /// Split a text node at `offset`, returning the new node holding the tail.
    ///
    /// The new node is inserted as the next sibling of `node`.
    fn split_text(&mut self, node: &Self::Node, offset: usize) -> Result<Self::Node, DomError>;

    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> Result<Self::Node, DomError>;

    /// Replace `old` (a child of `parent`) with `new`
    fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node) -> Result<(), DomError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Insert `new` before `reference`; appends when `reference` is `None`
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        new: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Merge adjacent text nodes and drop empty ones in the subtree
    fn normalize(&mut self, node: &Self::Node);

    /// Whether the element carries `class` in its class list
    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|value| value.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Concatenated text of the subtree, like `textContent`
    fn text_content(&self, node: &Self::Node) -> String
    where
        Self: Sized,
    {
        let mut out = String::new();
        for text in text_nodes(self, node) {
            if let Some(data) = self.text(&text) {
                out.push_str(&data);
            }
        }
        out
    }
}
