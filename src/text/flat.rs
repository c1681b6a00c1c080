//! Flat-text offset model
//!
//! A container's rendered text is treated as one logical string: the
//! concatenation of its text nodes in document order. Wrapping text in
//! marker elements only moves node boundaries, so this string is stable
//! across apply/unwrap.

use serde::{Deserialize, Serialize};

use crate::dom::{descendants, is_inclusive_ancestor, text_nodes, NodeKind, TextTree};

/// Half-open range of UTF-16 offsets into a container's flat text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatRange {
    pub start: usize,
    pub end: usize,
}

impl FlatRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Degenerate ranges (including reversed ones) cover nothing
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn intersects(&self, other: &FlatRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A text node with its position in the flat string
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun<N> {
    pub node: N,
    pub start: usize,
    pub len: usize,
}

impl<N> TextRun<N> {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// The part of one text node covered by a flat range
#[derive(Debug, Clone, PartialEq)]
pub struct TextSlice<N> {
    pub node: N,
    /// Length of the whole node at snapshot time
    pub node_len: usize,
    pub local_start: usize,
    pub local_end: usize,
}

impl<N> TextSlice<N> {
    pub fn covers_whole_node(&self) -> bool {
        self.local_start == 0 && self.local_end == self.node_len
    }
}

/// Rendered text of `container`
pub fn flat_text<T: TextTree>(tree: &T, container: &T::Node) -> String {
    tree.text_content(container)
}

/// Snapshot every text node under `container` with its flat start offset
pub fn text_runs<T: TextTree>(tree: &T, container: &T::Node) -> Vec<TextRun<T::Node>> {
    let mut offset = 0;
    text_nodes(tree, container)
        .into_iter()
        .map(|node| {
            let len = tree.text_len(&node);
            let run = TextRun { node, start: offset, len };
            offset += len;
            run
        })
        .collect()
}

/// Nodes intersecting `range`, each with its local intersection bounds
///
/// Runs entirely outside the range are skipped on their recorded offsets
/// alone; their text is never read.
pub fn slices_in<N: Clone>(runs: &[TextRun<N>], range: FlatRange) -> Vec<TextSlice<N>> {
    if range.is_empty() {
        return Vec::new();
    }
    runs.iter()
        .filter(|run| run.end() > range.start && run.start < range.end)
        .map(|run| TextSlice {
            node: run.node.clone(),
            node_len: run.len,
            local_start: range.start.max(run.start) - run.start,
            local_end: range.end.min(run.end()) - run.start,
        })
        .collect()
}

/// `offsetToPosition`: text nodes and local bounds covering `range`
pub fn offset_to_position<T: TextTree>(tree: &T, container: &T::Node, range: FlatRange) -> Vec<TextSlice<T::Node>> {
    slices_in(&text_runs(tree, container), range)
}

/// Map a DOM boundary point to a flat offset within `container`
///
/// `node` is either a text node (offset in UTF-16 units) or an element
/// (offset is a child index), as in a DOM `Range`. Returns `None` when the
/// point lies outside the container.
pub fn boundary_offset<T: TextTree>(tree: &T, container: &T::Node, node: &T::Node, offset: usize) -> Option<usize> {
    if !is_inclusive_ancestor(tree, container, node) {
        return None;
    }

    match tree.kind(node) {
        NodeKind::Text => {
            let before = text_before(tree, container, node)?;
            Some(before + offset.min(tree.text_len(node)))
        }
        _ => {
            let mut child = tree.first_child(node);
            for _ in 0..offset {
                child = match child {
                    Some(c) => tree.next_sibling(&c),
                    None => break,
                };
            }
            match child {
                Some(child) => text_before(tree, container, &child),
                None => {
                    let inside: usize = text_nodes(tree, node).iter().map(|t| tree.text_len(t)).sum();
                    let before = if node == container {
                        0
                    } else {
                        text_before(tree, container, node)?
                    };
                    Some(before + inside)
                }
            }
        }
    }
}

/// Length of all text preceding `target` (in document order) inside `container`
fn text_before<T: TextTree>(tree: &T, container: &T::Node, target: &T::Node) -> Option<usize> {
    if target == container {
        return Some(0);
    }
    let mut total = 0;
    for node in descendants(tree, container) {
        if &node == target {
            return Some(total);
        }
        if tree.kind(&node) == NodeKind::Text {
            total += tree.text_len(&node);
        }
    }
    None
}
