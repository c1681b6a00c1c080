//! Document-order traversal over any [`TextTree`]
//!
//! Traversals materialize their results into a `Vec` so callers can mutate
//! the tree afterwards without invalidating the iteration.

use super::{NodeKind, TextTree};

/// Next node after `node` in pre-order, staying inside `root`
fn next_in_preorder<T: TextTree>(tree: &T, root: &T::Node, node: &T::Node) -> Option<T::Node> {
    if let Some(child) = tree.first_child(node) {
        return Some(child);
    }
    let mut current = node.clone();
    loop {
        if &current == root {
            return None;
        }
        if let Some(sibling) = tree.next_sibling(&current) {
            return Some(sibling);
        }
        current = tree.parent(&current)?;
    }
}

/// All descendants of `root` (excluding `root` itself) in document order
pub fn descendants<T: TextTree>(tree: &T, root: &T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut cursor = next_in_preorder(tree, root, root);
    while let Some(node) = cursor {
        cursor = next_in_preorder(tree, root, &node);
        out.push(node);
    }
    out
}

/// Text node descendants of `root` in document order
pub fn text_nodes<T: TextTree>(tree: &T, root: &T::Node) -> Vec<T::Node> {
    if tree.kind(root) == NodeKind::Text {
        return vec![root.clone()];
    }
    descendants(tree, root)
        .into_iter()
        .filter(|node| tree.kind(node) == NodeKind::Text)
        .collect()
}

/// True when `ancestor` is `node` or one of its ancestors
pub fn is_inclusive_ancestor<T: TextTree>(tree: &T, ancestor: &T::Node, node: &T::Node) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if &n == ancestor {
            return true;
        }
        current = tree.parent(&n);
    }
    false
}

/// Closest inclusive ancestor of `node` matching `pred`, never leaving `limit`
///
/// `limit` itself is tested last; nodes above it are not.
pub fn closest_within<T, F>(tree: &T, node: &T::Node, limit: Option<&T::Node>, mut pred: F) -> Option<T::Node>
where
    T: TextTree,
    F: FnMut(&T::Node) -> bool,
{
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if pred(&n) {
            return Some(n);
        }
        if Some(&n) == limit {
            return None;
        }
        current = tree.parent(&n);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_descendants_document_order() {
        let doc = Document::parse("<div><p>a<em>b</em></p><p>c</p></div>").unwrap();
        let div = doc.first_child(&doc.root()).unwrap();

        let texts: Vec<String> = text_nodes(&doc, &div)
            .iter()
            .filter_map(|n| doc.text(n))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_descendants_stay_inside_root() {
        let doc = Document::parse("<p>a</p><p>b</p>").unwrap();
        let first = doc.first_child(&doc.root()).unwrap();

        let all = descendants(&doc, &first);
        assert_eq!(all.len(), 1);
        assert_eq!(doc.text(&all[0]).as_deref(), Some("a"));
    }

    #[test]
    fn test_closest_within_limit() {
        let doc = Document::parse("<section class=\"outer\"><div><p>x</p></div></section>").unwrap();
        let section = doc.first_child(&doc.root()).unwrap();
        let div = doc.first_child(&section).unwrap();
        let text = text_nodes(&doc, &div).remove(0);

        let found = closest_within(&doc, &text, None, |n| doc.has_class(n, "outer"));
        assert_eq!(found, Some(section));

        let limited = closest_within(&doc, &text, Some(&div), |n| doc.has_class(n, "outer"));
        assert_eq!(limited, None);
    }
}
