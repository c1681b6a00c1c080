//! Removing a marker: exact inverse of [`super::wrap`]

use crate::dom::{descendants, DomError, TextTree};
use crate::markers::{MarkerId, MarkerPolicy};

/// Every wrapper under `scope` tagged with `marker_id`, in document order
pub fn wrappers_for<T: TextTree>(tree: &T, scope: &T::Node, marker_id: &MarkerId, policy: &MarkerPolicy) -> Vec<T::Node> {
    descendants(tree, scope)
        .into_iter()
        .filter(|node| policy.is_wrapper(tree, node))
        .filter(|node| {
            tree.attribute(node, &policy.id_attribute)
                .map(|value| MarkerId::parse(&value) == *marker_id)
                .unwrap_or(false)
        })
        .collect()
}

/// Whether `container` already holds a wrapper for `marker_id`
pub fn is_rendered<T: TextTree>(tree: &T, container: &T::Node, marker_id: &MarkerId, policy: &MarkerPolicy) -> bool {
    !wrappers_for(tree, container, marker_id, policy).is_empty()
}

/// Unwrap every fragment of `marker_id` under `scope`
///
/// Children are hoisted into the wrapper's place, the wrapper removed, and
/// the parent normalized so split text nodes merge back. Returns the number
/// of wrappers removed.
pub fn unwrap<T: TextTree>(tree: &mut T, scope: &T::Node, marker_id: &MarkerId, policy: &MarkerPolicy) -> Result<usize, DomError> {
    let wrappers = wrappers_for(&*tree, scope, marker_id, policy);

    for wrapper in &wrappers {
        let parent = tree.parent(wrapper).ok_or(DomError::Detached)?;
        while let Some(child) = tree.first_child(wrapper) {
            tree.insert_before(&parent, &child, Some(wrapper))?;
        }
        tree.remove_child(&parent, wrapper)?;
        tree.normalize(&parent);
    }

    if !wrappers.is_empty() {
        log::debug!("unwrapped {} fragment(s) of marker {}", wrappers.len(), marker_id);
    }
    Ok(wrappers.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{text_nodes, Document, NodeId};
    use crate::render::wrap;
    use crate::text::{flat_text, FlatRange};

    fn setup(markup: &str) -> (Document, NodeId) {
        let doc = Document::parse(markup).unwrap();
        let container = doc.first_child(&doc.root()).unwrap();
        (doc, container)
    }

    #[test]
    fn test_unwrap_restores_markup() {
        let (mut doc, div) = setup("<div>faith <b>alone</b> saves</div>");
        let original = doc.inner_markup(div);
        let policy = MarkerPolicy::annotations();
        let id = MarkerId::Num(4);

        wrap(&mut doc, &div, FlatRange::new(2, 9), &id, &policy).unwrap();
        assert!(is_rendered(&doc, &div, &id, &policy));

        assert_eq!(unwrap(&mut doc, &div, &id, &policy).unwrap(), 2);
        assert_eq!(doc.inner_markup(div), original);
        assert!(!is_rendered(&doc, &div, &id, &policy));
    }

    #[test]
    fn test_unwrap_unknown_id_is_noop() {
        let (mut doc, div) = setup("<div>grace</div>");
        assert_eq!(unwrap(&mut doc, &div, &MarkerId::Num(1), &MarkerPolicy::highlights()).unwrap(), 0);
        assert_eq!(flat_text(&doc, &div), "grace");
    }

    #[test]
    fn test_unwrap_leaves_other_kind_alone() {
        let (mut doc, div) = setup("<div>abcdef</div>");
        let annotations = MarkerPolicy::annotations();
        let highlights = MarkerPolicy::highlights();

        wrap(&mut doc, &div, FlatRange::new(0, 3), &MarkerId::Num(1), &annotations).unwrap();
        wrap(&mut doc, &div, FlatRange::new(0, 3), &MarkerId::Num(1), &highlights).unwrap();

        unwrap(&mut doc, &div, &MarkerId::Num(1), &highlights).unwrap();

        assert!(is_rendered(&doc, &div, &MarkerId::Num(1), &annotations));
        assert!(!is_rendered(&doc, &div, &MarkerId::Num(1), &highlights));
    }

    #[test]
    fn test_unwrap_merges_back_to_single_node() {
        let (mut doc, div) = setup("<div>one two three</div>");
        let policy = MarkerPolicy::highlights();

        wrap(&mut doc, &div, FlatRange::new(4, 7), &MarkerId::Num(1), &policy).unwrap();
        assert_eq!(text_nodes(&doc, &div).len(), 3);

        unwrap(&mut doc, &div, &MarkerId::Num(1), &policy).unwrap();
        assert_eq!(doc.children(div).len(), 1);
        assert_eq!(doc.text(&doc.children(div)[0]).as_deref(), Some("one two three"));
    }
}
