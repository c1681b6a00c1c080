//! Applying a marker: wrap a flat range in wrapper elements

use crate::dom::walk::closest_within;
use crate::dom::{DomError, TextTree};
use crate::markers::{MarkerId, MarkerPolicy};
use crate::text::{slices_in, text_runs, FlatRange, TextSlice};

/// Closest wrapper of `policy`'s kind enclosing `node`, below `container`
///
/// Every ancestor up to the container is inspected, not only the nearest
/// element, so a node under nested wrappers still counts as owned.
pub fn owning_wrapper<T: TextTree>(
    tree: &T,
    node: &T::Node,
    container: &T::Node,
    policy: &MarkerPolicy,
) -> Option<T::Node> {
    let parent = tree.parent(node)?;
    if &parent == container {
        return None;
    }
    closest_within(tree, &parent, Some(container), |n| n != container && policy.is_wrapper(tree, n))
}

/// Flat ranges of text already owned by wrappers of `policy`'s kind
pub fn owned_ranges<T: TextTree>(tree: &T, container: &T::Node, policy: &MarkerPolicy) -> Vec<FlatRange> {
    text_runs(tree, container)
        .into_iter()
        .filter(|run| owning_wrapper(tree, &run.node, container, policy).is_some())
        .map(|run| FlatRange::new(run.start, run.end()))
        .collect()
}

/// Wrap the text covering `range` in wrappers tagged with `marker_id`
///
/// Returns the wrappers created, in document order. Degenerate ranges are a
/// no-op. With an exclusive policy, text already inside a wrapper of the
/// same kind is left alone, so a marker may end up with fewer fragments
/// (or none) than the number of nodes its range touches.
pub fn wrap<T: TextTree>(
    tree: &mut T,
    container: &T::Node,
    range: FlatRange,
    marker_id: &MarkerId,
    policy: &MarkerPolicy,
) -> Result<Vec<T::Node>, DomError> {
    if range.is_empty() {
        return Ok(Vec::new());
    }

    // Snapshot positions before any mutation
    let runs = text_runs(&*tree, container);
    let slices: Vec<TextSlice<T::Node>> = slices_in(&runs, range)
        .into_iter()
        .filter(|slice| slice.local_start < slice.local_end)
        .filter(|slice| !policy.exclusive || owning_wrapper(&*tree, &slice.node, container, policy).is_none())
        .collect();

    let id = marker_id.to_string();
    let mut wrappers = Vec::with_capacity(slices.len());

    // Back to front: a split only shifts the tail of the node being split
    for slice in slices.iter().rev() {
        let mut target = slice.node.clone();
        if slice.local_end < slice.node_len {
            tree.split_text(&target, slice.local_end)?;
        }
        if slice.local_start > 0 {
            target = tree.split_text(&target, slice.local_start)?;
        }

        let parent = tree.parent(&target).ok_or(DomError::Detached)?;
        let wrapper = tree.create_element(&policy.tag)?;
        tree.set_attribute(&wrapper, "class", &policy.class_name)?;
        tree.set_attribute(&wrapper, &policy.id_attribute, &id)?;
        tree.replace_child(&parent, &wrapper, &target)?;
        tree.append_child(&wrapper, &target)?;
        wrappers.push(wrapper);
    }

    wrappers.reverse();
    log::debug!(
        "wrapped {}..{} for marker {} in {} fragment(s)",
        range.start,
        range.end,
        id,
        wrappers.len()
    );
    Ok(wrappers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use crate::text::flat_text;

    fn setup(markup: &str) -> (Document, NodeId) {
        let doc = Document::parse(markup).unwrap();
        let container = doc.first_child(&doc.root()).unwrap();
        (doc, container)
    }

    #[test]
    fn test_wrap_inside_single_node() {
        let (mut doc, div) = setup("<div>faith alone faith</div>");
        let policy = MarkerPolicy::highlights();

        let wrappers = wrap(&mut doc, &div, FlatRange::new(6, 11), &MarkerId::Num(1), &policy).unwrap();

        assert_eq!(wrappers.len(), 1);
        assert_eq!(
            doc.inner_markup(div),
            r#"faith <mark class="user-highlight" data-highlight-id="1">alone</mark> faith"#
        );
    }

    #[test]
    fn test_wrap_across_nodes() {
        let (mut doc, div) = setup("<div>ab<i>cd</i>ef</div>");
        let policy = MarkerPolicy::highlights();

        let wrappers = wrap(&mut doc, &div, FlatRange::new(1, 5), &MarkerId::Num(2), &policy).unwrap();

        assert_eq!(wrappers.len(), 3);
        let texts: Vec<String> = wrappers.iter().map(|w| doc.text_content(w)).collect();
        assert_eq!(texts, vec!["b", "cd", "e"]);
        assert_eq!(flat_text(&doc, &div), "abcdef");
    }

    #[test]
    fn test_degenerate_range_is_noop() {
        let (mut doc, div) = setup("<div>grace</div>");
        let before = doc.inner_markup(div);
        let policy = MarkerPolicy::annotations();

        assert!(wrap(&mut doc, &div, FlatRange::new(3, 3), &MarkerId::Num(1), &policy).unwrap().is_empty());
        assert!(wrap(&mut doc, &div, FlatRange::new(4, 1), &MarkerId::Num(1), &policy).unwrap().is_empty());
        assert_eq!(doc.inner_markup(div), before);
    }

    #[test]
    fn test_exclusive_skips_owned_text() {
        let (mut doc, div) = setup("<div>abcdef</div>");
        let policy = MarkerPolicy::annotations();

        wrap(&mut doc, &div, FlatRange::new(0, 4), &MarkerId::Num(1), &policy).unwrap();
        let second = wrap(&mut doc, &div, FlatRange::new(2, 6), &MarkerId::Num(2), &policy).unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(doc.text_content(&second[0]), "ef");
        assert_eq!(owned_ranges(&doc, &div, &policy), vec![FlatRange::new(0, 4), FlatRange::new(4, 6)]);
    }

    #[test]
    fn test_overlapping_policy_nests() {
        let (mut doc, div) = setup("<div>abcdef</div>");
        let policy = MarkerPolicy::highlights();

        wrap(&mut doc, &div, FlatRange::new(0, 4), &MarkerId::Num(1), &policy).unwrap();
        let second = wrap(&mut doc, &div, FlatRange::new(2, 6), &MarkerId::Num(2), &policy).unwrap();

        assert_eq!(second.len(), 2);
        assert_eq!(doc.text_content(&second[0]), "cd");
        assert_eq!(doc.text_content(&second[1]), "ef");
        assert_eq!(flat_text(&doc, &div), "abcdef");
    }
}
