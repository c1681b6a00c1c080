//! Encoding a live selection into an anchor

use serde::{Deserialize, Serialize};

use super::codec::{occurrences_before, Anchor};
use super::error::{AnchorError, SelectionIssue};
use crate::dom::TextTree;
use crate::text::{boundary_offset, flat_text, slice_utf16, FlatRange};

/// A boundary point as in a DOM `Range`
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> Boundary<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Ordered selection range (start precedes end in document order)
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRange<N> {
    pub start: Boundary<N>,
    pub end: Boundary<N>,
}

impl<N> SelectionRange<N> {
    pub fn new(start: Boundary<N>, end: Boundary<N>) -> Self {
        Self { start, end }
    }
}

/// Anchor plus the flat range it was computed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSelection {
    pub anchor: Anchor,
    pub range: FlatRange,
}

/// Flat range of a selection inside `container`
pub fn selection_flat_range<T: TextTree>(
    tree: &T,
    container: &T::Node,
    selection: &SelectionRange<T::Node>,
) -> Result<FlatRange, AnchorError> {
    let start = boundary_offset(tree, container, &selection.start.node, selection.start.offset)
        .ok_or(SelectionIssue::OutsideContainer)?;
    let end = boundary_offset(tree, container, &selection.end.node, selection.end.offset)
        .ok_or(SelectionIssue::OutsideContainer)?;
    Ok(FlatRange::new(start, end))
}

/// Occurrence index of the selected text at the selection's start
pub fn compute_occurrence_index<T: TextTree>(
    tree: &T,
    container: &T::Node,
    selection: &SelectionRange<T::Node>,
) -> Result<u32, AnchorError> {
    Ok(encode_selection(tree, container, selection)?.anchor.occurrence_index)
}

/// Encode a selection as `{selected_text, occurrence_index}`
///
/// Collapsed, reversed and whitespace-only selections are rejected; the
/// tree is never touched.
pub fn encode_selection<T: TextTree>(
    tree: &T,
    container: &T::Node,
    selection: &SelectionRange<T::Node>,
) -> Result<EncodedSelection, AnchorError> {
    let range = selection_flat_range(tree, container, selection)?;
    if range.is_empty() {
        return Err(SelectionIssue::Collapsed.into());
    }

    let flat = flat_text(tree, container);
    let selected = slice_utf16(&flat, range.start, range.end);
    if selected.trim().is_empty() {
        return Err(SelectionIssue::Blank.into());
    }

    let occurrence_index = occurrences_before(&flat, selected, range.start);
    log::debug!(
        "encoded selection {:?} at {}..{} as occurrence {}",
        selected,
        range.start,
        range.end,
        occurrence_index
    );

    Ok(EncodedSelection {
        anchor: Anchor::new(selected, occurrence_index),
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::find_occurrence;
    use crate::dom::{text_nodes, Document, NodeId};

    fn setup(markup: &str) -> (Document, NodeId) {
        let doc = Document::parse(markup).unwrap();
        let container = doc.first_child(&doc.root()).unwrap();
        (doc, container)
    }

    #[test]
    fn test_encode_second_occurrence_across_nodes() {
        let (doc, div) = setup("<div>faith alone <b>faith</b> alone</div>");
        let bold_text = text_nodes(&doc, &div)[1];
        let selection = SelectionRange::new(Boundary::new(bold_text, 0), Boundary::new(bold_text, 5));

        let encoded = encode_selection(&doc, &div, &selection).unwrap();

        assert_eq!(encoded.anchor, Anchor::new("faith", 1));
        assert_eq!(encoded.range, FlatRange::new(12, 17));
    }

    #[test]
    fn test_selection_spanning_elements() {
        let (doc, div) = setup("<div><p>one two</p><p>three</p></div>");
        let texts = text_nodes(&doc, &div);
        let selection = SelectionRange::new(Boundary::new(texts[0], 4), Boundary::new(texts[1], 3));

        let encoded = encode_selection(&doc, &div, &selection).unwrap();

        assert_eq!(encoded.anchor.selected_text, "twothr");
        assert_eq!(find_occurrence(&doc.text_content(&div), "twothr", 0), Some(encoded.range));
    }

    #[test]
    fn test_collapsed_and_reversed_rejected() {
        let (doc, div) = setup("<div>grace</div>");
        let text = text_nodes(&doc, &div)[0];

        let collapsed = SelectionRange::new(Boundary::new(text, 2), Boundary::new(text, 2));
        assert_eq!(
            encode_selection(&doc, &div, &collapsed),
            Err(AnchorError::InvalidSelection(SelectionIssue::Collapsed))
        );

        let reversed = SelectionRange::new(Boundary::new(text, 4), Boundary::new(text, 1));
        assert!(encode_selection(&doc, &div, &reversed).is_err());
    }

    #[test]
    fn test_whitespace_only_rejected() {
        let (doc, div) = setup("<div>grace  alone</div>");
        let text = text_nodes(&doc, &div)[0];
        let selection = SelectionRange::new(Boundary::new(text, 5), Boundary::new(text, 7));

        assert_eq!(
            compute_occurrence_index(&doc, &div, &selection),
            Err(AnchorError::InvalidSelection(SelectionIssue::Blank))
        );
    }

    #[test]
    fn test_outside_container_rejected() {
        let doc = Document::parse("<div>one</div><div>two</div>").unwrap();
        let first = doc.children(doc.root())[0];
        let other_text = text_nodes(&doc, &doc.children(doc.root())[1])[0];
        let selection = SelectionRange::new(Boundary::new(other_text, 0), Boundary::new(other_text, 3));

        assert_eq!(
            encode_selection(&doc, &first, &selection),
            Err(AnchorError::InvalidSelection(SelectionIssue::OutsideContainer))
        );
    }
}
