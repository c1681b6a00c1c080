//! Anchor codec
//!
//! Converts between live selections and persisted anchors
//! (`selected_text`, `occurrence_index`), and between anchors and flat
//! ranges on a freshly rendered container.

pub mod codec;
pub mod error;
pub mod selection;

pub use codec::{find_occurrence, occurrences_before, Anchor};
pub use error::{AnchorError, SelectionIssue};
pub use selection::{
    compute_occurrence_index, encode_selection, selection_flat_range, Boundary, EncodedSelection, SelectionRange,
};
