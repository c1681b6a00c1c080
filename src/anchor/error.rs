//! Error taxonomy for anchoring
//!
//! `NotFound` and `ContainerMissing` are expected at runtime (text diverged,
//! pane not mounted yet) and are handled by skipping the marker. Only
//! `InvalidSelection` is surfaced to the caller, which must reject the
//! selection before anything is persisted.

use thiserror::Error;

/// Why a selection cannot become an anchor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionIssue {
    #[error("selection is collapsed")]
    Collapsed,

    #[error("selection contains only whitespace")]
    Blank,

    #[error("selection is not inside an annotatable container")]
    OutsideContainer,

    #[error("selection spans two containers")]
    CrossesContainers,

    #[error("selection overlaps an existing marker")]
    OverlapsMarker,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// Fewer occurrences of the anchored text than the stored index
    #[error("occurrence {occurrence_index} of {text:?} not found")]
    NotFound { text: String, occurrence_index: u32 },

    /// No element matches the marker's container key
    #[error("container {0} is not rendered")]
    ContainerMissing(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] SelectionIssue),
}
