//! Span renderer
//!
//! `wrap` turns a flat range into wrapper elements, splitting text nodes at
//! the range bounds; `unwrap` removes them again and merges the split text.
//! Neither changes the container's flat text.

pub mod unwrap;
pub mod wrap;

pub use unwrap::{is_rendered, unwrap, wrappers_for};
pub use wrap::{owned_ranges, owning_wrapper, wrap};
