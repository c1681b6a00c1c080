//! Text layer: the flat-text view of a container
//!
//! ## Modules
//!
//! - `flat`: flat offsets <-> (text node, local offset) conversion
//! - `units`: UTF-16 code unit helpers

pub mod flat;
pub mod units;

pub use flat::{
    boundary_offset, flat_text, offset_to_position, slices_in, text_runs, FlatRange, TextRun, TextSlice,
};
pub use units::{slice_utf16, utf16_len};
