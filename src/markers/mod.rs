//! Marker data model
//!
//! ## Modules
//!
//! - `record`: wire records, ids and container keys
//! - `policy`: annotation vs. highlight rendering policy
//! - `store`: in-memory cache of loaded and created markers

pub mod policy;
pub mod record;
pub mod store;

pub use policy::{ContainerMatch, MarkerKind, MarkerPolicy, COMMENTARY_TAG};
pub use record::{ContainerKey, MarkerDraft, MarkerId, MarkerRecord};
pub use store::MarkerStore;
