//! Marker Anchor WASM Module
//!
//! Anchors user annotations and highlights to rendered text. A marker is
//! persisted as the selected text plus which occurrence of it was chosen,
//! and re-rendered on every page load by locating that occurrence in the
//! container's flat text and wrapping it in marker elements.
//!
//! The engine is generic over [`dom::TextTree`]; the browser build runs it on
//! the live DOM, tests run it on an arena tree.

pub mod dom;
pub mod text;
pub mod anchor;
pub mod markers;
pub mod render;
pub mod resolver;
pub mod layer;
pub mod controller;
pub mod config;
pub mod persist;

#[cfg(target_arch = "wasm32")]
pub mod api;

// Re-export commonly used types
pub use anchor::{Anchor, AnchorError, Boundary, SelectionIssue, SelectionRange};
pub use config::{ConfigError, Endpoints, EngineConfig};
pub use controller::{ControllerError, SelectionController, UiState};
pub use dom::{Document, DomError, NodeId, TextTree};
pub use layer::{ApplyOutcome, ApplyReport, LayerError, MarkerLayer};
pub use markers::{ContainerKey, MarkerDraft, MarkerId, MarkerKind, MarkerPolicy, MarkerRecord, MarkerStore};
pub use resolver::{ContainerResolver, ScanResolver};
pub use text::{flat_text, FlatRange};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        api::helpers::log_warn(&format!("logger already initialized: {}", err));
    }

    log::info!("Marker anchor WASM module initialized");
}
