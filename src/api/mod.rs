//! Marker engine WASM API
//!
//! The JavaScript-facing surface. The host page performs every fetch; these
//! functions encode selections into create payloads, render markers once
//! the server has answered, and drive the popover state machine.
//!
//! # Module Structure
//!
//! - `helpers`: logging macros, serialization and error conversion
//! - `engine`: the page-wide engine instance and its exported operations

pub mod helpers;
pub mod engine;

pub use engine::*;
