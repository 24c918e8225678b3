//! # Lantern Engine Core
//!
//! CPU-side scene loading for Lantern: parses glTF documents into an
//! in-memory, renderer-agnostic scene representation and decodes the
//! referenced binary geometry.

pub mod gltf;
pub mod math;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
