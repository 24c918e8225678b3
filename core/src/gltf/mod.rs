//! glTF 2.0 document loading.
//!
//! Parses a JSON glTF payload into a typed [`Document`], materializes its
//! buffers, resolves accessor references, decodes vertex attributes, and
//! walks the scene graph into flat, renderer-agnostic drawables.
//!
//! The pipeline is synchronous and side-effect-free. Anything that touches
//! the outside world stays behind an interface: remote buffers enter
//! through the fetch callback of [`load_slice_with`] /
//! [`resolve_buffers_with`], and image bytes leave through [`image_bytes`]
//! for an external decoder. Every stage is all-or-nothing; one bad
//! reference or byte range fails the whole load rather than yielding a
//! partial scene.
//!
//! # Example
//!
//! ```ignore
//! use lantern_core::gltf;
//!
//! let data = std::fs::read("model.gltf").unwrap();
//! let loaded = gltf::load_slice(&data).unwrap();
//! for mesh in &loaded.meshes {
//!     for prim in &mesh.primitives {
//!         println!("{} vertices", prim.positions.len());
//!     }
//! }
//! ```

mod accessor;
mod attributes;
mod buffer;
pub mod document;
mod error;
mod json;
mod scene;
#[cfg(test)]
mod tests;

pub use accessor::{resolve_accessor, resolve_accessors, ResolvedAccessor};
pub use attributes::{
    decode_index_triples, decode_primitive, decode_vec2, decode_vec3, PrimitiveData,
};
pub use buffer::{
    decode_data_uri, image_bytes, parse_data_uri, resolve_buffers, resolve_buffers_with,
    ImageData, OCTET_STREAM_PREFIX,
};
pub use document::Document;
pub use error::GltfError;
pub use scene::{
    assemble_default_scene, assemble_scene, default_scene, CameraInstance, MeshInstance,
    SceneDrawables, MAX_NODE_DEPTH,
};

use crate::math::Mat4;

/// One drawable mesh instance with its geometry fully decoded.
#[derive(Debug)]
pub struct MeshDrawable {
    /// Composed world transform of the node that referenced the mesh.
    pub world: Mat4,
    /// Index into [`Document::meshes`].
    pub mesh: usize,
    /// Decoded geometry, one entry per mesh primitive.
    pub primitives: Vec<PrimitiveData>,
}

/// Result of an end-to-end load: the resolved document plus the default
/// scene flattened into decoded drawables.
#[derive(Debug)]
pub struct LoadedScene {
    pub document: Document,
    pub meshes: Vec<MeshDrawable>,
    pub cameras: Vec<CameraInstance>,
}

/// Parse a glTF JSON payload into a typed document. No buffers are
/// materialized and no cross-references are resolved yet.
pub fn parse_document(data: &[u8]) -> Result<Document, GltfError> {
    Document::from_slice(data)
}

/// Load a glTF JSON payload end to end. All buffers must be inline data
/// URIs; any remote buffer fails the load.
pub fn load_slice(data: &[u8]) -> Result<LoadedScene, GltfError> {
    let document = parse_document(data)?;
    let buffers = resolve_buffers(&document)?;
    load_resolved(document, buffers)
}

/// Load a glTF JSON payload end to end, delegating remote buffer URIs to
/// `fetch` (see [`resolve_buffers_with`]).
pub fn load_slice_with<F>(data: &[u8], fetch: F) -> Result<LoadedScene, GltfError>
where
    F: FnMut(&str) -> Result<Vec<u8>, GltfError>,
{
    let document = parse_document(data)?;
    let buffers = resolve_buffers_with(&document, fetch)?;
    load_resolved(document, buffers)
}

fn load_resolved(document: Document, buffers: Vec<Vec<u8>>) -> Result<LoadedScene, GltfError> {
    // Every accessor must resolve before any geometry is decoded; a single
    // dangling reference fails the document as a whole.
    resolve_accessors(&document, &buffers)?;

    let drawables = assemble_default_scene(&document)?;

    let mut meshes = Vec::with_capacity(drawables.meshes.len());
    for instance in &drawables.meshes {
        let mesh = document.mesh(instance.mesh)?;
        let primitives = mesh
            .primitives
            .iter()
            .map(|primitive| decode_primitive(&document, &buffers, primitive))
            .collect::<Result<Vec<_>, _>>()?;
        meshes.push(MeshDrawable {
            world: instance.world,
            mesh: instance.mesh,
            primitives,
        });
    }

    log::debug!(
        "loaded glTF {}: {} mesh drawable(s), {} camera(s)",
        document.version,
        meshes.len(),
        drawables.cameras.len()
    );

    Ok(LoadedScene {
        document,
        meshes,
        cameras: drawables.cameras,
    })
}
