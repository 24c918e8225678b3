//! Scene assembly: walking the node graph into flat renderable instances.
//!
//! The walk composes world transforms (parent x local) and checks every
//! index it touches, so a document with dangling references fails here
//! rather than producing a partial scene.

use crate::math::Mat4;

use super::document::{Document, NodeKind, Scene};
use super::error::GltfError;

/// Maximum node-graph depth the walk will follow. The document format
/// cannot express parent links, so a graph deeper than this is treated as
/// a child cycle.
pub const MAX_NODE_DEPTH: usize = 256;

/// One mesh to draw: composed world transform plus the mesh index.
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance {
    pub world: Mat4,
    pub mesh: usize,
}

/// One camera placement: composed world transform plus the camera index.
#[derive(Debug, Clone, Copy)]
pub struct CameraInstance {
    pub world: Mat4,
    pub camera: usize,
}

/// Flat result of walking one scene.
#[derive(Debug, Default)]
pub struct SceneDrawables {
    pub meshes: Vec<MeshInstance>,
    pub cameras: Vec<CameraInstance>,
}

/// Select the document's declared default scene.
///
/// No declared scene, or a declared index outside the scene list, is a
/// failure; the first scene is never silently substituted.
pub fn default_scene(document: &Document) -> Result<&Scene, GltfError> {
    let index = document
        .default_scene
        .ok_or_else(|| GltfError::Decode("document declares no default scene".into()))?;
    document.scene(index)
}

/// Walk `scene`'s roots and collect every mesh and camera instance reached.
pub fn assemble_scene(
    document: &Document,
    scene: &Scene,
) -> Result<SceneDrawables, GltfError> {
    let mut drawables = SceneDrawables::default();
    let root = Mat4::identity();
    for &node_index in &scene.nodes {
        visit_node(document, node_index, &root, 0, &mut drawables)?;
    }
    log::debug!(
        "assembled scene {:?}: {} mesh instance(s), {} camera(s)",
        scene.name.as_deref().unwrap_or(""),
        drawables.meshes.len(),
        drawables.cameras.len()
    );
    Ok(drawables)
}

/// Walk the default scene.
pub fn assemble_default_scene(document: &Document) -> Result<SceneDrawables, GltfError> {
    assemble_scene(document, default_scene(document)?)
}

fn visit_node(
    document: &Document,
    node_index: usize,
    parent: &Mat4,
    depth: usize,
    out: &mut SceneDrawables,
) -> Result<(), GltfError> {
    if depth > MAX_NODE_DEPTH {
        return Err(GltfError::NodeDepthExceeded {
            limit: MAX_NODE_DEPTH,
        });
    }

    let node = document.node(node_index)?;
    let world = parent * node.matrix;

    match &node.kind {
        NodeKind::Group(children) => {
            for &child in children {
                visit_node(document, child, &world, depth + 1, out)?;
            }
        }
        NodeKind::Mesh(mesh_index) => {
            check_mesh_refs(document, *mesh_index)?;
            out.meshes.push(MeshInstance {
                world,
                mesh: *mesh_index,
            });
        }
        NodeKind::Camera(camera_index) => {
            document.camera(*camera_index)?;
            out.cameras.push(CameraInstance {
                world,
                camera: *camera_index,
            });
        }
    }
    Ok(())
}

/// Check the reference chain hanging off a mesh: primitives, their
/// materials, and any textures/samplers/images those materials name.
fn check_mesh_refs(document: &Document, mesh_index: usize) -> Result<(), GltfError> {
    let mesh = document.mesh(mesh_index)?;
    for primitive in &mesh.primitives {
        let material = document.material(primitive.material)?;
        if let Some(texture_ref) = &material.base_color_texture {
            let texture = document.texture(texture_ref.texture)?;
            document.image(texture.source)?;
            if let Some(sampler) = texture.sampler {
                document.sampler(sampler)?;
            }
        }
    }
    Ok(())
}
