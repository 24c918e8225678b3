//! Typed document model and the validating conversion from the raw JSON
//! shapes.
//!
//! Cross-references are kept as plain indices into the owning [`Document`]'s
//! arrays; nothing is resolved to concrete bytes at this stage. Bounds are
//! only checked by the lookup methods, so a structurally valid document can
//! still carry dangling indices that surface later during resolution.

use crate::math::{mat4_from_column_major, Mat4};

use super::error::GltfError;
use super::json;

/// Scalar numeric type of one component inside an accessor element.
///
/// Wire codes follow the GL enum values glTF inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    /// Byte width of one component of this type.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }

    fn from_code(code: u32) -> Result<Self, GltfError> {
        match code {
            5120 => Ok(Self::Byte),
            5121 => Ok(Self::UnsignedByte),
            5122 => Ok(Self::Short),
            5123 => Ok(Self::UnsignedShort),
            5125 => Ok(Self::UnsignedInt),
            5126 => Ok(Self::Float),
            other => Err(GltfError::Decode(format!(
                "unknown accessor componentType {other}"
            ))),
        }
    }
}

/// Element shape an accessor decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    /// Number of components per element.
    pub fn multiplicity(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    fn from_name(name: &str) -> Result<Self, GltfError> {
        match name {
            "SCALAR" => Ok(Self::Scalar),
            "VEC2" => Ok(Self::Vec2),
            "VEC3" => Ok(Self::Vec3),
            "VEC4" => Ok(Self::Vec4),
            "MAT2" => Ok(Self::Mat2),
            "MAT3" => Ok(Self::Mat3),
            "MAT4" => Ok(Self::Mat4),
            other => Err(GltfError::Decode(format!(
                "unknown accessor type {other:?}"
            ))),
        }
    }
}

/// Declared usage of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ArrayBuffer,
    ElementArrayBuffer,
}

impl Target {
    fn from_code(code: u32) -> Result<Self, GltfError> {
        match code {
            34962 => Ok(Self::ArrayBuffer),
            34963 => Ok(Self::ElementArrayBuffer),
            other => Err(GltfError::Decode(format!(
                "unknown bufferView target {other}"
            ))),
        }
    }
}

/// Magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagFilter {
    Nearest,
    Linear,
}

impl MagFilter {
    fn from_code(code: u32) -> Result<Self, GltfError> {
        match code {
            9728 => Ok(Self::Nearest),
            9729 => Ok(Self::Linear),
            other => Err(GltfError::Decode(format!("unknown magFilter {other}"))),
        }
    }
}

/// Minification filter, including the four mipmap variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    fn from_code(code: u32) -> Result<Self, GltfError> {
        match code {
            9728 => Ok(Self::Nearest),
            9729 => Ok(Self::Linear),
            9984 => Ok(Self::NearestMipmapNearest),
            9985 => Ok(Self::LinearMipmapNearest),
            9986 => Ok(Self::NearestMipmapLinear),
            9987 => Ok(Self::LinearMipmapLinear),
            other => Err(GltfError::Decode(format!("unknown minFilter {other}"))),
        }
    }
}

/// Texture coordinate wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

impl WrapMode {
    fn from_code(code: u32) -> Result<Self, GltfError> {
        match code {
            10497 => Ok(Self::Repeat),
            33071 => Ok(Self::ClampToEdge),
            33648 => Ok(Self::MirroredRepeat),
            other => Err(GltfError::Decode(format!("unknown wrap mode {other}"))),
        }
    }
}

/// Alpha rendering mode of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    Opaque,
    /// Alpha-tested with the given cutoff. The cutoff has no default; a
    /// `"MASK"` material without `alphaCutoff` fails to decode.
    Mask {
        cutoff: f32,
    },
    Blend,
}

/// The fully parsed document. Immutable once built; every cross-reference
/// is an index into one of these arrays.
#[derive(Debug)]
pub struct Document {
    /// Format version string from `asset.version`.
    pub version: String,
    /// Index of the default scene, if the document declares one.
    pub default_scene: Option<usize>,
    pub scenes: Vec<Scene>,
    pub cameras: Vec<Camera>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
    pub samplers: Vec<Sampler>,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<Buffer>,
}

#[derive(Debug)]
pub struct Scene {
    pub name: Option<String>,
    /// Root node indices into [`Document::nodes`].
    pub nodes: Vec<usize>,
}

/// A node: a local transform plus exactly one role.
#[derive(Debug)]
pub struct Node {
    pub name: Option<String>,
    /// Local transform; identity when the document omits `matrix`.
    pub matrix: Mat4,
    pub kind: NodeKind,
}

/// What a node carries. Roles are exclusive; a node declaring more than one
/// fails to decode.
#[derive(Debug)]
pub enum NodeKind {
    /// Interior node with child indices into [`Document::nodes`].
    Group(Vec<usize>),
    /// Leaf referencing [`Document::meshes`].
    Mesh(usize),
    /// Leaf referencing [`Document::cameras`].
    Camera(usize),
}

#[derive(Debug)]
pub struct Camera {
    pub name: Option<String>,
    pub projection: Projection,
}

/// Camera projection. Only perspective cameras are modeled; orthographic
/// cameras are rejected during decoding.
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Perspective {
        aspect_ratio: Option<f32>,
        yfov: f32,
        znear: f32,
        zfar: Option<f32>,
    },
}

#[derive(Debug)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

/// One renderable primitive. Attribute fields are accessor indices; only
/// triangle-list topology survives decoding, so no mode is stored.
#[derive(Debug)]
pub struct Primitive {
    pub position: usize,
    pub normal: usize,
    pub texcoord: usize,
    /// Index accessor, if the primitive is indexed.
    pub indices: Option<usize>,
    pub material: usize,
}

/// PBR metallic-roughness material.
#[derive(Debug)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<TextureRef>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
}

/// Reference to a texture plus the UV set it samples.
#[derive(Debug, Clone, Copy)]
pub struct TextureRef {
    pub texture: usize,
    pub tex_coord: usize,
}

#[derive(Debug)]
pub struct Texture {
    pub name: Option<String>,
    pub sampler: Option<usize>,
    pub source: usize,
}

#[derive(Debug)]
pub struct Image {
    pub name: Option<String>,
    pub source: ImageSource,
}

/// Where an image's bytes live.
#[derive(Debug)]
pub enum ImageSource {
    /// Direct URI (data URI or remote).
    Uri(String),
    /// Bytes inside a buffer view. Declared but never materialized by this
    /// core.
    BufferView { mime_type: String, view: usize },
}

#[derive(Debug)]
pub struct Sampler {
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

#[derive(Debug)]
pub struct Accessor {
    pub buffer_view: usize,
    /// Byte offset relative to the buffer view.
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub count: usize,
    pub element_type: ElementType,
    /// Declared per-component minima. Informational only; never checked
    /// against decoded data. Empty when the document omits them.
    pub min: Vec<f32>,
    /// Declared per-component maxima. Informational only.
    pub max: Vec<f32>,
}

#[derive(Debug)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// Explicit interleaving stride; `None` means tightly packed.
    pub byte_stride: Option<usize>,
    pub target: Option<Target>,
}

#[derive(Debug)]
pub struct Buffer {
    pub byte_length: usize,
    pub source: BufferSource,
}

/// How a buffer's bytes are sourced.
#[derive(Debug)]
pub enum BufferSource {
    /// Inline `data:application/octet-stream;base64,` payload.
    DataUri(String),
    /// Remote URI; materialized only through the caller-supplied fetch hook.
    Remote(String),
}

fn lookup<'a, T>(items: &'a [T], index: usize, kind: &'static str) -> Result<&'a T, GltfError> {
    items.get(index).ok_or(GltfError::IndexOutOfRange {
        kind,
        index,
        len: items.len(),
    })
}

impl Document {
    /// Parse a document from raw JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, GltfError> {
        let root: json::Root = serde_json::from_slice(data)?;
        Self::from_json(root)
    }

    pub fn scene(&self, index: usize) -> Result<&Scene, GltfError> {
        lookup(&self.scenes, index, "scene")
    }

    pub fn camera(&self, index: usize) -> Result<&Camera, GltfError> {
        lookup(&self.cameras, index, "camera")
    }

    pub fn node(&self, index: usize) -> Result<&Node, GltfError> {
        lookup(&self.nodes, index, "node")
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh, GltfError> {
        lookup(&self.meshes, index, "mesh")
    }

    pub fn material(&self, index: usize) -> Result<&Material, GltfError> {
        lookup(&self.materials, index, "material")
    }

    pub fn texture(&self, index: usize) -> Result<&Texture, GltfError> {
        lookup(&self.textures, index, "texture")
    }

    pub fn image(&self, index: usize) -> Result<&Image, GltfError> {
        lookup(&self.images, index, "image")
    }

    pub fn sampler(&self, index: usize) -> Result<&Sampler, GltfError> {
        lookup(&self.samplers, index, "sampler")
    }

    pub fn accessor(&self, index: usize) -> Result<&Accessor, GltfError> {
        lookup(&self.accessors, index, "accessor")
    }

    pub fn buffer_view(&self, index: usize) -> Result<&BufferView, GltfError> {
        lookup(&self.buffer_views, index, "bufferView")
    }

    pub fn buffer(&self, index: usize) -> Result<&Buffer, GltfError> {
        lookup(&self.buffers, index, "buffer")
    }

    /// Build the typed document from the raw JSON shapes, substituting
    /// schema defaults for absent fields and rejecting unknown wire codes.
    fn from_json(root: json::Root) -> Result<Self, GltfError> {
        let scenes = root
            .scenes
            .into_iter()
            .map(|s| Scene {
                name: s.name,
                nodes: s.nodes,
            })
            .collect();

        let cameras = root
            .cameras
            .into_iter()
            .map(decode_camera)
            .collect::<Result<Vec<_>, _>>()?;

        let nodes = root
            .nodes
            .into_iter()
            .map(decode_node)
            .collect::<Result<Vec<_>, _>>()?;

        let meshes = root
            .meshes
            .into_iter()
            .map(decode_mesh)
            .collect::<Result<Vec<_>, _>>()?;

        let materials = root
            .materials
            .into_iter()
            .map(decode_material)
            .collect::<Result<Vec<_>, _>>()?;

        let textures = root
            .textures
            .into_iter()
            .map(|t| Texture {
                name: t.name,
                sampler: t.sampler,
                source: t.source,
            })
            .collect();

        let images = root
            .images
            .into_iter()
            .map(decode_image)
            .collect::<Result<Vec<_>, _>>()?;

        let samplers = root
            .samplers
            .into_iter()
            .map(decode_sampler)
            .collect::<Result<Vec<_>, _>>()?;

        let accessors = root
            .accessors
            .into_iter()
            .map(decode_accessor)
            .collect::<Result<Vec<_>, _>>()?;

        let buffer_views = root
            .buffer_views
            .into_iter()
            .map(decode_buffer_view)
            .collect::<Result<Vec<_>, _>>()?;

        let buffers = root.buffers.into_iter().map(decode_buffer).collect();

        Ok(Document {
            version: root.asset.version,
            default_scene: root.scene,
            scenes,
            cameras,
            nodes,
            meshes,
            materials,
            textures,
            images,
            samplers,
            accessors,
            buffer_views,
            buffers,
        })
    }
}

fn decode_camera(camera: json::Camera) -> Result<Camera, GltfError> {
    let projection = match camera.kind.as_str() {
        "perspective" => {
            let p = camera.perspective.ok_or_else(|| {
                GltfError::Decode("perspective camera without perspective block".into())
            })?;
            Projection::Perspective {
                aspect_ratio: p.aspect_ratio,
                yfov: p.yfov,
                znear: p.znear,
                zfar: p.zfar,
            }
        }
        "orthographic" => {
            return Err(GltfError::Unsupported("orthographic cameras".into()));
        }
        other => {
            return Err(GltfError::Decode(format!("unknown camera type {other:?}")));
        }
    };
    Ok(Camera {
        name: camera.name,
        projection,
    })
}

fn decode_node(node: json::Node) -> Result<Node, GltfError> {
    let matrix = match &node.matrix {
        Some(m) => mat4_from_column_major(m),
        None => Mat4::identity(),
    };

    let roles = usize::from(node.children.is_some())
        + usize::from(node.mesh.is_some())
        + usize::from(node.camera.is_some());
    if roles > 1 {
        return Err(GltfError::Decode(format!(
            "node {:?} combines children/mesh/camera roles",
            node.name.as_deref().unwrap_or("")
        )));
    }

    let kind = if let Some(mesh) = node.mesh {
        NodeKind::Mesh(mesh)
    } else if let Some(camera) = node.camera {
        NodeKind::Camera(camera)
    } else {
        // A bare node is an empty group.
        NodeKind::Group(node.children.unwrap_or_default())
    };

    Ok(Node {
        name: node.name,
        matrix,
        kind,
    })
}

fn decode_mesh(mesh: json::Mesh) -> Result<Mesh, GltfError> {
    let primitives = mesh
        .primitives
        .into_iter()
        .map(decode_mesh_primitive)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Mesh {
        name: mesh.name,
        primitives,
    })
}

fn decode_mesh_primitive(primitive: json::Primitive) -> Result<Primitive, GltfError> {
    // 4 = TRIANGLES, the only supported topology.
    let mode = primitive.mode.unwrap_or(4);
    if mode != 4 {
        return Err(GltfError::Decode(format!(
            "unsupported primitive mode {mode} (only 4/TRIANGLES)"
        )));
    }
    Ok(Primitive {
        position: primitive.attributes.position,
        normal: primitive.attributes.normal,
        texcoord: primitive.attributes.texcoord_0,
        indices: primitive.indices,
        material: primitive.material,
    })
}

fn decode_material(material: json::Material) -> Result<Material, GltfError> {
    let alpha_mode = match material.alpha_mode.as_deref() {
        None | Some("OPAQUE") => AlphaMode::Opaque,
        Some("MASK") => {
            let cutoff = material.alpha_cutoff.ok_or_else(|| {
                GltfError::Decode("MASK material without alphaCutoff".into())
            })?;
            AlphaMode::Mask { cutoff }
        }
        Some("BLEND") => AlphaMode::Blend,
        Some(other) => {
            return Err(GltfError::Decode(format!("unknown alphaMode {other:?}")));
        }
    };

    let pbr = material.pbr_metallic_roughness;
    Ok(Material {
        name: material.name,
        base_color_factor: pbr.base_color_factor.unwrap_or([1.0, 1.0, 1.0, 1.0]),
        base_color_texture: pbr.base_color_texture.map(|t| TextureRef {
            texture: t.index,
            tex_coord: t.tex_coord,
        }),
        metallic_factor: pbr.metallic_factor.unwrap_or(1.0),
        roughness_factor: pbr.roughness_factor.unwrap_or(1.0),
        emissive_factor: material.emissive_factor.unwrap_or([0.0, 0.0, 0.0]),
        alpha_mode,
        double_sided: material.double_sided.unwrap_or(false),
    })
}

fn decode_image(image: json::Image) -> Result<Image, GltfError> {
    let source = match (image.uri, image.buffer_view) {
        (Some(uri), None) => ImageSource::Uri(uri),
        (None, Some(view)) => ImageSource::BufferView {
            mime_type: image.mime_type.unwrap_or_else(|| "image/png".into()),
            view,
        },
        (Some(_), Some(_)) => {
            return Err(GltfError::Decode(
                "image declares both uri and bufferView".into(),
            ));
        }
        (None, None) => {
            return Err(GltfError::Decode(
                "image declares neither uri nor bufferView".into(),
            ));
        }
    };
    Ok(Image {
        name: image.name,
        source,
    })
}

fn decode_sampler(sampler: json::Sampler) -> Result<Sampler, GltfError> {
    Ok(Sampler {
        mag_filter: sampler
            .mag_filter
            .map(MagFilter::from_code)
            .transpose()?
            .unwrap_or(MagFilter::Linear),
        min_filter: sampler
            .min_filter
            .map(MinFilter::from_code)
            .transpose()?
            .unwrap_or(MinFilter::NearestMipmapLinear),
        wrap_s: sampler
            .wrap_s
            .map(WrapMode::from_code)
            .transpose()?
            .unwrap_or(WrapMode::Repeat),
        wrap_t: sampler
            .wrap_t
            .map(WrapMode::from_code)
            .transpose()?
            .unwrap_or(WrapMode::Repeat),
    })
}

fn decode_accessor(accessor: json::Accessor) -> Result<Accessor, GltfError> {
    Ok(Accessor {
        buffer_view: accessor.buffer_view,
        byte_offset: accessor.byte_offset,
        component_type: ComponentType::from_code(accessor.component_type)?,
        count: accessor.count,
        element_type: ElementType::from_name(&accessor.kind)?,
        min: accessor.min,
        max: accessor.max,
    })
}

fn decode_buffer_view(view: json::BufferView) -> Result<BufferView, GltfError> {
    Ok(BufferView {
        buffer: view.buffer,
        byte_offset: view.byte_offset,
        byte_length: view.byte_length,
        byte_stride: view.byte_stride,
        target: view.target.map(Target::from_code).transpose()?,
    })
}

fn decode_buffer(buffer: json::Buffer) -> Buffer {
    let source = if buffer.uri.starts_with("data:") {
        BufferSource::DataUri(buffer.uri)
    } else {
        BufferSource::Remote(buffer.uri)
    };
    Buffer {
        byte_length: buffer.byte_length,
        source,
    }
}
