//! Typed attribute decoding from resolved accessors.
//!
//! Little-endian, fixed-width reads with stride skipping between elements.
//! Only the shapes the renderer consumes are supported: f32 2/3-vectors and
//! u16 scalar index triples. Everything else is rejected, never guessed.

use super::accessor::{resolve_accessor, ResolvedAccessor};
use super::document::{ComponentType, Document, ElementType, Primitive};
use super::error::GltfError;

/// Verify that `count` elements starting at the accessor's offset fit both
/// the view window and the materialized buffer.
///
/// All arithmetic is checked: `count`, `byteOffset`, and `byteStride` come
/// straight from the document, so an absurd declaration must surface as a
/// layout error, not an overflow.
fn check_bounds(accessor: &ResolvedAccessor<'_>) -> Result<(), GltfError> {
    if accessor.count == 0 {
        return Ok(());
    }
    let overflow = || {
        GltfError::BinaryLayout(format!(
            "accessor span overflows (count {}, stride {})",
            accessor.count,
            accessor.effective_stride()
        ))
    };
    // The final element reads only its tight size; the trailing stride pad
    // is never touched.
    let end = (accessor.count - 1)
        .checked_mul(accessor.effective_stride())
        .and_then(|span| span.checked_add(accessor.view_offset))
        .and_then(|at| at.checked_add(accessor.byte_offset))
        .and_then(|at| at.checked_add(accessor.element_size()))
        .ok_or_else(overflow)?;
    let view_end = accessor
        .view_offset
        .checked_add(accessor.view_length)
        .ok_or_else(overflow)?;
    if end > view_end || end > accessor.bytes.len() {
        return Err(GltfError::BinaryLayout(format!(
            "need bytes up to {end}, have view end {view_end} in a {}-byte buffer",
            accessor.bytes.len()
        )));
    }
    Ok(())
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

/// Decode `count` float vectors of dimension `N`, skipping stride padding
/// between elements.
fn decode_float_elements<const N: usize>(
    accessor: &ResolvedAccessor<'_>,
    expected: ElementType,
) -> Result<Vec<[f32; N]>, GltfError> {
    if accessor.element_type != expected {
        return Err(GltfError::Decode(format!(
            "expected {expected:?} accessor, got {:?}",
            accessor.element_type
        )));
    }
    if accessor.component_type != ComponentType::Float {
        return Err(GltfError::Unsupported(format!(
            "{:?} vertex components (only Float)",
            accessor.component_type
        )));
    }
    check_bounds(accessor)?;

    let mut result = Vec::with_capacity(accessor.count);
    for i in 0..accessor.count {
        let offset = accessor.element_offset(i);
        let mut element = [0.0f32; N];
        for (c, value) in element.iter_mut().enumerate() {
            *value = read_f32(accessor.bytes, offset + c * 4);
        }
        result.push(element);
    }
    Ok(result)
}

/// Decode a `VEC2`/`Float` accessor into 2-component vectors.
pub fn decode_vec2(accessor: &ResolvedAccessor<'_>) -> Result<Vec<[f32; 2]>, GltfError> {
    decode_float_elements::<2>(accessor, ElementType::Vec2)
}

/// Decode a `VEC3`/`Float` accessor into 3-component vectors.
pub fn decode_vec3(accessor: &ResolvedAccessor<'_>) -> Result<Vec<[f32; 3]>, GltfError> {
    decode_float_elements::<3>(accessor, ElementType::Vec3)
}

/// Decode a `SCALAR`/`UnsignedShort` accessor into triangle index triples.
///
/// The element count must be divisible by 3; element `3k + c` becomes
/// component `c` of triple `k`.
pub fn decode_index_triples(
    accessor: &ResolvedAccessor<'_>,
) -> Result<Vec<[u16; 3]>, GltfError> {
    if accessor.element_type != ElementType::Scalar {
        return Err(GltfError::Decode(format!(
            "expected Scalar index accessor, got {:?}",
            accessor.element_type
        )));
    }
    if accessor.component_type != ComponentType::UnsignedShort {
        return Err(GltfError::Unsupported(format!(
            "{:?} indices (only UnsignedShort)",
            accessor.component_type
        )));
    }
    if accessor.count % 3 != 0 {
        return Err(GltfError::BinaryLayout(format!(
            "index count {} is not divisible by 3",
            accessor.count
        )));
    }
    check_bounds(accessor)?;

    let mut result = Vec::with_capacity(accessor.count / 3);
    for k in 0..accessor.count / 3 {
        let mut triple = [0u16; 3];
        for (c, value) in triple.iter_mut().enumerate() {
            *value = read_u16(accessor.bytes, accessor.element_offset(3 * k + c));
        }
        result.push(triple);
    }
    Ok(result)
}

/// Fully decoded geometry of one mesh primitive.
#[derive(Debug)]
pub struct PrimitiveData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Triangle index triples, when the primitive is indexed.
    pub indices: Option<Vec<[u16; 3]>>,
    /// Index into [`Document::materials`].
    pub material: usize,
}

/// Resolve and decode every attribute of one primitive.
pub fn decode_primitive(
    document: &Document,
    buffers: &[Vec<u8>],
    primitive: &Primitive,
) -> Result<PrimitiveData, GltfError> {
    let positions = decode_vec3(&resolve_accessor(document, buffers, primitive.position)?)?;
    let normals = decode_vec3(&resolve_accessor(document, buffers, primitive.normal)?)?;
    let tex_coords = decode_vec2(&resolve_accessor(document, buffers, primitive.texcoord)?)?;
    let indices = match primitive.indices {
        Some(index) => Some(decode_index_triples(&resolve_accessor(
            document, buffers, index,
        )?)?),
        None => None,
    };
    Ok(PrimitiveData {
        positions,
        normals,
        tex_coords,
        indices,
        material: primitive.material,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::document::Target;

    fn float_accessor<'a>(
        bytes: &'a [u8],
        element_type: ElementType,
        count: usize,
        stride: usize,
    ) -> ResolvedAccessor<'a> {
        ResolvedAccessor {
            bytes,
            view_offset: 0,
            view_length: bytes.len(),
            byte_offset: 0,
            byte_stride: stride,
            component_type: ComponentType::Float,
            element_type,
            count,
            min: &[],
            max: &[],
            target: Some(Target::ArrayBuffer),
        }
    }

    #[test]
    fn test_decode_vec3_tightly_packed() {
        let values: [f32; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let decoded = decode_vec3(&float_accessor(bytes, ElementType::Vec3, 3, 0)).unwrap();
        assert_eq!(
            decoded,
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
        );
    }

    #[test]
    fn test_decode_vec2_with_stride_skips_padding() {
        // Two vec2 elements interleaved with 8 bytes of foreign data each.
        let mut bytes = Vec::new();
        for pair in [[1.0f32, 2.0], [3.0, 4.0]] {
            bytes.extend_from_slice(bytemuck::cast_slice(&pair));
            bytes.extend_from_slice(&[0xAA; 8]);
        }
        let decoded = decode_vec2(&float_accessor(&bytes, ElementType::Vec2, 2, 16)).unwrap();
        assert_eq!(decoded, vec![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_strided_element_offsets() {
        let bytes = vec![0u8; 64];
        let mut accessor = float_accessor(&bytes, ElementType::Vec3, 3, 20);
        accessor.view_offset = 4;
        accessor.byte_offset = 8;
        for i in 0..3 {
            assert_eq!(accessor.element_offset(i), 4 + 8 + i * 20);
        }
    }

    #[test]
    fn test_short_region_fails_not_truncates() {
        let values: [f32; 5] = [1.0; 5];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        // Claims 2 vec3 elements = 24 bytes, only 20 present.
        let result = decode_vec3(&float_accessor(bytes, ElementType::Vec3, 2, 0));
        assert!(matches!(result, Err(GltfError::BinaryLayout(_))));
    }

    #[test]
    fn test_view_window_is_respected() {
        let values: [f32; 12] = [1.0; 12];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let mut accessor = float_accessor(bytes, ElementType::Vec3, 4, 0);
        // Buffer is long enough, but the declared view window is not.
        accessor.view_length = 24;
        assert!(matches!(
            decode_vec3(&accessor),
            Err(GltfError::BinaryLayout(_))
        ));
    }

    #[test]
    fn test_wrong_element_type_fails() {
        let bytes = vec![0u8; 16];
        let accessor = float_accessor(&bytes, ElementType::Vec4, 1, 0);
        assert!(matches!(
            decode_vec3(&accessor),
            Err(GltfError::Decode(_))
        ));
    }

    #[test]
    fn test_non_float_components_unsupported() {
        let bytes = vec![0u8; 16];
        let mut accessor = float_accessor(&bytes, ElementType::Vec3, 1, 0);
        accessor.component_type = ComponentType::UnsignedByte;
        assert!(matches!(
            decode_vec3(&accessor),
            Err(GltfError::Unsupported(_))
        ));
    }

    fn index_accessor<'a>(bytes: &'a [u8], count: usize) -> ResolvedAccessor<'a> {
        ResolvedAccessor {
            bytes,
            view_offset: 0,
            view_length: bytes.len(),
            byte_offset: 0,
            byte_stride: 0,
            component_type: ComponentType::UnsignedShort,
            element_type: ElementType::Scalar,
            count,
            min: &[],
            max: &[],
            target: Some(Target::ElementArrayBuffer),
        }
    }

    #[test]
    fn test_decode_index_triples() {
        let values: [u16; 6] = [0, 1, 2, 2, 1, 3];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let triples = decode_index_triples(&index_accessor(bytes, 6)).unwrap();
        assert_eq!(triples, vec![[0, 1, 2], [2, 1, 3]]);
    }

    #[test]
    fn test_index_count_must_form_triangles() {
        let values: [u16; 4] = [0, 1, 2, 3];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        assert!(matches!(
            decode_index_triples(&index_accessor(bytes, 4)),
            Err(GltfError::BinaryLayout(_))
        ));
    }

    #[test]
    fn test_uint32_indices_unsupported() {
        let bytes = vec![0u8; 24];
        let mut accessor = index_accessor(&bytes, 3);
        accessor.component_type = ComponentType::UnsignedInt;
        assert!(matches!(
            decode_index_triples(&accessor),
            Err(GltfError::Unsupported(_))
        ));
    }

    #[test]
    fn test_absurd_count_is_a_layout_error() {
        // A count whose byte span overflows usize must fail like any other
        // too-short region, not wrap or panic.
        let bytes = vec![0u8; 96];
        let accessor = float_accessor(&bytes, ElementType::Vec3, usize::MAX, 32);
        assert!(matches!(
            decode_vec3(&accessor),
            Err(GltfError::BinaryLayout(_))
        ));

        let mut indices = index_accessor(&bytes, usize::MAX - (usize::MAX % 3));
        indices.byte_stride = 2;
        assert!(matches!(
            decode_index_triples(&indices),
            Err(GltfError::BinaryLayout(_))
        ));
    }

    #[test]
    fn test_empty_accessor_decodes_empty() {
        let accessor = float_accessor(&[], ElementType::Vec3, 0, 0);
        assert!(decode_vec3(&accessor).unwrap().is_empty());
    }
}
