//! Accessor resolution: joining an accessor, its buffer view, and the
//! materialized buffer bytes into one self-contained descriptor.

use super::document::{ComponentType, Document, ElementType, Target};
use super::error::GltfError;

/// The materialized join of accessor + buffer view + buffer bytes.
///
/// Synthesized fresh per access and owned by the call that produced it;
/// nothing here is cached on the [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAccessor<'a> {
    /// The whole materialized buffer the view points into.
    pub bytes: &'a [u8],
    /// Byte offset of the view within `bytes`.
    pub view_offset: usize,
    /// Declared length of the view window.
    pub view_length: usize,
    /// The accessor's own offset, relative to the view.
    pub byte_offset: usize,
    /// Explicit interleaving stride; 0 means tightly packed.
    pub byte_stride: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    /// Number of elements to decode.
    pub count: usize,
    /// Declared per-component bounds (informational).
    pub min: &'a [f32],
    /// Declared per-component bounds (informational).
    pub max: &'a [f32],
    pub target: Option<Target>,
}

impl<'a> ResolvedAccessor<'a> {
    /// Tightly packed size of one element.
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.multiplicity()
    }

    /// Byte distance between consecutive elements: the explicit stride if
    /// one was declared, else the tightly packed element size.
    pub fn effective_stride(&self) -> usize {
        if self.byte_stride == 0 {
            self.element_size()
        } else {
            self.byte_stride
        }
    }

    /// Absolute byte offset of element `i`'s first component.
    ///
    /// Plain arithmetic; callers must have bounds-checked `i` against the
    /// declared count and buffer first, as the decoders do.
    pub fn element_offset(&self, i: usize) -> usize {
        self.view_offset + self.byte_offset + i * self.effective_stride()
    }
}

/// Resolve one accessor against the document and the materialized buffers.
///
/// Fails with an index error if the accessor, its buffer view, or the
/// view's buffer index is out of range.
pub fn resolve_accessor<'a>(
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    index: usize,
) -> Result<ResolvedAccessor<'a>, GltfError> {
    let accessor = document.accessor(index)?;
    let view = document.buffer_view(accessor.buffer_view)?;
    // Validate the declared buffer even though only the materialized bytes
    // are carried forward.
    document.buffer(view.buffer)?;
    let bytes = buffers
        .get(view.buffer)
        .ok_or(GltfError::IndexOutOfRange {
            kind: "buffer",
            index: view.buffer,
            len: buffers.len(),
        })?;

    Ok(ResolvedAccessor {
        bytes,
        view_offset: view.byte_offset,
        view_length: view.byte_length,
        byte_offset: accessor.byte_offset,
        byte_stride: view.byte_stride.unwrap_or(0),
        component_type: accessor.component_type,
        element_type: accessor.element_type,
        count: accessor.count,
        min: &accessor.min,
        max: &accessor.max,
        target: view.target,
    })
}

/// Resolve every accessor in the document, in order.
///
/// All-or-nothing: the first unresolvable accessor fails the whole list and
/// no partial set is returned.
pub fn resolve_accessors<'a>(
    document: &'a Document,
    buffers: &'a [Vec<u8>],
) -> Result<Vec<ResolvedAccessor<'a>>, GltfError> {
    (0..document.accessors.len())
        .map(|index| resolve_accessor(document, buffers, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_with_accessor(buffer_view: usize, buffer: usize) -> Document {
        Document::from_slice(
            serde_json::json!({
                "asset": { "version": "2.0" },
                "accessors": [{
                    "bufferView": buffer_view,
                    "byteOffset": 8,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                }],
                "bufferViews": [{
                    "buffer": buffer,
                    "byteOffset": 4,
                    "byteLength": 64,
                    "byteStride": 16,
                    "target": 34962,
                }],
                "buffers": [{
                    "byteLength": 72,
                    "uri": "data:application/octet-stream;base64,",
                }],
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_accessor_composes_offsets() {
        let document = document_with_accessor(0, 0);
        let buffers = vec![vec![0u8; 72]];
        let resolved = resolve_accessor(&document, &buffers, 0).unwrap();

        assert_eq!(resolved.view_offset, 4);
        assert_eq!(resolved.byte_offset, 8);
        assert_eq!(resolved.byte_stride, 16);
        assert_eq!(resolved.effective_stride(), 16);
        assert_eq!(resolved.element_size(), 12);
        assert_eq!(resolved.element_offset(0), 12);
        assert_eq!(resolved.element_offset(2), 44);
        assert_eq!(resolved.target, Some(Target::ArrayBuffer));
    }

    #[test]
    fn test_tight_packing_when_no_stride() {
        let mut document = document_with_accessor(0, 0);
        document.buffer_views[0].byte_stride = None;
        let buffers = vec![vec![0u8; 72]];
        let resolved = resolve_accessor(&document, &buffers, 0).unwrap();
        assert_eq!(resolved.byte_stride, 0);
        assert_eq!(resolved.effective_stride(), 12);
    }

    #[test]
    fn test_bad_view_index_fails() {
        let document = document_with_accessor(5, 0);
        let buffers = vec![vec![0u8; 72]];
        assert!(matches!(
            resolve_accessor(&document, &buffers, 0),
            Err(GltfError::IndexOutOfRange {
                kind: "bufferView",
                ..
            })
        ));
    }

    #[test]
    fn test_bad_buffer_index_fails() {
        let document = document_with_accessor(0, 3);
        let buffers = vec![vec![0u8; 72]];
        assert!(matches!(
            resolve_accessor(&document, &buffers, 0),
            Err(GltfError::IndexOutOfRange { kind: "buffer", .. })
        ));
    }

    #[test]
    fn test_resolution_is_all_or_nothing() {
        let mut document = document_with_accessor(0, 0);
        // Second accessor with a dangling view index.
        document.accessors.push(crate::gltf::document::Accessor {
            buffer_view: 9,
            byte_offset: 0,
            component_type: ComponentType::Float,
            count: 1,
            element_type: ElementType::Scalar,
            min: Vec::new(),
            max: Vec::new(),
        });
        let buffers = vec![vec![0u8; 72]];
        assert!(resolve_accessors(&document, &buffers).is_err());
    }
}
