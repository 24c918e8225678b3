//! Error types for glTF loading.

/// Errors that can occur while decoding a glTF document.
#[derive(Debug, thiserror::Error)]
pub enum GltfError {
    /// The payload is not valid JSON or does not match the document schema.
    #[error("glTF parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON value was present but did not match the expected shape, or an
    /// enumerated wire code was not recognized.
    #[error("decode error: {0}")]
    Decode(String),

    /// An index used to cross-reference another entity is out of range.
    #[error("{kind} index {index} out of range ({len} declared)")]
    IndexOutOfRange {
        /// Which sequence the index points into ("node", "accessor", ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the referenced sequence.
        len: usize,
    },

    /// A byte region too short for the requested offset/stride/count, or an
    /// index count that does not form whole triangles.
    #[error("binary layout error: {0}")]
    BinaryLayout(String),

    /// A source or variant this core declines to materialize (remote buffer
    /// URIs, buffer-view-backed images, orthographic cameras, attribute
    /// component types outside the supported set).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The node graph is deeper than the traversal bound, which usually
    /// means a child cycle.
    #[error("node graph deeper than {limit} levels; cyclic children?")]
    NodeDepthExceeded {
        /// The traversal depth limit that was hit.
        limit: usize,
    },
}
