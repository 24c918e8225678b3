//! Buffer and image byte sourcing.
//!
//! Inline `data:` URIs are decoded here; remote URIs are the surrounding
//! I/O layer's problem and only enter the pipeline through the fetch
//! callback of [`resolve_buffers_with`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::document::{BufferSource, Document, ImageSource};
use super::error::GltfError;

/// The only URI prefix accepted for inline buffer payloads.
pub const OCTET_STREAM_PREFIX: &str = "data:application/octet-stream;base64,";

/// Decode an inline buffer URI. The prefix must match
/// [`OCTET_STREAM_PREFIX`] exactly; anything else is a decode failure.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, GltfError> {
    let payload = uri.strip_prefix(OCTET_STREAM_PREFIX).ok_or_else(|| {
        GltfError::Decode(format!(
            "buffer data URI does not start with {OCTET_STREAM_PREFIX:?}"
        ))
    })?;
    STANDARD
        .decode(payload)
        .map_err(|e| GltfError::Decode(format!("bad base64 in buffer data URI: {e}")))
}

/// Parse a generic `data:<mime>;base64,` URI (used by inline images) and
/// return the decoded bytes, or `None` if the URI is not a data URI.
pub fn parse_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let base64_start = rest.find(";base64,")?;
    STANDARD.decode(&rest[base64_start + 8..]).ok()
}

/// Materialize every buffer of the document, in declaration order.
///
/// Inline data URIs only; any remote buffer fails the whole list. There is
/// no partial result: one bad buffer invalidates the document's binary data.
pub fn resolve_buffers(document: &Document) -> Result<Vec<Vec<u8>>, GltfError> {
    resolve_buffers_with(document, |uri| {
        Err(GltfError::Unsupported(format!("remote buffer URI {uri:?}")))
    })
}

/// Materialize every buffer, delegating remote URIs to `fetch`.
///
/// `fetch` is the external collaborator's hook: it must return the complete
/// byte content of the URI or an error, which cancels the whole resolution.
pub fn resolve_buffers_with<F>(document: &Document, mut fetch: F) -> Result<Vec<Vec<u8>>, GltfError>
where
    F: FnMut(&str) -> Result<Vec<u8>, GltfError>,
{
    let mut buffers = Vec::with_capacity(document.buffers.len());

    for (index, buffer) in document.buffers.iter().enumerate() {
        let data = match &buffer.source {
            BufferSource::DataUri(uri) => decode_data_uri(uri)?,
            BufferSource::Remote(uri) => fetch(uri)?,
        };
        if data.len() != buffer.byte_length {
            log::warn!(
                "buffer {index}: materialized {} bytes, {} declared",
                data.len(),
                buffer.byte_length
            );
        }
        buffers.push(data);
    }

    log::debug!("materialized {} buffer(s)", buffers.len());
    Ok(buffers)
}

/// Bytes for one declared image, ready for an external decoder.
#[derive(Debug)]
pub enum ImageData<'a> {
    /// Decoded inline data-URI payload.
    Inline(Vec<u8>),
    /// Remote URI the caller must fetch itself.
    Remote(&'a str),
}

/// Source the bytes of image `index`.
///
/// Buffer-view-backed images are declared in the document model but never
/// materialized here.
pub fn image_bytes(document: &Document, index: usize) -> Result<ImageData<'_>, GltfError> {
    let image = document.image(index)?;
    match &image.source {
        ImageSource::Uri(uri) => {
            if uri.starts_with("data:") {
                let bytes = parse_data_uri(uri).ok_or_else(|| {
                    GltfError::Decode(format!("image {index}: malformed data URI"))
                })?;
                Ok(ImageData::Inline(bytes))
            } else {
                Ok(ImageData::Remote(uri))
            }
        }
        ImageSource::BufferView { mime_type, .. } => Err(GltfError::Unsupported(format!(
            "image {index}: buffer-view-backed image ({mime_type})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::document::{Buffer, BufferSource};

    fn empty_document() -> Document {
        Document::from_slice(br#"{ "asset": { "version": "2.0" } }"#).unwrap()
    }

    #[test]
    fn test_decode_data_uri() {
        let data = decode_data_uri("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_data_uri_round_trip() {
        let original: Vec<u8> = (0u8..=255).collect();
        let uri = format!("{OCTET_STREAM_PREFIX}{}", STANDARD.encode(&original));
        assert_eq!(decode_data_uri(&uri).unwrap(), original);
    }

    #[test]
    fn test_decode_data_uri_wrong_prefix() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,AQID"),
            Err(GltfError::Decode(_))
        ));
        assert!(matches!(
            decode_data_uri("file://buffer.bin"),
            Err(GltfError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_data_uri_bad_base64() {
        assert!(matches!(
            decode_data_uri("data:application/octet-stream;base64,@@@@"),
            Err(GltfError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_data_uri() {
        assert_eq!(
            parse_data_uri("data:image/png;base64,AQID").unwrap(),
            vec![1, 2, 3]
        );
        assert!(parse_data_uri("https://example.com/a.png").is_none());
    }

    #[test]
    fn test_remote_buffer_rejected_without_fetch() {
        let mut document = empty_document();
        document.buffers.push(Buffer {
            byte_length: 4,
            source: BufferSource::Remote("https://example.com/a.bin".into()),
        });
        assert!(matches!(
            resolve_buffers(&document),
            Err(GltfError::Unsupported(_))
        ));
    }

    #[test]
    fn test_remote_buffer_through_fetch_hook() {
        let mut document = empty_document();
        document.buffers.push(Buffer {
            byte_length: 4,
            source: BufferSource::Remote("https://example.com/a.bin".into()),
        });
        let buffers =
            resolve_buffers_with(&document, |_uri| Ok(vec![9, 8, 7, 6])).unwrap();
        assert_eq!(buffers, vec![vec![9, 8, 7, 6]]);
    }

    #[test]
    fn test_image_bytes_variants() {
        let document = Document::from_slice(
            serde_json::json!({
                "asset": { "version": "2.0" },
                "images": [
                    { "uri": "data:image/png;base64,AQID" },
                    { "uri": "https://example.com/a.png" },
                    { "bufferView": 0, "mimeType": "image/png" },
                ],
                "bufferViews": [{ "buffer": 0, "byteLength": 3 }],
                "buffers": [{ "byteLength": 3,
                              "uri": "data:application/octet-stream;base64,AQID" }],
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

        assert!(matches!(
            image_bytes(&document, 0).unwrap(),
            ImageData::Inline(bytes) if bytes == vec![1, 2, 3]
        ));
        assert!(matches!(
            image_bytes(&document, 1).unwrap(),
            ImageData::Remote("https://example.com/a.png")
        ));
        assert!(matches!(
            image_bytes(&document, 2),
            Err(GltfError::Unsupported(_))
        ));
        assert!(matches!(
            image_bytes(&document, 3),
            Err(GltfError::IndexOutOfRange { kind: "image", .. })
        ));
    }

    #[test]
    fn test_one_bad_buffer_fails_all() {
        let mut document = empty_document();
        document.buffers.push(Buffer {
            byte_length: 3,
            source: BufferSource::DataUri(format!("{OCTET_STREAM_PREFIX}AQID")),
        });
        document.buffers.push(Buffer {
            byte_length: 1,
            source: BufferSource::DataUri("data:application/octet-stream;base64,!".into()),
        });
        assert!(resolve_buffers(&document).is_err());
    }
}
