use base64::engine::general_purpose::STANDARD;
use base64::Engine;


/// Encode raw bytes as an inline buffer URI.
fn buffer_uri(bytes: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes))
}

/// Three vertices interleaved as vec3 position, vec3 normal, vec2 texcoord
/// (stride 32), the layout the end-to-end tests decode.
fn interleaved_vertices() -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..3u32 {
        let base = i as f32;
        let position = [base, base + 0.25, base + 0.5];
        let normal = [0.0f32, 1.0, 0.0];
        let texcoord = [base * 0.1, 1.0 - base * 0.1];
        bytes.extend_from_slice(bytemuck::cast_slice(&position));
        bytes.extend_from_slice(bytemuck::cast_slice(&normal));
        bytes.extend_from_slice(bytemuck::cast_slice(&texcoord));
    }
    bytes
}
