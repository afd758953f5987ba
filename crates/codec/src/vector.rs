//! Vector payload codec
//!
//! Wire vectors are hex-encoded little-endian f32 values at a 4-byte stride.

use crate::DecodeError;

const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Decode a hex vector into f32 values.
///
/// Fails on odd/invalid hex and on byte lengths that are not a multiple of 4.
pub fn decode_vector(hex_payload: &str) -> Result<Vec<f32>, DecodeError> {
    let bytes = hex::decode(hex_payload).map_err(|e| DecodeError::InvalidVectorHex {
        message: e.to_string(),
    })?;
    decode_f32_le(&bytes)
}

/// Interpret raw bytes as little-endian f32 values.
pub fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % F32_WIDTH != 0 {
        return Err(DecodeError::InvalidVectorPayload { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(F32_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode f32 values as a lowercase hex string (little-endian).
pub fn encode_vector(values: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * F32_WIDTH);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    hex::encode(bytes)
}
