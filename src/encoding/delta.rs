//! Delta encoding for integer pages
//!
//! Layout: `[base: fixed-width LE][num_deltas: varint u32][delta: zigzag varint]...`
//! Values are reconstructed by a running sum from the base. Overflow during
//! reconstruction wraps (two's-complement); it is not an error.

use crate::encoding::varint;
use crate::{ColError, Result};

/// Encode an i32 slice as a base value plus successive deltas.
pub fn encode_i32(values: &[i32]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(4 + values.len() * varint::MAX_VARINT32_BYTES);
    out.extend_from_slice(&values[0].to_le_bytes());
    varint::encode_u32((values.len() - 1) as u32, &mut out);

    let mut prev = values[0];
    for &value in &values[1..] {
        varint::encode_i32(value.wrapping_sub(prev), &mut out);
        prev = value;
    }
    out
}

/// Encode an i64 slice as a base value plus successive deltas.
pub fn encode_i64(values: &[i64]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(8 + values.len() * varint::MAX_VARINT64_BYTES);
    out.extend_from_slice(&values[0].to_le_bytes());
    varint::encode_u32((values.len() - 1) as u32, &mut out);

    let mut prev = values[0];
    for &value in &values[1..] {
        varint::encode_i64(value.wrapping_sub(prev), &mut out);
        prev = value;
    }
    out
}

/// Decode a delta-encoded i32 page of exactly `num_values` values.
pub fn decode_i32(buf: &[u8], num_values: usize) -> Result<Vec<i32>> {
    if num_values == 0 && buf.is_empty() {
        return Ok(Vec::new());
    }
    if buf.len() < 4 {
        return Err(ColError::TruncatedInput(
            "delta page shorter than its base value".to_string(),
        ));
    }

    let base = i32::from_le_bytes(buf[0..4].try_into().unwrap());
    let mut pos = 4;
    let (num_deltas, consumed) = varint::decode_u32(&buf[pos..])?;
    pos += consumed;

    if num_deltas as usize + 1 != num_values {
        return Err(ColError::MalformedPage(format!(
            "{} deltas for {} declared values",
            num_deltas, num_values
        )));
    }

    let mut result = Vec::with_capacity(num_values);
    result.push(base);
    let mut current = base;
    for _ in 0..num_deltas {
        let (delta, consumed) = varint::decode_i32(&buf[pos..])?;
        pos += consumed;
        current = current.wrapping_add(delta);
        result.push(current);
    }

    if pos != buf.len() {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after the last delta",
            buf.len() - pos
        )));
    }
    Ok(result)
}

/// Decode a delta-encoded i64 page of exactly `num_values` values.
pub fn decode_i64(buf: &[u8], num_values: usize) -> Result<Vec<i64>> {
    if num_values == 0 && buf.is_empty() {
        return Ok(Vec::new());
    }
    if buf.len() < 8 {
        return Err(ColError::TruncatedInput(
            "delta page shorter than its base value".to_string(),
        ));
    }

    let base = i64::from_le_bytes(buf[0..8].try_into().unwrap());
    let mut pos = 8;
    let (num_deltas, consumed) = varint::decode_u32(&buf[pos..])?;
    pos += consumed;

    if num_deltas as usize + 1 != num_values {
        return Err(ColError::MalformedPage(format!(
            "{} deltas for {} declared values",
            num_deltas, num_values
        )));
    }

    let mut result = Vec::with_capacity(num_values);
    result.push(base);
    let mut current = base;
    for _ in 0..num_deltas {
        let (delta, consumed) = varint::decode_i64(&buf[pos..])?;
        pos += consumed;
        current = current.wrapping_add(delta);
        result.push(current);
    }

    if pos != buf.len() {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after the last delta",
            buf.len() - pos
        )));
    }
    Ok(result)
}
