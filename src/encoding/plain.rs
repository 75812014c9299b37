//! Plain (uncompressed) page codecs
//!
//! Integers are raw little-endian fixed-width values. Strings are a table
//! of `num_values + 1` u32 byte offsets followed by the concatenated UTF-8
//! payload; `offsets[i]` is where string `i` starts and the final offset is
//! the payload length.

use crate::{ColError, Result};

/// Encode an i32 slice as raw little-endian values.
pub fn encode_i32(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Encode an i64 slice as raw little-endian values.
pub fn encode_i64(values: &[i64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode a plain i32 page of exactly `num_values` values.
pub fn decode_i32(buf: &[u8], num_values: usize) -> Result<Vec<i32>> {
    let expected = num_values * 4;
    if buf.len() < expected {
        return Err(ColError::TruncatedInput(format!(
            "plain i32 page has {} bytes, {} values need {}",
            buf.len(),
            num_values,
            expected
        )));
    }
    if buf.len() > expected {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after {} plain i32 values",
            buf.len() - expected,
            num_values
        )));
    }

    let mut result = Vec::with_capacity(num_values);
    for chunk in buf.chunks_exact(4) {
        result.push(i32::from_le_bytes(chunk.try_into().unwrap()));
    }
    Ok(result)
}

/// Decode a plain i64 page of exactly `num_values` values.
pub fn decode_i64(buf: &[u8], num_values: usize) -> Result<Vec<i64>> {
    let expected = num_values * 8;
    if buf.len() < expected {
        return Err(ColError::TruncatedInput(format!(
            "plain i64 page has {} bytes, {} values need {}",
            buf.len(),
            num_values,
            expected
        )));
    }
    if buf.len() > expected {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after {} plain i64 values",
            buf.len() - expected,
            num_values
        )));
    }

    let mut result = Vec::with_capacity(num_values);
    for chunk in buf.chunks_exact(8) {
        result.push(i64::from_le_bytes(chunk.try_into().unwrap()));
    }
    Ok(result)
}

/// Encode strings as an offset table plus concatenated UTF-8 bytes.
pub fn encode_strings(values: &[String]) -> Vec<u8> {
    let payload_len: usize = values.iter().map(String::len).sum();
    let mut out = Vec::with_capacity((values.len() + 1) * 4 + payload_len);

    let mut offset = 0u32;
    out.extend_from_slice(&offset.to_le_bytes());
    for value in values {
        offset += value.len() as u32;
        out.extend_from_slice(&offset.to_le_bytes());
    }
    for value in values {
        out.extend_from_slice(value.as_bytes());
    }
    out
}

/// Decode a plain string page of exactly `num_values` values.
pub fn decode_strings(buf: &[u8], num_values: usize) -> Result<Vec<String>> {
    let table_len = (num_values + 1) * 4;
    if buf.len() < table_len {
        return Err(ColError::TruncatedInput(format!(
            "string page has {} bytes, offset table alone needs {}",
            buf.len(),
            table_len
        )));
    }

    let mut offsets = Vec::with_capacity(num_values + 1);
    for chunk in buf[..table_len].chunks_exact(4) {
        offsets.push(u32::from_le_bytes(chunk.try_into().unwrap()) as usize);
    }
    let payload = &buf[table_len..];

    if offsets[0] != 0 {
        return Err(ColError::MalformedPage(format!(
            "first string offset is {}, expected 0",
            offsets[0]
        )));
    }
    for pair in offsets.windows(2) {
        if pair[1] < pair[0] {
            return Err(ColError::MalformedPage(
                "non-monotonic string offsets".to_string(),
            ));
        }
    }
    if offsets[num_values] != payload.len() {
        return Err(ColError::MalformedPage(format!(
            "final offset {} does not match payload length {}",
            offsets[num_values],
            payload.len()
        )));
    }

    let mut result = Vec::with_capacity(num_values);
    for i in 0..num_values {
        let bytes = &payload[offsets[i]..offsets[i + 1]];
        let value = std::str::from_utf8(bytes).map_err(|_| {
            ColError::MalformedPage(format!("string {} is not valid UTF-8", i))
        })?;
        result.push(value.to_string());
    }
    Ok(result)
}
