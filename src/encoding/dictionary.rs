//! Dictionary encoding for string pages
//!
//! Layout: `[dict_size: u32][(entry_len: u32, bytes)...][indices]` where the
//! index block is the i32 run-length codec applied to insertion-ordered
//! dictionary indices. The decoder rebuilds the entry table and rejects any
//! index outside it.

use std::collections::HashMap;

use crate::encoding::rle;
use crate::{ColError, Result};

/// Encode strings against an insertion-ordered dictionary.
///
/// Returns the payload and the number of distinct entries, which the writer
/// records as the page's distinct-count estimate.
pub fn encode(values: &[String]) -> (Vec<u8>, u32) {
    let mut dict: HashMap<&str, u32> = HashMap::new();
    let mut entries: Vec<&str> = Vec::new();
    let mut indices: Vec<i32> = Vec::with_capacity(values.len());

    for value in values {
        let index = match dict.get(value.as_str()) {
            Some(&index) => index,
            None => {
                let index = entries.len() as u32;
                dict.insert(value, index);
                entries.push(value);
                index
            }
        };
        indices.push(index as i32);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in &entries {
        out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        out.extend_from_slice(entry.as_bytes());
    }
    out.extend_from_slice(&rle::encode_i32(&indices));

    let dict_size = entries.len() as u32;
    (out, dict_size)
}

/// Decode a dictionary-encoded string page of exactly `num_values` values.
pub fn decode(buf: &[u8], num_values: usize) -> Result<Vec<String>> {
    if buf.len() < 4 {
        return Err(ColError::TruncatedInput(
            "dictionary page shorter than its size field".to_string(),
        ));
    }
    let dict_size = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
    let mut pos = 4usize;

    // each entry carries at least a 4-byte length prefix
    if dict_size > (buf.len() - pos) / 4 {
        return Err(ColError::MalformedPage(format!(
            "dictionary claims {} entries but the page holds {} bytes",
            dict_size,
            buf.len()
        )));
    }

    let mut dictionary: Vec<String> = Vec::with_capacity(dict_size);
    for i in 0..dict_size {
        if pos + 4 > buf.len() {
            return Err(ColError::TruncatedInput(format!(
                "dictionary entry {} has no length prefix",
                i
            )));
        }
        let len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        if pos + len > buf.len() {
            return Err(ColError::MalformedPage(format!(
                "dictionary entry {} overruns the page",
                i
            )));
        }
        let entry = std::str::from_utf8(&buf[pos..pos + len]).map_err(|_| {
            ColError::MalformedPage(format!("dictionary entry {} is not valid UTF-8", i))
        })?;
        dictionary.push(entry.to_string());
        pos += len;
    }

    let indices = rle::decode_i32(&buf[pos..], num_values)?;

    let mut result = Vec::with_capacity(num_values);
    for index in indices {
        if index < 0 || index as usize >= dictionary.len() {
            return Err(ColError::MalformedPage(format!(
                "dictionary index {} out of range ({} entries)",
                index,
                dictionary.len()
            )));
        }
        result.push(dictionary[index as usize].clone());
    }
    Ok(result)
}
