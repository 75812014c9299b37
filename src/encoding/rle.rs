//! Run-length encoding for integer pages
//!
//! Layout: `[num_runs: varint u32][(run_length: varint u32, value: zigzag varint)]...`
//! The encoder emits maximal runs. The decoder rejects zero-length runs,
//! value counts that disagree with the declared count, and trailing bytes.

use crate::encoding::varint;
use crate::{ColError, Result};

/// Encode an i32 slice as run-length pairs. An empty input encodes to an
/// empty payload.
pub fn encode_i32(values: &[i32]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut runs: Vec<(u32, i32)> = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let current = values[i];
        let mut run_length = 1usize;
        while i + run_length < values.len() && values[i + run_length] == current {
            run_length += 1;
        }
        runs.push((run_length as u32, current));
        i += run_length;
    }

    let mut out = Vec::with_capacity(runs.len() * 10 + varint::MAX_VARINT32_BYTES);
    varint::encode_u32(runs.len() as u32, &mut out);
    for (run_length, value) in runs {
        varint::encode_u32(run_length, &mut out);
        varint::encode_i32(value, &mut out);
    }
    out
}

/// Encode an i64 slice as run-length pairs.
pub fn encode_i64(values: &[i64]) -> Vec<u8> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut runs: Vec<(u32, i64)> = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let current = values[i];
        let mut run_length = 1usize;
        while i + run_length < values.len() && values[i + run_length] == current {
            run_length += 1;
        }
        runs.push((run_length as u32, current));
        i += run_length;
    }

    let mut out = Vec::with_capacity(runs.len() * 15 + varint::MAX_VARINT32_BYTES);
    varint::encode_u32(runs.len() as u32, &mut out);
    for (run_length, value) in runs {
        varint::encode_u32(run_length, &mut out);
        varint::encode_i64(value, &mut out);
    }
    out
}

/// Decode a run-length i32 page. `num_values` is the count declared by the
/// page header; the reconstructed count must match it exactly.
pub fn decode_i32(buf: &[u8], num_values: usize) -> Result<Vec<i32>> {
    if num_values == 0 && buf.is_empty() {
        return Ok(Vec::new());
    }

    let mut pos = 0;
    let (num_runs, consumed) = varint::decode_u32(&buf[pos..])?;
    pos += consumed;

    let mut result = Vec::with_capacity(num_values);
    for _ in 0..num_runs {
        let (run_length, consumed) = varint::decode_u32(&buf[pos..])?;
        pos += consumed;
        let (value, consumed) = varint::decode_i32(&buf[pos..])?;
        pos += consumed;

        if run_length == 0 {
            return Err(ColError::MalformedPage("zero-length run".to_string()));
        }
        if result.len() + run_length as usize > num_values {
            return Err(ColError::MalformedPage(format!(
                "runs produce more than {} declared values",
                num_values
            )));
        }
        result.resize(result.len() + run_length as usize, value);
    }

    if result.len() != num_values {
        return Err(ColError::MalformedPage(format!(
            "runs produced {} values, header declared {}",
            result.len(),
            num_values
        )));
    }
    if pos != buf.len() {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after the last run",
            buf.len() - pos
        )));
    }
    Ok(result)
}

/// Decode a run-length i64 page.
pub fn decode_i64(buf: &[u8], num_values: usize) -> Result<Vec<i64>> {
    if num_values == 0 && buf.is_empty() {
        return Ok(Vec::new());
    }

    let mut pos = 0;
    let (num_runs, consumed) = varint::decode_u32(&buf[pos..])?;
    pos += consumed;

    let mut result = Vec::with_capacity(num_values);
    for _ in 0..num_runs {
        let (run_length, consumed) = varint::decode_u32(&buf[pos..])?;
        pos += consumed;
        let (value, consumed) = varint::decode_i64(&buf[pos..])?;
        pos += consumed;

        if run_length == 0 {
            return Err(ColError::MalformedPage("zero-length run".to_string()));
        }
        if result.len() + run_length as usize > num_values {
            return Err(ColError::MalformedPage(format!(
                "runs produce more than {} declared values",
                num_values
            )));
        }
        result.resize(result.len() + run_length as usize, value);
    }

    if result.len() != num_values {
        return Err(ColError::MalformedPage(format!(
            "runs produced {} values, header declared {}",
            result.len(),
            num_values
        )));
    }
    if pos != buf.len() {
        return Err(ColError::MalformedPage(format!(
            "{} trailing bytes after the last run",
            buf.len() - pos
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::varint;

    #[test]
    fn test_i32_roundtrip() {
        let values = vec![5, 5, 5, 5, 10, 10, 3, 3, 3, 3, 3];
        let encoded = encode_i32(&values);
        let decoded = decode_i32(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_i64_roundtrip() {
        let values = vec![100i64, 100, 100, 200, 200, 300];
        let encoded = encode_i64(&values);
        let decoded = decode_i64(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_no_repeats() {
        let values: Vec<i32> = (0..100).collect();
        let encoded = encode_i32(&values);
        let decoded = decode_i32(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_negative_values() {
        let values = vec![-5i64, -5, -5, 7, 7, i64::MIN, i64::MAX];
        let encoded = encode_i64(&values);
        let decoded = decode_i64(&encoded, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_empty() {
        assert!(encode_i32(&[]).is_empty());
        assert_eq!(decode_i32(&[], 0).unwrap(), Vec::<i32>::new());
        assert!(encode_i64(&[]).is_empty());
        assert_eq!(decode_i64(&[], 0).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_single_value() {
        let encoded = encode_i32(&[42]);
        assert_eq!(decode_i32(&encoded, 1).unwrap(), vec![42]);
    }

    #[test]
    fn test_zero_run_length_rejected() {
        // num_runs = 1, run_length = 0, value = 0
        let mut buf = Vec::new();
        varint::encode_u32(1, &mut buf);
        varint::encode_u32(0, &mut buf);
        varint::encode_i32(0, &mut buf);
        assert!(matches!(
            decode_i32(&buf, 0),
            Err(ColError::MalformedPage(_))
        ));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let encoded = encode_i32(&[1, 1, 2]);
        assert!(matches!(
            decode_i32(&encoded, 2),
            Err(ColError::MalformedPage(_))
        ));
        assert!(matches!(
            decode_i32(&encoded, 4),
            Err(ColError::MalformedPage(_))
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode_i32(&[7, 7, 7]);
        encoded.push(0);
        assert!(matches!(
            decode_i32(&encoded, 3),
            Err(ColError::MalformedPage(_))
        ));
    }

    #[test]
    fn test_truncated_run_rejected() {
        let encoded = encode_i64(&[1, 2, 3]);
        assert!(decode_i64(&encoded[..encoded.len() - 1], 3).is_err());
    }
}
