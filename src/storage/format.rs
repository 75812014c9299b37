//! On-disk format definitions
//!
//! File layout:
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ Header (8 bytes)                               │
//! │   - Magic: 0x454C4F43 "COLE" (u32)             │
//! │   - Version major: u16                         │
//! │   - Version minor: u16                         │
//! ├────────────────────────────────────────────────┤
//! │ Row group 1 column chunks                      │
//! │   per column, in schema order:                 │
//! │   [page header][payload] ...                   │
//! ├────────────────────────────────────────────────┤
//! │ ... row group N column chunks                  │
//! ├────────────────────────────────────────────────┤
//! │ File metadata (variable)                       │
//! │   schema, row group metas, total rows          │
//! ├────────────────────────────────────────────────┤
//! │ Footer (12 bytes)                              │
//! │   - Magic: 0x464F4F54 "FOOT" (u32)             │
//! │   - Metadata offset: u64                       │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are little-endian; strings are UTF-8 with a u32
//! length prefix, never null-terminated.

use std::fmt;

use crate::{ColError, Result};

// ============================================================================
// Constants
// ============================================================================

/// "COLE" in little-endian.
pub const FILE_MAGIC: u32 = 0x454C_4F43;
/// "FOOT" in little-endian.
pub const FOOTER_MAGIC: u32 = 0x464F_4F54;
pub const FORMAT_VERSION_MAJOR: u16 = 1;
pub const FORMAT_VERSION_MINOR: u16 = 0;

pub const FILE_HEADER_SIZE: u64 = 8;
pub const FOOTER_SIZE: u64 = 12;

// ============================================================================
// Schema
// ============================================================================

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColumnType {
    Int32 = 0,
    Int64 = 1,
    String = 2,
}

impl ColumnType {
    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ColumnType::Int32),
            1 => Some(ColumnType::Int64),
            2 => Some(ColumnType::String),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ColumnType::Int32 | ColumnType::Int64)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int32 => "INT32",
            ColumnType::Int64 => "INT64",
            ColumnType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// Page encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EncodingType {
    Plain = 0,
    Rle = 1,
    Delta = 2,
    Dictionary = 3,
}

impl EncodingType {
    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(EncodingType::Plain),
            1 => Some(EncodingType::Rle),
            2 => Some(EncodingType::Delta),
            3 => Some(EncodingType::Dictionary),
            _ => None,
        }
    }

    /// Whether this encoding is legal for the given column type.
    pub fn supports(self, column_type: ColumnType) -> bool {
        match column_type {
            ColumnType::Int32 | ColumnType::Int64 => matches!(
                self,
                EncodingType::Plain | EncodingType::Rle | EncodingType::Delta
            ),
            ColumnType::String => {
                matches!(self, EncodingType::Plain | EncodingType::Dictionary)
            }
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncodingType::Plain => "PLAIN",
            EncodingType::Rle => "RLE",
            EncodingType::Delta => "DELTA",
            EncodingType::Dictionary => "DICTIONARY",
        };
        f.write_str(name)
    }
}

/// Column definition: name, type and the encoding used for its pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub encoding: EncodingType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType, encoding: EncodingType) -> Self {
        Self {
            name: name.into(),
            column_type,
            encoding,
        }
    }
}

/// Ordered column list; column position is the stable on-disk identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Position of `name`, or `None`. Linear scan; schemas are small.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Reject empty or duplicate names and illegal type/encoding pairings.
    pub fn validate(&self) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(ColError::InvalidArgument(format!(
                    "column {} has an empty name",
                    i
                )));
            }
            if !column.encoding.supports(column.column_type) {
                return Err(ColError::InvalidArgument(format!(
                    "encoding {} is not valid for {} column '{}'",
                    column.encoding, column.column_type, column.name
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(ColError::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Page statistics
// ============================================================================

/// Per-page summary used for predicate pushdown. Advisory only: readers
/// must still honor the actual values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStats {
    /// Minimum value, widened to i64. Absent for string pages.
    pub min: Option<i64>,
    /// Maximum value, widened to i64. Absent for string pages.
    pub max: Option<i64>,
    /// Always 0 in this version; the format has no null representation.
    pub null_count: u32,
    /// Approximate distinct count, 0 if unknown. Not serialized.
    pub distinct_count_estimate: u32,
}

impl PageStats {
    pub fn for_i32(values: &[i32]) -> Self {
        let mut min: Option<i64> = None;
        let mut max: Option<i64> = None;
        for &v in values {
            let v = i64::from(v);
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        Self {
            min,
            max,
            null_count: 0,
            distinct_count_estimate: 0,
        }
    }

    pub fn for_i64(values: &[i64]) -> Self {
        let mut min: Option<i64> = None;
        let mut max: Option<i64> = None;
        for &v in values {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        Self {
            min,
            max,
            null_count: 0,
            distinct_count_estimate: 0,
        }
    }

    /// String pages carry no min/max in this version.
    pub fn for_strings(distinct_count_estimate: u32) -> Self {
        Self {
            min: None,
            max: None,
            null_count: 0,
            distinct_count_estimate,
        }
    }
}

// ============================================================================
// Page header
// ============================================================================

const PAGE_HEADER_BASE_LEN: usize = 14;
const PAGE_HEADER_STATS_LEN: usize = 22;

/// Header preceding every page payload, both in the data stream and in the
/// metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    /// Byte size of the values under plain encoding.
    pub uncompressed_size: u32,
    /// Exact byte length of the payload on disk.
    pub compressed_size: u32,
    /// Number of values in the page.
    pub num_values: u32,
    pub encoding: EncodingType,
    pub stats: Option<PageStats>,
}

impl PageHeader {
    /// Serialized size of this header in bytes.
    pub fn encoded_len(&self) -> usize {
        if self.stats.is_some() {
            PAGE_HEADER_BASE_LEN + PAGE_HEADER_STATS_LEN
        } else {
            PAGE_HEADER_BASE_LEN
        }
    }

    pub fn to_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.num_values.to_le_bytes());
        out.push(self.encoding as u8);
        match &self.stats {
            Some(stats) => {
                out.push(1);
                out.push(stats.min.is_some() as u8);
                out.extend_from_slice(&stats.min.unwrap_or(0).to_le_bytes());
                out.push(stats.max.is_some() as u8);
                out.extend_from_slice(&stats.max.unwrap_or(0).to_le_bytes());
                out.extend_from_slice(&stats.null_count.to_le_bytes());
            }
            None => out.push(0),
        }
    }

    /// Parse a header from the front of `buf`; returns the header and the
    /// number of bytes it occupied.
    pub fn from_bytes(buf: &[u8]) -> Result<(Self, usize)> {
        let mut r = ByteReader::new(buf);
        let truncated = || ColError::MalformedPage("truncated page header".to_string());

        let uncompressed_size = r.read_u32().ok_or_else(truncated)?;
        let compressed_size = r.read_u32().ok_or_else(truncated)?;
        let num_values = r.read_u32().ok_or_else(truncated)?;
        let encoding_tag = r.read_u8().ok_or_else(truncated)?;
        let encoding = EncodingType::from_u8(encoding_tag).ok_or_else(|| {
            ColError::MalformedPage(format!("unknown encoding tag {}", encoding_tag))
        })?;
        let has_stats = read_flag(&mut r, "has_stats")?;

        let stats = if has_stats {
            let has_min = read_flag(&mut r, "has_min")?;
            let min = r.read_i64().ok_or_else(truncated)?;
            let has_max = read_flag(&mut r, "has_max")?;
            let max = r.read_i64().ok_or_else(truncated)?;
            let null_count = r.read_u32().ok_or_else(truncated)?;
            Some(PageStats {
                min: has_min.then_some(min),
                max: has_max.then_some(max),
                null_count,
                distinct_count_estimate: 0,
            })
        } else {
            None
        };

        Ok((
            Self {
                uncompressed_size,
                compressed_size,
                num_values,
                encoding,
                stats,
            },
            r.pos(),
        ))
    }
}

fn read_flag(r: &mut ByteReader<'_>, name: &str) -> Result<bool> {
    match r.read_u8() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        Some(v) => Err(ColError::MalformedPage(format!(
            "{} flag byte is {}",
            name, v
        ))),
        None => Err(ColError::MalformedPage("truncated page header".to_string())),
    }
}

// ============================================================================
// Chunk / row group / file metadata
// ============================================================================

/// Location and page list of one column's data within a row group.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMeta {
    /// Absolute file offset of the first page header.
    pub file_offset: u64,
    /// Total byte size of all page headers plus payloads.
    pub total_size: u64,
    pub page_headers: Vec<PageHeader>,
}

/// One horizontal partition of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMeta {
    pub num_rows: u32,
    /// One chunk per schema column, in schema order.
    pub column_chunks: Vec<ColumnChunkMeta>,
}

/// Parsed file metadata; immutable once a file is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub schema: Schema,
    pub row_groups: Vec<RowGroupMeta>,
    pub total_rows: u32,
}

impl FileMetadata {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&(self.schema.columns.len() as u32).to_le_bytes());
        for column in &self.schema.columns {
            out.extend_from_slice(&(column.name.len() as u32).to_le_bytes());
            out.extend_from_slice(column.name.as_bytes());
            out.push(column.column_type as u8);
            out.push(column.encoding as u8);
        }

        out.extend_from_slice(&(self.row_groups.len() as u32).to_le_bytes());
        for row_group in &self.row_groups {
            out.extend_from_slice(&row_group.num_rows.to_le_bytes());
            out.extend_from_slice(&(row_group.column_chunks.len() as u32).to_le_bytes());
            for chunk in &row_group.column_chunks {
                out.extend_from_slice(&chunk.file_offset.to_le_bytes());
                out.extend_from_slice(&chunk.total_size.to_le_bytes());
                out.extend_from_slice(&(chunk.page_headers.len() as u32).to_le_bytes());
                for header in &chunk.page_headers {
                    header.to_bytes(&mut out);
                }
            }
        }

        out.extend_from_slice(&self.total_rows.to_le_bytes());
        out
    }

    /// Parse the metadata region. The whole buffer must be consumed.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(buf);
        let truncated = || ColError::CorruptMetadata("truncated metadata".to_string());

        let num_columns = r.read_u32().ok_or_else(truncated)?;
        let mut columns = Vec::with_capacity(num_columns.min(4096) as usize);
        for _ in 0..num_columns {
            let name_len = r.read_u32().ok_or_else(truncated)? as usize;
            let name_bytes = r.read_bytes(name_len).ok_or_else(truncated)?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| ColError::CorruptMetadata("column name is not valid UTF-8".to_string()))?
                .to_string();
            let type_tag = r.read_u8().ok_or_else(truncated)?;
            let column_type = ColumnType::from_u8(type_tag).ok_or_else(|| {
                ColError::CorruptMetadata(format!("unknown column type tag {}", type_tag))
            })?;
            let encoding_tag = r.read_u8().ok_or_else(truncated)?;
            let encoding = EncodingType::from_u8(encoding_tag).ok_or_else(|| {
                ColError::CorruptMetadata(format!("unknown encoding tag {}", encoding_tag))
            })?;
            columns.push(ColumnSchema {
                name,
                column_type,
                encoding,
            });
        }

        let num_row_groups = r.read_u32().ok_or_else(truncated)?;
        let mut row_groups = Vec::with_capacity(num_row_groups.min(4096) as usize);
        for _ in 0..num_row_groups {
            let num_rows = r.read_u32().ok_or_else(truncated)?;
            let chunk_count = r.read_u32().ok_or_else(truncated)?;
            let mut column_chunks = Vec::with_capacity(chunk_count.min(4096) as usize);
            for _ in 0..chunk_count {
                let file_offset = r.read_u64().ok_or_else(truncated)?;
                let total_size = r.read_u64().ok_or_else(truncated)?;
                let num_pages = r.read_u32().ok_or_else(truncated)?;
                let mut page_headers = Vec::with_capacity(num_pages.min(4096) as usize);
                for _ in 0..num_pages {
                    let (header, consumed) =
                        PageHeader::from_bytes(r.rest()).map_err(|e| {
                            ColError::CorruptMetadata(format!("bad page header: {}", e))
                        })?;
                    r.skip(consumed);
                    page_headers.push(header);
                }
                column_chunks.push(ColumnChunkMeta {
                    file_offset,
                    total_size,
                    page_headers,
                });
            }
            row_groups.push(RowGroupMeta {
                num_rows,
                column_chunks,
            });
        }

        let total_rows = r.read_u32().ok_or_else(truncated)?;
        if r.remaining() != 0 {
            return Err(ColError::CorruptMetadata(format!(
                "{} unconsumed bytes after metadata",
                r.remaining()
            )));
        }

        Ok(Self {
            schema: Schema { columns },
            row_groups,
            total_rows,
        })
    }

    /// Structural validation run once at open, so later column reads can
    /// trust the metadata.
    pub fn validate(&self, metadata_offset: u64) -> Result<()> {
        self.schema
            .validate()
            .map_err(|e| ColError::CorruptMetadata(e.to_string()))?;

        let mut row_sum: u64 = 0;
        for (rg_idx, row_group) in self.row_groups.iter().enumerate() {
            row_sum += u64::from(row_group.num_rows);
            if row_group.column_chunks.len() != self.schema.columns.len() {
                return Err(ColError::CorruptMetadata(format!(
                    "row group {} has {} chunks for {} columns",
                    rg_idx,
                    row_group.column_chunks.len(),
                    self.schema.columns.len()
                )));
            }
            for (col_idx, chunk) in row_group.column_chunks.iter().enumerate() {
                let end = chunk.file_offset.checked_add(chunk.total_size).ok_or_else(|| {
                    ColError::CorruptMetadata(format!(
                        "chunk ({}, {}) offset overflows",
                        rg_idx, col_idx
                    ))
                })?;
                if end > metadata_offset {
                    return Err(ColError::CorruptMetadata(format!(
                        "chunk ({}, {}) extends to {} past metadata at {}",
                        rg_idx, col_idx, end, metadata_offset
                    )));
                }
                let mut byte_sum: u64 = 0;
                let mut value_sum: u64 = 0;
                for header in &chunk.page_headers {
                    byte_sum += header.encoded_len() as u64 + u64::from(header.compressed_size);
                    value_sum += u64::from(header.num_values);
                }
                if byte_sum != chunk.total_size {
                    return Err(ColError::CorruptMetadata(format!(
                        "chunk ({}, {}) pages sum to {} bytes, chunk claims {}",
                        rg_idx, col_idx, byte_sum, chunk.total_size
                    )));
                }
                if value_sum != u64::from(row_group.num_rows) {
                    return Err(ColError::CorruptMetadata(format!(
                        "chunk ({}, {}) pages hold {} values, row group claims {}",
                        rg_idx, col_idx, value_sum, row_group.num_rows
                    )));
                }
            }
        }
        if row_sum != u64::from(self.total_rows) {
            return Err(ColError::CorruptMetadata(format!(
                "row groups sum to {} rows, metadata claims {}",
                row_sum, self.total_rows
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

/// The 8-byte file header.
pub(crate) fn encode_file_header() -> [u8; FILE_HEADER_SIZE as usize] {
    let mut buf = [0u8; FILE_HEADER_SIZE as usize];
    buf[0..4].copy_from_slice(&FILE_MAGIC.to_le_bytes());
    buf[4..6].copy_from_slice(&FORMAT_VERSION_MAJOR.to_le_bytes());
    buf[6..8].copy_from_slice(&FORMAT_VERSION_MINOR.to_le_bytes());
    buf
}

/// Bounds-checked cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn skip(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let value = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(value)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        let bytes = self.read_bytes(8)?;
        Some(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        let bytes = self.read_bytes(8)?;
        Some(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Some(bytes)
    }
}
