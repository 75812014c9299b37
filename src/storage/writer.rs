//! Columnar file writer
//!
//! A `FileWriter` owns its output file from creation until `close`. Column
//! values accumulate in typed staging buffers; `flush_row_group` encodes
//! one page per column chunk and appends it to the file, and `close` writes
//! the metadata table and footer. Files are immutable after close.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::encoding::{delta, dictionary, plain, rle};
use crate::storage::format::{
    encode_file_header, ColumnChunkMeta, ColumnSchema, ColumnType, EncodingType, FileMetadata,
    PageHeader, PageStats, RowGroupMeta, Schema, FILE_HEADER_SIZE, FOOTER_MAGIC,
};
use crate::{ColError, Result};

/// Per-column staging buffer for the current row group.
#[derive(Debug)]
enum StagedColumn {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    String(Vec<String>),
}

impl StagedColumn {
    fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int32 => StagedColumn::Int32(Vec::new()),
            ColumnType::Int64 => StagedColumn::Int64(Vec::new()),
            ColumnType::String => StagedColumn::String(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            StagedColumn::Int32(v) => v.len(),
            StagedColumn::Int64(v) => v.len(),
            StagedColumn::String(v) => v.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            StagedColumn::Int32(v) => v.clear(),
            StagedColumn::Int64(v) => v.clear(),
            StagedColumn::String(v) => v.clear(),
        }
    }
}

/// Writer for the columnar file format.
pub struct FileWriter {
    file: BufWriter<File>,
    schema: Schema,
    staged: Vec<StagedColumn>,
    row_groups: Vec<RowGroupMeta>,
    offset: u64,
    total_rows: u64,
    closed: bool,
}

impl FileWriter {
    /// Create (or truncate) `path` and write the file header.
    pub fn create<P: AsRef<Path>>(path: P, schema: Schema) -> Result<Self> {
        schema.validate()?;

        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&encode_file_header())?;

        let staged = schema
            .columns
            .iter()
            .map(|c| StagedColumn::new(c.column_type))
            .collect();

        Ok(Self {
            file,
            schema,
            staged,
            row_groups: Vec::new(),
            offset: FILE_HEADER_SIZE,
            total_rows: 0,
            closed: false,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Append i32 values to a column's staging buffer.
    pub fn write_i32_column(&mut self, col_idx: usize, values: &[i32]) -> Result<()> {
        self.check_column(col_idx, ColumnType::Int32)?;
        if let StagedColumn::Int32(buf) = &mut self.staged[col_idx] {
            buf.extend_from_slice(values);
        }
        Ok(())
    }

    /// Append i64 values to a column's staging buffer.
    pub fn write_i64_column(&mut self, col_idx: usize, values: &[i64]) -> Result<()> {
        self.check_column(col_idx, ColumnType::Int64)?;
        if let StagedColumn::Int64(buf) = &mut self.staged[col_idx] {
            buf.extend_from_slice(values);
        }
        Ok(())
    }

    /// Append string values to a column's staging buffer.
    pub fn write_string_column(&mut self, col_idx: usize, values: &[String]) -> Result<()> {
        self.check_column(col_idx, ColumnType::String)?;
        if let StagedColumn::String(buf) = &mut self.staged[col_idx] {
            buf.extend(values.iter().cloned());
        }
        Ok(())
    }

    fn check_column(&self, col_idx: usize, expected: ColumnType) -> Result<()> {
        if self.closed {
            return Err(ColError::InvalidArgument("writer is closed".to_string()));
        }
        let column = self.schema.columns.get(col_idx).ok_or_else(|| {
            ColError::InvalidArgument(format!(
                "column index {} out of range ({} columns)",
                col_idx,
                self.schema.columns.len()
            ))
        })?;
        if column.column_type != expected {
            return Err(ColError::TypeMismatch(format!(
                "column '{}' is {}, not {}",
                column.name, column.column_type, expected
            )));
        }
        Ok(())
    }

    /// Encode the staged values as one row group and append it to the file.
    ///
    /// Every column must hold the same number of staged values. A flush
    /// with nothing staged is a no-op.
    pub fn flush_row_group(&mut self) -> Result<()> {
        if self.closed {
            return Err(ColError::InvalidArgument("writer is closed".to_string()));
        }
        if self.staged.iter().all(|c| c.len() == 0) {
            return Ok(());
        }

        let num_rows = self.staged.first().map_or(0, StagedColumn::len);
        for (column, staged) in self.schema.columns.iter().zip(&self.staged) {
            if staged.len() != num_rows {
                return Err(ColError::ShapeMismatch(format!(
                    "column '{}' has {} values, row group has {}",
                    column.name,
                    staged.len(),
                    num_rows
                )));
            }
        }
        if num_rows > u32::MAX as usize {
            return Err(ColError::InvalidArgument(format!(
                "row group of {} rows exceeds the format limit",
                num_rows
            )));
        }

        let mut column_chunks = Vec::with_capacity(self.schema.columns.len());
        for (column, staged) in self.schema.columns.iter().zip(&self.staged) {
            let (payload, uncompressed_size, stats) = encode_page(column, staged)?;
            let header = PageHeader {
                uncompressed_size,
                compressed_size: payload.len() as u32,
                num_values: num_rows as u32,
                encoding: column.encoding,
                stats: Some(stats),
            };

            let mut bytes = Vec::with_capacity(header.encoded_len() + payload.len());
            header.to_bytes(&mut bytes);
            bytes.extend_from_slice(&payload);
            self.file.write_all(&bytes)?;

            column_chunks.push(ColumnChunkMeta {
                file_offset: self.offset,
                total_size: bytes.len() as u64,
                page_headers: vec![header],
            });
            self.offset += bytes.len() as u64;
        }

        self.row_groups.push(RowGroupMeta {
            num_rows: num_rows as u32,
            column_chunks,
        });
        self.total_rows += num_rows as u64;
        for staged in &mut self.staged {
            staged.clear();
        }

        log::debug!(
            "flushed row group {} ({} rows)",
            self.row_groups.len() - 1,
            num_rows
        );
        Ok(())
    }

    /// Flush any staged rows, then write the metadata table and footer.
    /// Calling close twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_row_group()?;

        if self.total_rows > u64::from(u32::MAX) {
            return Err(ColError::InvalidArgument(format!(
                "{} total rows exceeds the format limit",
                self.total_rows
            )));
        }

        let metadata_offset = self.offset;
        let metadata = FileMetadata {
            schema: self.schema.clone(),
            row_groups: std::mem::take(&mut self.row_groups),
            total_rows: self.total_rows as u32,
        };
        self.file.write_all(&metadata.to_bytes())?;
        self.file.write_all(&FOOTER_MAGIC.to_le_bytes())?;
        self.file.write_all(&metadata_offset.to_le_bytes())?;
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        self.closed = true;

        log::debug!(
            "closed file: {} rows in {} row groups, metadata at {}",
            metadata.total_rows,
            metadata.row_groups.len(),
            metadata_offset
        );
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::error!("close on drop failed: {}", e);
            }
        }
    }
}

/// Encode one column's staged values as a single page payload.
///
/// Returns the payload, its plain-encoded size, and the page stats.
fn encode_page(
    column: &ColumnSchema,
    staged: &StagedColumn,
) -> Result<(Vec<u8>, u32, PageStats)> {
    match (staged, column.encoding) {
        (StagedColumn::Int32(values), EncodingType::Plain) => Ok((
            plain::encode_i32(values),
            (values.len() * 4) as u32,
            PageStats::for_i32(values),
        )),
        (StagedColumn::Int32(values), EncodingType::Rle) => Ok((
            rle::encode_i32(values),
            (values.len() * 4) as u32,
            PageStats::for_i32(values),
        )),
        (StagedColumn::Int32(values), EncodingType::Delta) => Ok((
            delta::encode_i32(values),
            (values.len() * 4) as u32,
            PageStats::for_i32(values),
        )),
        (StagedColumn::Int64(values), EncodingType::Plain) => Ok((
            plain::encode_i64(values),
            (values.len() * 8) as u32,
            PageStats::for_i64(values),
        )),
        (StagedColumn::Int64(values), EncodingType::Rle) => Ok((
            rle::encode_i64(values),
            (values.len() * 8) as u32,
            PageStats::for_i64(values),
        )),
        (StagedColumn::Int64(values), EncodingType::Delta) => Ok((
            delta::encode_i64(values),
            (values.len() * 8) as u32,
            PageStats::for_i64(values),
        )),
        (StagedColumn::String(values), EncodingType::Plain) => {
            let payload = plain::encode_strings(values);
            let uncompressed_size = payload.len() as u32;
            Ok((payload, uncompressed_size, PageStats::for_strings(0)))
        }
        (StagedColumn::String(values), EncodingType::Dictionary) => {
            let uncompressed_size = plain_string_size(values);
            let (payload, dict_size) = dictionary::encode(values);
            Ok((payload, uncompressed_size, PageStats::for_strings(dict_size)))
        }
        _ => Err(ColError::InvalidArgument(format!(
            "encoding {} is not valid for column '{}'",
            column.encoding, column.name
        ))),
    }
}

fn plain_string_size(values: &[String]) -> u32 {
    let payload: usize = values.iter().map(String::len).sum();
    ((values.len() + 1) * 4 + payload) as u32
}
