//! Columnar file reader
//!
//! `FileReader::open` validates the footer, header and metadata up front so
//! that later column reads can trust the parsed metadata; a corrupt file is
//! rejected at open rather than partially read. Column reads seek to the
//! chunk, walk its pages and decode each with exactly the byte span its
//! header declares.

use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::encoding::{delta, dictionary, plain, rle};
use crate::storage::format::{
    ColumnChunkMeta, ColumnType, EncodingType, FileMetadata, PageHeader, Schema, FILE_MAGIC,
    FOOTER_MAGIC, FOOTER_SIZE,
};
use crate::{ColError, Result};

/// Reader over a closed columnar file.
///
/// Holds its own file handle; concurrent reads through one reader are not
/// supported, but independent readers over the same file are.
pub struct FileReader {
    file: RefCell<File>,
    metadata: FileMetadata,
}

impl FileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        if file_len < FOOTER_SIZE {
            return Err(ColError::FileTooSmall(format!(
                "{} is {} bytes, minimum 12",
                path.display(),
                file_len
            )));
        }

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;
        let footer_magic = u32::from_le_bytes(footer[0..4].try_into().unwrap());
        if footer_magic != FOOTER_MAGIC {
            return Err(ColError::InvalidFooter(format!(
                "found {:#010x}, expected {:#010x}",
                footer_magic, FOOTER_MAGIC
            )));
        }
        let metadata_offset = u64::from_le_bytes(footer[4..12].try_into().unwrap());
        if metadata_offset == 0 || metadata_offset > file_len - FOOTER_SIZE {
            return Err(ColError::BadMetadataOffset(format!(
                "offset {} in a {}-byte file",
                metadata_offset, file_len
            )));
        }

        file.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        let file_magic = u32::from_le_bytes(header[0..4].try_into().unwrap());
        if file_magic != FILE_MAGIC {
            return Err(ColError::InvalidHeader(format!(
                "found {:#010x}, expected {:#010x}",
                file_magic, FILE_MAGIC
            )));
        }
        let version_major = u16::from_le_bytes(header[4..6].try_into().unwrap());
        let version_minor = u16::from_le_bytes(header[6..8].try_into().unwrap());

        let metadata_len = (file_len - FOOTER_SIZE - metadata_offset) as usize;
        file.seek(SeekFrom::Start(metadata_offset))?;
        let mut metadata_buf = vec![0u8; metadata_len];
        file.read_exact(&mut metadata_buf)?;
        let metadata = FileMetadata::from_bytes(&metadata_buf)?;
        metadata.validate(metadata_offset)?;

        log::debug!(
            "opened {} (v{}.{}): {} rows, {} row groups, {} columns",
            path.display(),
            version_major,
            version_minor,
            metadata.total_rows,
            metadata.row_groups.len(),
            metadata.schema.columns.len()
        );

        Ok(Self {
            file: RefCell::new(file),
            metadata,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.metadata.schema
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Read one i32 column chunk, decoding all its pages in order.
    pub fn read_i32_column(&self, row_group_idx: usize, col_idx: usize) -> Result<Vec<i32>> {
        let chunk = self.chunk(row_group_idx, col_idx, ColumnType::Int32)?;
        let buf = self.read_chunk(chunk)?;

        let mut values = Vec::new();
        for (header, payload) in split_pages(&buf)? {
            let page = match header.encoding {
                EncodingType::Plain => plain::decode_i32(payload, header.num_values as usize)?,
                EncodingType::Rle => rle::decode_i32(payload, header.num_values as usize)?,
                EncodingType::Delta => delta::decode_i32(payload, header.num_values as usize)?,
                EncodingType::Dictionary => {
                    return Err(ColError::MalformedPage(
                        "dictionary page in an int32 chunk".to_string(),
                    ))
                }
            };
            values.extend(page);
        }
        Ok(values)
    }

    /// Read one i64 column chunk, decoding all its pages in order.
    pub fn read_i64_column(&self, row_group_idx: usize, col_idx: usize) -> Result<Vec<i64>> {
        let chunk = self.chunk(row_group_idx, col_idx, ColumnType::Int64)?;
        let buf = self.read_chunk(chunk)?;

        let mut values = Vec::new();
        for (header, payload) in split_pages(&buf)? {
            let page = match header.encoding {
                EncodingType::Plain => plain::decode_i64(payload, header.num_values as usize)?,
                EncodingType::Rle => rle::decode_i64(payload, header.num_values as usize)?,
                EncodingType::Delta => delta::decode_i64(payload, header.num_values as usize)?,
                EncodingType::Dictionary => {
                    return Err(ColError::MalformedPage(
                        "dictionary page in an int64 chunk".to_string(),
                    ))
                }
            };
            values.extend(page);
        }
        Ok(values)
    }

    /// Read one string column chunk, decoding all its pages in order.
    pub fn read_string_column(
        &self,
        row_group_idx: usize,
        col_idx: usize,
    ) -> Result<Vec<String>> {
        let chunk = self.chunk(row_group_idx, col_idx, ColumnType::String)?;
        let buf = self.read_chunk(chunk)?;

        let mut values = Vec::new();
        for (header, payload) in split_pages(&buf)? {
            let page = match header.encoding {
                EncodingType::Plain => {
                    plain::decode_strings(payload, header.num_values as usize)?
                }
                EncodingType::Dictionary => {
                    dictionary::decode(payload, header.num_values as usize)?
                }
                other => {
                    return Err(ColError::MalformedPage(format!(
                        "{} page in a string chunk",
                        other
                    )))
                }
            };
            values.extend(page);
        }
        Ok(values)
    }

    fn chunk(
        &self,
        row_group_idx: usize,
        col_idx: usize,
        expected: ColumnType,
    ) -> Result<&ColumnChunkMeta> {
        let row_group = self.metadata.row_groups.get(row_group_idx).ok_or_else(|| {
            ColError::InvalidArgument(format!(
                "row group {} out of range ({} row groups)",
                row_group_idx,
                self.metadata.row_groups.len()
            ))
        })?;
        let column = self.metadata.schema.columns.get(col_idx).ok_or_else(|| {
            ColError::InvalidArgument(format!(
                "column index {} out of range ({} columns)",
                col_idx,
                self.metadata.schema.columns.len()
            ))
        })?;
        if column.column_type != expected {
            return Err(ColError::TypeMismatch(format!(
                "column '{}' is {}, not {}",
                column.name, column.column_type, expected
            )));
        }
        // chunk count per row group was validated at open
        Ok(&row_group.column_chunks[col_idx])
    }

    fn read_chunk(&self, chunk: &ColumnChunkMeta) -> Result<Vec<u8>> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(chunk.file_offset))?;
        let mut buf = vec![0u8; chunk.total_size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Split a chunk buffer into `[header][payload]` pages.
fn split_pages(buf: &[u8]) -> Result<Vec<(PageHeader, &[u8])>> {
    let mut pages = Vec::new();
    let mut pos = 0;
    while pos < buf.len() {
        let (header, header_len) = PageHeader::from_bytes(&buf[pos..])?;
        let payload_start = pos + header_len;
        let payload_end = payload_start + header.compressed_size as usize;
        if payload_end > buf.len() {
            return Err(ColError::MalformedPage(format!(
                "page payload of {} bytes overruns the chunk",
                header.compressed_size
            )));
        }
        pages.push((header, &buf[payload_start..payload_end]));
        pos = payload_end;
    }
    Ok(pages)
}
