//! Colbase Columnar Storage Engine
//!
//! A self-contained columnar storage format and analytical query engine.
//! Tables are persisted to a single file organized as row groups of column
//! chunks composed of pages; each page is independently encoded and carries
//! summary statistics. Queries (scan, filter, project, aggregate, group-by)
//! run batch-at-a-time with stats-based page skipping.

pub mod encoding;
pub mod query;
pub mod storage;

// Re-export main types
pub use query::{
    AggFunc, AggResult, Batch, ColumnVector, CompareOp, Predicate, QueryExecutor, Scanner,
};
pub use storage::{
    ColumnSchema, ColumnType, EncodingType, FileMetadata, FileReader, FileWriter, PageHeader,
    PageStats, Schema,
};

/// Storage engine error type
#[derive(Debug, thiserror::Error)]
pub enum ColError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too small: {0}")]
    FileTooSmall(String),

    #[error("invalid file magic: {0}")]
    InvalidHeader(String),

    #[error("invalid footer magic: {0}")]
    InvalidFooter(String),

    #[error("bad metadata offset: {0}")]
    BadMetadataOffset(String),

    #[error("corrupt metadata: {0}")]
    CorruptMetadata(String),

    #[error("malformed page: {0}")]
    MalformedPage(String),

    #[error("truncated input: {0}")]
    TruncatedInput(String),

    #[error("varint overflow: {0}")]
    VarintOverflow(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ColError>;
