//! Vectorized query execution
//!
//! Batches stream out of the [`Scanner`] one row group at a time; the
//! [`QueryExecutor`] layers projection, filters, aggregation and group-by
//! on top of it.

pub mod batch;
pub mod executor;
pub mod predicate;
pub mod scanner;

pub use batch::{Batch, ColumnVector};
pub use executor::{AggFunc, AggResult, QueryExecutor};
pub use predicate::{CompareOp, Predicate};
pub use scanner::{Scanner, DEFAULT_BATCH_SIZE};
