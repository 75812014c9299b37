//! Batch scanner with predicate pushdown
//!
//! Streams one batch per row group, in file order. Before a row group is
//! materialized, each filter is checked against its column's page stats;
//! when the stats prove a filter unsatisfiable for every page of the chunk
//! the whole row group is skipped without reading any column. Surviving row
//! groups are materialized, filtered row-wise with an AND selection mask,
//! and gathered in place.

use crate::query::batch::{Batch, ColumnVector};
use crate::query::predicate::Predicate;
use crate::storage::{ColumnType, FileReader};
use crate::{ColError, Result};

/// Advisory batch size; scans currently emit one batch per row group.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Streaming scan over projected columns of a file.
pub struct Scanner<'a> {
    reader: &'a FileReader,
    column_names: Vec<String>,
    column_indices: Vec<usize>,
    filters: Vec<Predicate>,
    #[allow(dead_code)]
    batch_size: usize,
    current_row_group: usize,
}

impl<'a> Scanner<'a> {
    /// Build a scanner over `columns`, in the given order.
    pub fn new(reader: &'a FileReader, columns: &[String]) -> Result<Self> {
        let schema = reader.schema();
        let mut column_indices = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = schema.column_index(name).ok_or_else(|| {
                ColError::InvalidArgument(format!("unknown column '{}'", name))
            })?;
            column_indices.push(idx);
        }
        Ok(Self {
            reader,
            column_names: columns.to_vec(),
            column_indices,
            filters: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            current_row_group: 0,
        })
    }

    /// Override the advisory batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Add an AND-conjoined filter. The filter column must exist and be an
    /// integer column; it does not need to be projected.
    pub fn add_filter(&mut self, predicate: Predicate) -> Result<()> {
        let schema = self.reader.schema();
        let idx = schema.column_index(&predicate.column).ok_or_else(|| {
            ColError::InvalidArgument(format!(
                "unknown filter column '{}'",
                predicate.column
            ))
        })?;
        if !schema.columns[idx].column_type.is_integer() {
            return Err(ColError::InvalidArgument(format!(
                "filter column '{}' is {}, filters need an integer column",
                predicate.column, schema.columns[idx].column_type
            )));
        }
        self.filters.push(predicate);
        Ok(())
    }

    /// Whether another batch remains, advancing past row groups that page
    /// stats prove empty under the filters.
    pub fn has_next(&mut self) -> bool {
        self.skip_unsatisfiable();
        self.current_row_group < self.reader.metadata().row_groups.len()
    }

    /// Materialize the next surviving row group as a batch.
    pub fn next(&mut self) -> Result<Batch> {
        self.skip_unsatisfiable();
        if self.current_row_group >= self.reader.metadata().row_groups.len() {
            return Err(ColError::InvalidArgument(
                "scanner is exhausted".to_string(),
            ));
        }
        let rg_idx = self.current_row_group;
        self.current_row_group += 1;

        let num_rows = self.reader.metadata().row_groups[rg_idx].num_rows as usize;
        let mut columns = Vec::with_capacity(self.column_indices.len());
        for &col_idx in &self.column_indices {
            columns.push(self.read_column(rg_idx, col_idx)?);
        }
        let mut batch = Batch {
            column_names: self.column_names.clone(),
            columns,
            num_rows,
        };
        if !self.filters.is_empty() {
            self.apply_filters(rg_idx, &mut batch)?;
        }
        Ok(batch)
    }

    fn skip_unsatisfiable(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        let num_row_groups = self.reader.metadata().row_groups.len();
        while self.current_row_group < num_row_groups
            && self.row_group_skipped(self.current_row_group)
        {
            log::debug!(
                "row group {} skipped by page stats",
                self.current_row_group
            );
            self.current_row_group += 1;
        }
    }

    /// A row group is skipped when any filter is provably unsatisfiable on
    /// every page of its column chunk.
    fn row_group_skipped(&self, rg_idx: usize) -> bool {
        let metadata = self.reader.metadata();
        let row_group = &metadata.row_groups[rg_idx];
        for filter in &self.filters {
            let col_idx = match metadata.schema.column_index(&filter.column) {
                Some(idx) => idx,
                None => continue,
            };
            let pages = &row_group.column_chunks[col_idx].page_headers;
            if !pages.is_empty()
                && pages.iter().all(|header| {
                    header
                        .stats
                        .as_ref()
                        .map_or(false, |stats| filter.can_skip_page(stats))
                })
            {
                return true;
            }
        }
        false
    }

    fn read_column(&self, rg_idx: usize, col_idx: usize) -> Result<ColumnVector> {
        match self.reader.schema().columns[col_idx].column_type {
            ColumnType::Int32 => Ok(ColumnVector::Int32(
                self.reader.read_i32_column(rg_idx, col_idx)?,
            )),
            ColumnType::Int64 => Ok(ColumnVector::Int64(
                self.reader.read_i64_column(rg_idx, col_idx)?,
            )),
            ColumnType::String => Ok(ColumnVector::String(
                self.reader.read_string_column(rg_idx, col_idx)?,
            )),
        }
    }

    fn apply_filters(&self, rg_idx: usize, batch: &mut Batch) -> Result<()> {
        let mut mask = vec![true; batch.num_rows];
        for filter in &self.filters {
            let values = self.filter_values(rg_idx, filter, batch)?;
            for (keep, &value) in mask.iter_mut().zip(&values) {
                if *keep && !filter.matches_i64(value) {
                    *keep = false;
                }
            }
        }
        for column in &mut batch.columns {
            column.gather(&mask);
        }
        batch.num_rows = mask.iter().filter(|&&keep| keep).count();
        Ok(())
    }

    /// Values of a filter column widened to i64, reusing the projected
    /// column when present and reading the chunk otherwise.
    fn filter_values(
        &self,
        rg_idx: usize,
        filter: &Predicate,
        batch: &Batch,
    ) -> Result<Vec<i64>> {
        if let Some(idx) = batch.column_index(&filter.column) {
            return match &batch.columns[idx] {
                ColumnVector::Int32(v) => Ok(v.iter().map(|&x| i64::from(x)).collect()),
                ColumnVector::Int64(v) => Ok(v.clone()),
                ColumnVector::String(_) => Err(ColError::TypeMismatch(format!(
                    "filter column '{}' is not an integer column",
                    filter.column
                ))),
            };
        }
        let schema = self.reader.schema();
        let col_idx = schema.column_index(&filter.column).ok_or_else(|| {
            ColError::InvalidArgument(format!(
                "unknown filter column '{}'",
                filter.column
            ))
        })?;
        match schema.columns[col_idx].column_type {
            ColumnType::Int32 => Ok(self
                .reader
                .read_i32_column(rg_idx, col_idx)?
                .into_iter()
                .map(i64::from)
                .collect()),
            ColumnType::Int64 => self.reader.read_i64_column(rg_idx, col_idx),
            ColumnType::String => Err(ColError::TypeMismatch(format!(
                "filter column '{}' is not an integer column",
                filter.column
            ))),
        }
    }
}
