//! Query executor
//!
//! Composes the scanner with projection, filter, aggregate and group-by
//! operators. Aggregation and group-by stream the scanner once and never
//! materialize the full relation.

use std::str::FromStr;

use ahash::AHashMap;

use crate::query::batch::{Batch, ColumnVector};
use crate::query::predicate::Predicate;
use crate::query::scanner::Scanner;
use crate::storage::{ColumnType, FileReader};
use crate::{ColError, Result};

/// Aggregation function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Min,
    Max,
}

impl FromStr for AggFunc {
    type Err = ColError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(AggFunc::Count),
            "sum" => Ok(AggFunc::Sum),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            other => Err(ColError::InvalidArgument(format!(
                "invalid aggregation function '{}'",
                other
            ))),
        }
    }
}

/// Accumulated aggregation state.
///
/// When the aggregated column is an integer column, count, sum, min and max
/// are all maintained together; callers read the field matching the
/// function they asked for. Sum wraps on overflow (two's-complement).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggResult {
    pub count: i64,
    pub sum: i64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl AggResult {
    #[inline]
    fn update(&mut self, value: i64) {
        self.count += 1;
        self.sum = self.sum.wrapping_add(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    #[inline]
    fn update_count(&mut self) {
        self.count += 1;
    }
}

/// Configurable scan/filter/project/aggregate/group-by query over a file.
pub struct QueryExecutor<'a> {
    reader: &'a FileReader,
    projection: Vec<String>,
    filters: Vec<Predicate>,
    aggregation: Option<(AggFunc, String)>,
    group_by: Option<String>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(reader: &'a FileReader) -> Self {
        Self {
            reader,
            projection: Vec::new(),
            filters: Vec::new(),
            aggregation: None,
            group_by: None,
        }
    }

    /// Restrict output columns. An empty projection selects all columns.
    pub fn set_projection(&mut self, columns: Vec<String>) {
        self.projection = columns;
    }

    /// Append an AND-conjoined filter.
    pub fn add_filter(&mut self, predicate: Predicate) {
        self.filters.push(predicate);
    }

    /// Configure a single aggregation. COUNT accepts any column; SUM, MIN
    /// and MAX require an integer column.
    pub fn set_aggregation(&mut self, func: AggFunc, column: impl Into<String>) {
        self.aggregation = Some((func, column.into()));
    }

    /// Group rows by a string column. Combined with the configured
    /// aggregation, or COUNT when none is set.
    pub fn set_group_by(&mut self, column: impl Into<String>) {
        self.group_by = Some(column.into());
    }

    fn scanner(&self, columns: &[String]) -> Result<Scanner<'a>> {
        let mut scanner = Scanner::new(self.reader, columns)?;
        for filter in &self.filters {
            scanner.add_filter(filter.clone())?;
        }
        Ok(scanner)
    }

    /// Run the scan and return the surviving batches, post-filter and
    /// post-projection.
    pub fn execute_query(&self) -> Result<Vec<Batch>> {
        let columns: Vec<String> = if self.projection.is_empty() {
            self.reader
                .schema()
                .columns
                .iter()
                .map(|c| c.name.clone())
                .collect()
        } else {
            self.projection.clone()
        };

        let mut scanner = self.scanner(&columns)?;
        let mut batches = Vec::new();
        while scanner.has_next() {
            batches.push(scanner.next()?);
        }
        Ok(batches)
    }

    /// Run the configured aggregation in one streaming pass.
    pub fn execute_aggregate(&self) -> Result<AggResult> {
        let (func, column) = self
            .aggregation
            .clone()
            .ok_or_else(|| ColError::InvalidArgument("no aggregation configured".to_string()))?;

        let schema = self.reader.schema();
        let col_idx = schema.column_index(&column).ok_or_else(|| {
            ColError::InvalidArgument(format!("unknown column '{}'", column))
        })?;
        let column_type = schema.columns[col_idx].column_type;
        if func != AggFunc::Count && !column_type.is_integer() {
            return Err(ColError::InvalidArgument(format!(
                "{:?} needs an integer column, '{}' is {}",
                func, column, column_type
            )));
        }

        let mut scanner = self.scanner(std::slice::from_ref(&column))?;
        let mut result = AggResult::default();
        while scanner.has_next() {
            let batch = scanner.next()?;
            match &batch.columns[0] {
                ColumnVector::Int32(values) => {
                    for &value in values {
                        result.update(i64::from(value));
                    }
                }
                ColumnVector::Int64(values) => {
                    for &value in values {
                        result.update(value);
                    }
                }
                // COUNT over a string column only uses cardinality
                ColumnVector::String(values) => result.count += values.len() as i64,
            }
        }
        Ok(result)
    }

    /// Run the configured group-by in one streaming pass. Iteration order
    /// of the result pairs is unspecified.
    pub fn execute_group_by(&self) -> Result<Vec<(String, AggResult)>> {
        let group_column = self
            .group_by
            .clone()
            .ok_or_else(|| ColError::InvalidArgument("no group-by column configured".to_string()))?;

        let schema = self.reader.schema();
        let group_idx = schema.column_index(&group_column).ok_or_else(|| {
            ColError::InvalidArgument(format!("unknown column '{}'", group_column))
        })?;
        if schema.columns[group_idx].column_type != ColumnType::String {
            return Err(ColError::InvalidArgument(format!(
                "group-by column '{}' is {}, grouping needs a string column",
                group_column, schema.columns[group_idx].column_type
            )));
        }

        // aggregate integer values when a target column is configured,
        // otherwise count group members
        let agg_column = match &self.aggregation {
            Some((func, column)) => {
                let idx = schema.column_index(column).ok_or_else(|| {
                    ColError::InvalidArgument(format!("unknown column '{}'", column))
                })?;
                let column_type = schema.columns[idx].column_type;
                if *func != AggFunc::Count && !column_type.is_integer() {
                    return Err(ColError::InvalidArgument(format!(
                        "{:?} needs an integer column, '{}' is {}",
                        func, column, column_type
                    )));
                }
                if column_type.is_integer() {
                    Some(column.clone())
                } else {
                    None
                }
            }
            None => None,
        };

        let mut columns = vec![group_column];
        if let Some(column) = &agg_column {
            columns.push(column.clone());
        }

        let mut scanner = self.scanner(&columns)?;
        let mut groups: AHashMap<String, AggResult> = AHashMap::new();
        while scanner.has_next() {
            let batch = scanner.next()?;
            let keys = batch.columns[0].as_strings()?;
            match batch.columns.get(1) {
                Some(values) => {
                    for (row, key) in keys.iter().enumerate() {
                        let value = values.int_value(row).ok_or_else(|| {
                            ColError::TypeMismatch(
                                "aggregation column is not an integer column".to_string(),
                            )
                        })?;
                        match groups.get_mut(key) {
                            Some(state) => state.update(value),
                            None => {
                                let mut state = AggResult::default();
                                state.update(value);
                                groups.insert(key.clone(), state);
                            }
                        }
                    }
                }
                None => {
                    for key in keys {
                        match groups.get_mut(key) {
                            Some(state) => state.update_count(),
                            None => {
                                let mut state = AggResult::default();
                                state.update_count();
                                groups.insert(key.clone(), state);
                            }
                        }
                    }
                }
            }
        }
        Ok(groups.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::CompareOp;
    use crate::storage::{ColumnSchema, EncodingType, FileWriter, Schema};
    use tempfile::tempdir;

    fn test_schema() -> Schema {
        Schema::new(vec![
            ColumnSchema::new("id", ColumnType::Int64, EncodingType::Plain),
            ColumnSchema::new("value", ColumnType::Int32, EncodingType::Plain),
            ColumnSchema::new("category", ColumnType::String, EncodingType::Dictionary),
        ])
    }

    fn write_test_file(path: &std::path::Path) {
        let mut writer = FileWriter::create(path, test_schema()).unwrap();
        writer.write_i64_column(0, &[1, 2, 3, 4, 5]).unwrap();
        writer
            .write_i32_column(1, &[100, 200, 150, 300, 250])
            .unwrap();
        writer
            .write_string_column(2, &["A", "B", "A", "C", "B"].map(String::from))
            .unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_scanner_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut scanner =
            Scanner::new(&reader, &["id".to_string(), "value".to_string()]).unwrap();

        assert!(scanner.has_next());
        let batch = scanner.next().unwrap();
        assert_eq!(batch.num_rows, 5);
        assert_eq!(batch.column_names.len(), 2);

        let ids = batch.columns[0].as_i64().unwrap();
        let values = batch.columns[1].as_i32().unwrap();
        assert_eq!(ids, &[1, 2, 3, 4, 5]);
        assert_eq!(values, &[100, 200, 150, 300, 250]);

        assert!(!scanner.has_next());
        assert!(matches!(scanner.next(), Err(ColError::InvalidArgument(_))));
    }

    #[test]
    fn test_scanner_with_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut scanner =
            Scanner::new(&reader, &["id".to_string(), "value".to_string()]).unwrap();
        scanner
            .add_filter(Predicate::new("value", CompareOp::Gt, 150))
            .unwrap();

        let batch = scanner.next().unwrap();
        assert_eq!(batch.num_rows, 3);
        for &value in batch.columns[1].as_i32().unwrap() {
            assert!(value > 150);
        }
        assert_eq!(batch.columns[0].as_i64().unwrap(), &[2, 4, 5]);
    }

    #[test]
    fn test_scanner_filter_on_unprojected_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut scanner = Scanner::new(&reader, &["category".to_string()]).unwrap();
        scanner
            .add_filter(Predicate::new("value", CompareOp::Gt, 150))
            .unwrap();

        let batch = scanner.next().unwrap();
        assert_eq!(batch.num_rows, 3);
        assert_eq!(
            batch.columns[0].as_strings().unwrap(),
            &["B", "C", "B"].map(String::from)
        );
    }

    #[test]
    fn test_scanner_rejects_bad_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        assert!(matches!(
            Scanner::new(&reader, &["missing".to_string()]),
            Err(ColError::InvalidArgument(_))
        ));

        let mut scanner = Scanner::new(&reader, &["id".to_string()]).unwrap();
        assert!(matches!(
            scanner.add_filter(Predicate::new("category", CompareOp::Eq, 1)),
            Err(ColError::InvalidArgument(_))
        ));
        assert!(matches!(
            scanner.add_filter(Predicate::new("missing", CompareOp::Eq, 1)),
            Err(ColError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_query_projection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_projection(vec!["value".to_string()]);

        let batches = executor.execute_query().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].column_names, vec!["value".to_string()]);
        assert_eq!(batches[0].columns.len(), 1);
    }

    #[test]
    fn test_query_all_columns_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let executor = QueryExecutor::new(&reader);
        let batches = executor.execute_query().unwrap();
        assert_eq!(batches[0].column_names.len(), 3);
    }

    #[test]
    fn test_projection_commutes_with_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();

        let mut project_then_filter = QueryExecutor::new(&reader);
        project_then_filter.set_projection(vec!["id".to_string()]);
        project_then_filter.add_filter(Predicate::new("value", CompareOp::Ge, 200));
        let narrow = project_then_filter.execute_query().unwrap();

        let mut filter_all = QueryExecutor::new(&reader);
        filter_all.add_filter(Predicate::new("value", CompareOp::Ge, 200));
        let wide = filter_all.execute_query().unwrap();

        let narrow_ids: Vec<i64> = narrow
            .iter()
            .flat_map(|b| b.columns[0].as_i64().unwrap().to_vec())
            .collect();
        let wide_ids: Vec<i64> = wide
            .iter()
            .flat_map(|b| b.column("id").unwrap().as_i64().unwrap().to_vec())
            .collect();
        assert_eq!(narrow_ids, wide_ids);
        assert_eq!(narrow_ids, vec![2, 4, 5]);
    }

    #[test]
    fn test_aggregation_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_aggregation(AggFunc::Count, "id");
        let result = executor.execute_aggregate().unwrap();
        assert_eq!(result.count, 5);
    }

    #[test]
    fn test_aggregation_count_string_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_aggregation(AggFunc::Count, "category");
        let result = executor.execute_aggregate().unwrap();
        assert_eq!(result.count, 5);
        assert_eq!(result.sum, 0);
        assert_eq!(result.min, None);
    }

    #[test]
    fn test_aggregation_sum_min_max() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_aggregation(AggFunc::Sum, "value");
        let result = executor.execute_aggregate().unwrap();
        assert_eq!(result.count, 5);
        assert_eq!(result.sum, 1000);
        assert_eq!(result.min, Some(100));
        assert_eq!(result.max, Some(300));
    }

    #[test]
    fn test_aggregation_with_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.add_filter(Predicate::new("value", CompareOp::Gt, 150));
        executor.set_aggregation(AggFunc::Count, "id");
        let result = executor.execute_aggregate().unwrap();
        assert_eq!(result.count, 3);
    }

    #[test]
    fn test_aggregation_equals_query_row_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.add_filter(Predicate::new("value", CompareOp::Le, 250));
        executor.set_aggregation(AggFunc::Count, "id");

        let count = executor.execute_aggregate().unwrap().count;
        let rows: usize = executor
            .execute_query()
            .unwrap()
            .iter()
            .map(|b| b.num_rows)
            .sum();
        assert_eq!(count as usize, rows);
    }

    #[test]
    fn test_aggregation_rejects_sum_over_strings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_aggregation(AggFunc::Sum, "category");
        assert!(matches!(
            executor.execute_aggregate(),
            Err(ColError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_aggregation_unconfigured() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let executor = QueryExecutor::new(&reader);
        assert!(matches!(
            executor.execute_aggregate(),
            Err(ColError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_group_by_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_group_by("category");
        executor.set_aggregation(AggFunc::Count, "id");

        let results = executor.execute_group_by().unwrap();
        assert_eq!(results.len(), 3);
        for (key, agg) in &results {
            match key.as_str() {
                "A" => assert_eq!(agg.count, 2),
                "B" => assert_eq!(agg.count, 2),
                "C" => assert_eq!(agg.count, 1),
                other => panic!("unexpected group '{}'", other),
            }
        }
    }

    #[test]
    fn test_group_by_with_sum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_group_by("category");
        executor.set_aggregation(AggFunc::Sum, "value");

        let results = executor.execute_group_by().unwrap();
        assert_eq!(results.len(), 3);
        for (key, agg) in &results {
            match key.as_str() {
                "A" => assert_eq!(agg.sum, 250),
                "B" => assert_eq!(agg.sum, 450),
                "C" => assert_eq!(agg.sum, 300),
                other => panic!("unexpected group '{}'", other),
            }
        }
    }

    #[test]
    fn test_group_by_defaults_to_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_group_by("category");

        let results = executor.execute_group_by().unwrap();
        let total: i64 = results.iter().map(|(_, agg)| agg.count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_group_by_completeness_with_filter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.add_filter(Predicate::new("value", CompareOp::Gt, 150));
        executor.set_group_by("category");

        // matching rows: (200, B), (300, C), (250, B)
        let results = executor.execute_group_by().unwrap();
        assert_eq!(results.len(), 2);
        let total: i64 = results.iter().map(|(_, agg)| agg.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_group_by_rejects_integer_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exec.col");
        write_test_file(&path);

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_group_by("value");
        assert!(matches!(
            executor.execute_group_by(),
            Err(ColError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stats_skip_row_group() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.col");

        let schema = Schema::new(vec![ColumnSchema::new(
            "value",
            ColumnType::Int64,
            EncodingType::Plain,
        )]);
        let mut writer = FileWriter::create(&path, schema).unwrap();
        let first: Vec<i64> = (1..=100).collect();
        writer.write_i64_column(0, &first).unwrap();
        writer.flush_row_group().unwrap();
        let second: Vec<i64> = (200..=300).collect();
        writer.write_i64_column(0, &second).unwrap();
        writer.flush_row_group().unwrap();
        writer.close().unwrap();

        let reader = FileReader::open(&path).unwrap();

        // row group 1 has hi = 100 <= 250, so only row group 2 survives
        let mut scanner = Scanner::new(&reader, &["value".to_string()]).unwrap();
        scanner
            .add_filter(Predicate::new("value", CompareOp::Gt, 250))
            .unwrap();
        let mut batches = Vec::new();
        while scanner.has_next() {
            batches.push(scanner.next().unwrap());
        }
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows, 50);

        let mut executor = QueryExecutor::new(&reader);
        executor.add_filter(Predicate::new("value", CompareOp::Gt, 250));
        executor.set_aggregation(AggFunc::Count, "value");
        assert_eq!(executor.execute_aggregate().unwrap().count, 50);
    }

    #[test]
    fn test_skip_soundness_matches_full_scan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.col");

        let schema = Schema::new(vec![ColumnSchema::new(
            "value",
            ColumnType::Int64,
            EncodingType::Plain,
        )]);
        let mut writer = FileWriter::create(&path, schema).unwrap();
        for chunk in [-50i64..=-1, 0..=49, 50..=99] {
            let values: Vec<i64> = chunk.collect();
            writer.write_i64_column(0, &values).unwrap();
            writer.flush_row_group().unwrap();
        }
        writer.close().unwrap();

        let reader = FileReader::open(&path).unwrap();
        for (op, value) in [
            (CompareOp::Eq, 0),
            (CompareOp::Ne, -25),
            (CompareOp::Lt, -49),
            (CompareOp::Le, 49),
            (CompareOp::Gt, 98),
            (CompareOp::Ge, 150),
        ] {
            // with skipping
            let mut executor = QueryExecutor::new(&reader);
            executor.add_filter(Predicate::new("value", op, value));
            executor.set_aggregation(AggFunc::Count, "value");
            let skipped = executor.execute_aggregate().unwrap().count;

            // without skipping: materialize everything and filter by hand
            let pred = Predicate::new("value", op, value);
            let mut expected = 0i64;
            for rg in 0..reader.metadata().row_groups.len() {
                for v in reader.read_i64_column(rg, 0).unwrap() {
                    if pred.matches_i64(v) {
                        expected += 1;
                    }
                }
            }
            assert_eq!(skipped, expected, "op {:?} value {}", op, value);
        }
    }

    #[test]
    fn test_sum_wraps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrap.col");

        let schema = Schema::new(vec![ColumnSchema::new(
            "value",
            ColumnType::Int64,
            EncodingType::Plain,
        )]);
        let mut writer = FileWriter::create(&path, schema).unwrap();
        writer.write_i64_column(0, &[i64::MAX, 1]).unwrap();
        writer.close().unwrap();

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_aggregation(AggFunc::Sum, "value");
        let result = executor.execute_aggregate().unwrap();
        assert_eq!(result.sum, i64::MIN);
        assert_eq!(result.max, Some(i64::MAX));
    }

    #[test]
    fn test_multi_row_group_group_by() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.col");

        let schema = Schema::new(vec![
            ColumnSchema::new("value", ColumnType::Int32, EncodingType::Plain),
            ColumnSchema::new("region", ColumnType::String, EncodingType::Dictionary),
        ]);
        let mut writer = FileWriter::create(&path, schema).unwrap();
        writer.write_i32_column(0, &[1, 2, 3]).unwrap();
        writer
            .write_string_column(1, &["north", "south", "north"].map(String::from))
            .unwrap();
        writer.flush_row_group().unwrap();
        writer.write_i32_column(0, &[4, 5]).unwrap();
        writer
            .write_string_column(1, &["south", "east"].map(String::from))
            .unwrap();
        writer.flush_row_group().unwrap();
        writer.close().unwrap();

        let reader = FileReader::open(&path).unwrap();
        let mut executor = QueryExecutor::new(&reader);
        executor.set_group_by("region");
        executor.set_aggregation(AggFunc::Sum, "value");

        let results = executor.execute_group_by().unwrap();
        assert_eq!(results.len(), 3);
        for (key, agg) in &results {
            match key.as_str() {
                "north" => {
                    assert_eq!(agg.count, 2);
                    assert_eq!(agg.sum, 4);
                }
                "south" => {
                    assert_eq!(agg.count, 2);
                    assert_eq!(agg.sum, 6);
                }
                "east" => {
                    assert_eq!(agg.count, 1);
                    assert_eq!(agg.sum, 5);
                }
                other => panic!("unexpected group '{}'", other),
            }
        }
    }
}
