//! Filter predicates and the page-skip algebra

use std::str::FromStr;

use crate::storage::PageStats;
use crate::{ColError, Result};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FromStr for CompareOp {
    type Err = ColError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eq" => Ok(CompareOp::Eq),
            "ne" => Ok(CompareOp::Ne),
            "lt" => Ok(CompareOp::Lt),
            "le" => Ok(CompareOp::Le),
            "gt" => Ok(CompareOp::Gt),
            "ge" => Ok(CompareOp::Ge),
            other => Err(ColError::InvalidArgument(format!(
                "invalid comparison operator '{}'",
                other
            ))),
        }
    }
}

/// A filter of the form `column OP constant` over an integer column.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub value: i64,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: CompareOp, value: i64) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    /// Row-wise evaluation against an i64 column value.
    pub fn matches_i64(&self, col_value: i64) -> bool {
        match self.op {
            CompareOp::Eq => col_value == self.value,
            CompareOp::Ne => col_value != self.value,
            CompareOp::Lt => col_value < self.value,
            CompareOp::Le => col_value <= self.value,
            CompareOp::Gt => col_value > self.value,
            CompareOp::Ge => col_value >= self.value,
        }
    }

    /// Row-wise evaluation against an i32 column value.
    pub fn matches_i32(&self, col_value: i32) -> bool {
        self.matches_i64(i64::from(col_value))
    }

    /// Whether the page's stats prove no row can satisfy this predicate.
    ///
    /// Absent stats disable skipping; stats are advisory and a skipped page
    /// must contain no matching row.
    pub fn can_skip_page(&self, stats: &PageStats) -> bool {
        let (lo, hi) = match (stats.min, stats.max) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return false,
        };
        match self.op {
            CompareOp::Eq => self.value < lo || self.value > hi,
            CompareOp::Ne => lo == hi && lo == self.value,
            CompareOp::Lt => lo >= self.value,
            CompareOp::Le => lo > self.value,
            CompareOp::Gt => hi <= self.value,
            CompareOp::Ge => hi < self.value,
        }
    }
}
