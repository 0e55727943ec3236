//! Parameterized `IN (...)` predicate construction.
//!
//! Keeps SQLite placeholder rules out of repository code: callers hand over
//! a column and a value set and receive SQL text plus positional binds.

use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER` since 3.32.
pub const MAX_BIND_VALUES: usize = 32_766;

/// Failure to build a predicate. Raised before any store round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    EmptyValues { column: &'static str },
    TooManyValues { column: &'static str, count: usize },
}

impl Display for QueryBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValues { column } => {
                write!(f, "empty value set passed to `{column} IN (...)`")
            }
            Self::TooManyValues { column, count } => write!(
                f,
                "`{column} IN (...)` received {count} values; at most {MAX_BIND_VALUES} allowed"
            ),
        }
    }
}

impl Error for QueryBuildError {}

/// SQL fragment `column IN (?, ?, ...)` with its bind values in order.
#[derive(Debug, Clone, PartialEq)]
pub struct InPredicate {
    sql: String,
    values: Vec<Value>,
}

impl InPredicate {
    /// Expands `values` into one anonymous placeholder per element.
    ///
    /// Duplicates are kept; the store collapses them when matching.
    pub fn build<T>(column: &'static str, values: &[T]) -> Result<Self, QueryBuildError>
    where
        T: Clone + Into<Value>,
    {
        if values.is_empty() {
            return Err(QueryBuildError::EmptyValues { column });
        }
        if values.len() > MAX_BIND_VALUES {
            return Err(QueryBuildError::TooManyValues {
                column,
                count: values.len(),
            });
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        Ok(Self {
            sql: format!("{column} IN ({placeholders})"),
            values: values.iter().cloned().map(Into::into).collect(),
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
