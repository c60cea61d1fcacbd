//! Left-join chain over N tables
//!
//! The first table is the base population. Each later table is folded in with
//! a left join on the shared key: every accumulator row survives, unmatched
//! rows get nulls in the joined table's columns, and a key matching several
//! rows of the joined table fans the accumulator row out once per match.

use crate::value::KeyPart;
use crate::{Error, Result, Table, Value};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

type RowKey = SmallVec<[KeyPart; 2]>;

/// Column(s) used to align rows across tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinKey(SmallVec<[String; 2]>);

impl JoinKey {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: SmallVec<[String; 2]> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(Error::InvalidConfig("join key needs at least one column".to_string()));
        }
        Ok(Self(columns))
    }

    pub fn single(column: impl Into<String>) -> Self {
        let mut columns = SmallVec::new();
        columns.push(column.into());
        Self(columns)
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }
}

impl From<&str> for JoinKey {
    fn from(column: &str) -> Self {
        Self::single(column)
    }
}

/// What happens when a joined table brings a non-key column whose name is
/// already taken in the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep both: the incoming column is renamed `{name}_{table_index}`
    #[default]
    Suffix,
    /// Merge into the existing column; matched rows take the incoming value
    Overwrite,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    pub collision: CollisionPolicy,
}

/// Join `tables` left to right on `key`.
///
/// All tables are checked for the key columns before any row is touched.
pub fn join(tables: Vec<Table>, key: &JoinKey, options: &JoinOptions) -> Result<Table> {
    for (i, table) in tables.iter().enumerate() {
        for column in key.columns() {
            if !table.has_column(column) {
                return Err(Error::missing_column(i, column));
            }
        }
    }

    let mut tables = tables.into_iter();
    let Some(mut acc) = tables.next() else {
        return Err(Error::Schema("join requires at least one table".to_string()));
    };

    for (offset, right) in tables.enumerate() {
        let table_index = offset + 1;
        let before = acc.len();
        acc = left_join(acc, right, key, table_index, options.collision)?;
        debug!(
            "joined table {}: {} -> {} rows, {} columns",
            table_index,
            before,
            acc.len(),
            acc.columns().len()
        );
    }

    Ok(acc)
}

/// Where a column of the joined table lands in the output row
#[derive(Debug, Clone, Copy)]
enum Target {
    Skip,
    Column(usize),
}

fn left_join(
    left: Table,
    right: Table,
    key: &JoinKey,
    table_index: usize,
    policy: CollisionPolicy,
) -> Result<Table> {
    let (mut columns, left_rows) = left.into_parts();
    let (right_columns, right_rows) = right.into_parts();

    let left_key = key_positions(&columns, key, 0)?;
    let right_key = key_positions(&right_columns, key, table_index)?;

    let mut targets = Vec::with_capacity(right_columns.len());
    for name in right_columns {
        if key.contains(&name) {
            targets.push(Target::Skip);
            continue;
        }
        match columns.iter().position(|c| *c == name) {
            Some(existing) if policy == CollisionPolicy::Overwrite => {
                targets.push(Target::Column(existing));
            }
            Some(_) => {
                let mut renamed = format!("{}_{}", name, table_index);
                while columns.contains(&renamed) {
                    renamed = format!("{}_{}", renamed, table_index);
                }
                debug!("column '{}' from table {} renamed to '{}'", name, table_index, renamed);
                targets.push(Target::Column(columns.len()));
                columns.push(renamed);
            }
            None => {
                targets.push(Target::Column(columns.len()));
                columns.push(name);
            }
        }
    }
    let width = columns.len();

    let mut index: AHashMap<RowKey, Vec<usize>> = AHashMap::with_capacity(right_rows.len());
    for (i, row) in right_rows.iter().enumerate() {
        if let Some(k) = row_key(row, &right_key) {
            index.entry(k).or_default().push(i);
        }
    }

    let mut rows = Vec::with_capacity(left_rows.len());
    let mut fanned_out = 0usize;
    for left_row in left_rows {
        let matches = row_key(&left_row, &left_key).and_then(|k| index.get(&k));
        match matches {
            Some(matched) => {
                fanned_out += matched.len() - 1;
                for &r in matched {
                    let mut row = left_row.clone();
                    row.resize(width, Value::Null);
                    for (value, target) in right_rows[r].iter().zip(&targets) {
                        if let Target::Column(pos) = *target {
                            row[pos] = value.clone();
                        }
                    }
                    rows.push(row);
                }
            }
            None => {
                let mut row = left_row;
                row.resize(width, Value::Null);
                rows.push(row);
            }
        }
    }

    if fanned_out > 0 {
        warn!(
            "table {} has duplicate join keys: {} extra rows from fan-out",
            table_index, fanned_out
        );
    }

    Ok(Table::from_parts_unchecked(columns, rows))
}

fn key_positions(columns: &[String], key: &JoinKey, table_index: usize) -> Result<SmallVec<[usize; 2]>> {
    key.columns()
        .iter()
        .map(|k| {
            columns
                .iter()
                .position(|c| c == k)
                .ok_or_else(|| Error::missing_column(table_index, k))
        })
        .collect()
}

/// Null (or NaN) in any key column means the row matches nothing
fn row_key(row: &[Value], positions: &[usize]) -> Option<RowKey> {
    positions.iter().map(|&p| row[p].key()).collect()
}
