//! Hierarchical grouping: one [`Document`] per category value
//!
//! Rows are partitioned by the category column, each row is rendered as a
//! self-describing JSON record (category hoisted into metadata), and the
//! records of a partition are concatenated in table order.

use crate::document::{Record, ROW_SEPARATOR};
use crate::value::{KeyPart, NULL_SENTINEL};
use crate::{Document, Error, Result, Table, Value};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Order in which category groups are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Order of first appearance, scanning the table top to bottom
    #[default]
    FirstSeen,
    /// Ascending by the category's rendered text
    Sorted,
}

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Restrict records to these columns (table order is kept)
    pub columns: Option<Vec<String>>,
    /// Columns left out of records, in addition to the category column
    pub excluded: Vec<String>,
    pub null_sentinel: String,
    pub order: GroupOrder,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            columns: None,
            excluded: Vec::new(),
            null_sentinel: NULL_SENTINEL.to_string(),
            order: GroupOrder::FirstSeen,
        }
    }
}

struct Group<'a> {
    category: &'a Value,
    rows: Vec<usize>,
}

/// Partition `table` by `category_column` and serialize each partition.
///
/// Fails without emitting anything if any value cannot be rendered.
pub fn group_and_assemble(
    table: &Table,
    category_column: &str,
    options: &AssemblyOptions,
) -> Result<Vec<Document>> {
    let category_idx = table
        .column_index(category_column)
        .ok_or_else(|| Error::Schema(format!("category column '{}' not found", category_column)))?;

    if let Some(projection) = &options.columns {
        if let Some(missing) = projection.iter().find(|c| !table.has_column(c)) {
            return Err(Error::Schema(format!("record column '{}' not found", missing)));
        }
    }

    let fields: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|&(i, name)| {
            i != category_idx
                && !options.excluded.contains(name)
                && options.columns.as_ref().map_or(true, |cols| cols.contains(name))
        })
        .map(|(i, _)| i)
        .collect();

    let mut groups = partition(table, category_idx)?;
    if options.order == GroupOrder::Sorted {
        let mut keyed = groups
            .into_iter()
            .map(|g| Ok::<_, Error>((g.category.render(&options.null_sentinel)?.into_owned(), g)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        groups = keyed.into_iter().map(|(_, g)| g).collect();
    }

    let columns = table.columns();
    let mut documents = Vec::with_capacity(groups.len());
    for group in groups {
        let mut records = Vec::with_capacity(group.rows.len());
        for &r in &group.rows {
            let row = &table.rows()[r];
            let mut record = Vec::with_capacity(fields.len());
            for &c in &fields {
                let text = row[c].render(&options.null_sentinel).map_err(|e| match e {
                    Error::Serialization(msg) => {
                        Error::Serialization(format!("row {}, column '{}': {}", r, columns[c], msg))
                    }
                    other => other,
                })?;
                record.push((columns[c].clone(), text.into_owned()));
            }
            records.push(Record(record).to_json()?);
        }

        debug!(
            "category {} = {}: {} records",
            category_column,
            group.category,
            records.len()
        );

        let mut metadata = BTreeMap::new();
        metadata.insert(category_column.to_string(), group.category.clone());
        documents.push(Document::new(records.join(ROW_SEPARATOR), metadata));
    }

    info!(
        "assembled {} documents from {} rows by '{}'",
        documents.len(),
        table.len(),
        category_column
    );
    Ok(documents)
}

fn partition(table: &Table, category_idx: usize) -> Result<Vec<Group<'_>>> {
    let mut slots: AHashMap<Option<KeyPart>, usize> = AHashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for (r, row) in table.rows().iter().enumerate() {
        let category = &row[category_idx];
        if let Value::Float(f) = category {
            if !f.is_finite() {
                return Err(Error::Serialization(format!(
                    "row {}: category value {} cannot be rendered",
                    r, f
                )));
            }
        }

        let slot = *slots.entry(category.key()).or_insert_with(|| {
            groups.push(Group {
                category,
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(r);
    }

    Ok(groups)
}
