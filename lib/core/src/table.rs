use crate::{Error, Result, Value};
use serde::{Deserialize, Serialize};

/// An ordered sequence of rows over a fixed, ordered set of columns.
///
/// Every row holds exactly one value per column; a missing cell is
/// [`Value::Null`]. Column names are unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Unchecked wire form; converted through [`Table::from_rows`]
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Table::from_rows(raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(Error::Schema(format!("duplicate column '{}'", name)));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Build a table from columns and rows in one go
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append a row; its arity must match the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "row {} has {} values, table has {} columns",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of `column` in row `row`, if both exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// View a row as `(column, value)` pairs in column order
    pub fn record(&self, row: usize) -> Option<impl Iterator<Item = (&str, &Value)>> {
        self.rows
            .get(row)
            .map(|r| self.columns.iter().map(String::as_str).zip(r.iter()))
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts_unchecked(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_creation() {
        let table = Table::from_rows(
            ["id", "name"],
            vec![
                vec![Value::from(1), Value::from("a")],
                vec![Value::from(2), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["id".to_string(), "name".to_string()]);
        assert_eq!(table.get(0, "name"), Some(&Value::from("a")));
        assert_eq!(table.get(1, "name"), Some(&Value::Null));
        assert_eq!(table.get(2, "name"), None);
        assert_eq!(table.get(0, "missing"), None);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        assert!(matches!(Table::new(["id", "id"]), Err(Error::Schema(_))));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let mut table = Table::new(["id", "name"]).unwrap();
        assert!(matches!(
            table.push_row(vec![Value::from(1)]),
            Err(Error::Schema(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_deserialize_checks_arity() {
        let table: Table =
            serde_json::from_str(r#"{"columns":["id","category"],"rows":[[1,"Books"]]}"#).unwrap();
        assert_eq!(table.get(0, "category"), Some(&Value::from("Books")));

        let ragged = serde_json::from_str::<Table>(r#"{"columns":["id","category"],"rows":[[1]]}"#);
        assert!(ragged.is_err());
        let duplicate = serde_json::from_str::<Table>(r#"{"columns":["id","id"],"rows":[]}"#);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_record_view() {
        let table = Table::from_rows(["id", "name"], vec![vec![Value::from(7), Value::from("x")]]).unwrap();
        let record: Vec<_> = table.record(0).unwrap().collect();
        assert_eq!(record, vec![("id", &Value::from(7)), ("name", &Value::from("x"))]);
    }
}
