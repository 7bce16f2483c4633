//! Stage artifacts on disk.
//!
//! Each stage of the screener reads the table written by the previous stage
//! and writes its own, at `<json_dir>/<stage>.json`. Tables are stored
//! column-major, the layout the other stages exchange:
//!
//! ```text
//! { "Symbol": { "0": "NVDA", "1": "MSFT" }, "Price": { "0": 450.2, "1": 301.5 } }
//! ```
//!
//! A plain array of row objects is accepted on input as well.

use screener_common::{Error, Result, ResultExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Reads and writes stage artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding a stage's table.
    pub fn path_for(&self, stage: &str) -> PathBuf {
        self.dir.join(format!("{stage}.json"))
    }

    /// Read a stage table, rows in ascending row-index order.
    pub fn open<T: DeserializeOwned>(&self, stage: &str) -> Result<Vec<T>> {
        let path = self.path_for(stage);
        let content = fs::read_to_string(&path)
            .context(format!("Failed to read artifact {}", path.display()))?;
        let table: Value = serde_json::from_str(&content)
            .context(format!("Failed to parse artifact {}", path.display()))?;

        rows_from_table(table)
            .context(format!("Malformed artifact {}", path.display()))?
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                serde_json::from_value(row)
                    .context(format!("Invalid row {} in {}", i, path.display()))
            })
            .collect()
    }

    /// Write a stage table, replacing any existing file.
    pub fn create<T: Serialize>(&self, stage: &str, rows: &[T]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .context(format!("Failed to create {}", self.dir.display()))?;

        let rows = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let table = table_from_rows(rows)?;

        let path = self.path_for(stage);
        fs::write(&path, serde_json::to_string(&table)?)
            .context(format!("Failed to write artifact {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(path)
    }
}

/// Sort key for row indexes: numeric indexes first, in numeric order.
fn row_key(index: &str) -> (u64, String) {
    (index.parse().unwrap_or(u64::MAX), index.to_string())
}

/// Turn a column-major table (or a row list) into row objects.
pub fn rows_from_table(table: Value) -> Result<Vec<Value>> {
    match table {
        Value::Array(rows) => Ok(rows),
        Value::Object(columns) => {
            let mut rows: BTreeMap<(u64, String), Map<String, Value>> = BTreeMap::new();
            for (column, cells) in columns {
                let Value::Object(cells) = cells else {
                    return Err(Error::InvalidInput(format!(
                        "column '{column}' is not an index-to-value map"
                    )));
                };
                for (index, cell) in cells {
                    rows.entry(row_key(&index))
                        .or_default()
                        .insert(column.clone(), cell);
                }
            }
            Ok(rows.into_values().map(Value::Object).collect())
        }
        _ => Err(Error::InvalidInput(
            "expected a column table or a list of rows".into(),
        )),
    }
}

/// Turn row objects into a column-major table indexed from zero.
pub fn table_from_rows(rows: Vec<Value>) -> Result<Value> {
    let mut columns = Map::new();
    for (i, row) in rows.into_iter().enumerate() {
        let Value::Object(fields) = row else {
            return Err(Error::InvalidInput(format!("row {i} is not an object")));
        };
        for (column, cell) in fields {
            if let Value::Object(cells) = columns
                .entry(column)
                .or_insert_with(|| Value::Object(Map::new()))
            {
                cells.insert(i.to_string(), cell);
            }
        }
    }
    Ok(Value::Object(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SymbolRecord;
    use serde_json::json;

    #[test]
    fn test_rows_follow_numeric_index_order() {
        let table = json!({
            "Symbol": { "10": "C", "2": "B", "0": "A" },
            "Price": { "0": 1.0, "2": 2.0, "10": 3.0 }
        });
        let rows = rows_from_table(table).unwrap();
        let symbols: Vec<_> = rows.iter().map(|r| r["Symbol"].as_str().unwrap()).collect();
        assert_eq!(symbols, vec!["A", "B", "C"]);
        assert_eq!(rows[2]["Price"], 3.0);
    }

    #[test]
    fn test_row_list_accepted() {
        let rows = rows_from_table(json!([{ "Symbol": "A" }])).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_scalar_table_rejected() {
        assert!(rows_from_table(json!(42)).is_err());
        assert!(rows_from_table(json!({ "Symbol": ["A"] })).is_err());
    }

    #[test]
    fn test_empty_table_written_as_empty_object() {
        let table = table_from_rows(Vec::new()).unwrap();
        assert_eq!(table, json!({}));
    }

    #[test]
    fn test_open_reads_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(
            store.path_for("liquidity"),
            r#"{"Symbol":{"0":"NVDA","1":"AMD"},"Company Name":{"0":"NVIDIA","1":"AMD"},
                "Industry":{"0":"Semis","1":"Semis"},"RS":{"0":97,"1":90},
                "Price":{"0":450.5,"1":null},"Market Cap":{"0":1e12,"1":2e11},
                "50-day Average Volume":{"0":4e7,"1":5e7}}"#,
        )
        .unwrap();

        let records: Vec<SymbolRecord> = store.open("liquidity").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "NVDA");
        assert_eq!(records[0].price, 450.5);
        assert!(records[1].price.is_nan());
    }

    #[test]
    fn test_create_overwrites_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));

        store.create("trend", &[json!({ "Symbol": "OLD" })]).unwrap();
        let path = store
            .create("trend", &[json!({ "Symbol": "A" }), json!({ "Symbol": "B" })])
            .unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, json!({ "Symbol": { "0": "A", "1": "B" } }));
    }

    #[test]
    fn test_missing_stage_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.open::<SymbolRecord>("liquidity").unwrap_err();
        assert!(err.is_not_found());
    }
}
