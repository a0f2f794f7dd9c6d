//! In-memory tables backing [`Db`](crate::Db).
//!
//! A write operation works on a cloned [`Tables`] and swaps it in on success,
//! so a rejected write leaves nothing behind.

use crate::error::StoreError;
use model_validations_ports::{Row, Value, is_zero_key, render_key};
use std::collections::BTreeMap;

/// Primary key columns with the values the model carries.
pub type KeyColumns<'a> = &'a [(&'static str, Value)];

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: u64,
}

impl Table {
    fn position(&self, row: &Row, keys: KeyColumns<'_>) -> Option<usize> {
        if keys.is_empty() {
            return None;
        }
        self.rows.iter().position(|existing| {
            keys.iter()
                .all(|(column, _)| existing.get(*column) == row.get(*column))
        })
    }
}

/// Rows grouped by table name.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    tables: BTreeMap<String, Table>,
}

impl Tables {
    /// Insert a new row, assigning the next id to a single zero-valued key.
    ///
    /// Returns the row as stored.
    pub fn insert(
        &mut self,
        table: &str,
        mut row: Row,
        keys: KeyColumns<'_>,
    ) -> Result<Row, StoreError> {
        let entry = self.tables.entry(table.to_string()).or_default();
        if let [(column, value)] = keys {
            if is_zero_key(value) {
                entry.next_id += 1;
                row.insert((*column).to_string(), Value::from(entry.next_id));
            } else if let Some(id) = value.as_u64() {
                entry.next_id = entry.next_id.max(id);
            }
        }
        if entry.position(&row, keys).is_some() {
            return Err(StoreError::DuplicateKey {
                table: table.to_string(),
                key: render_row_key(&row, keys),
            });
        }
        entry.rows.push(row.clone());
        Ok(row)
    }

    /// Replace the stored row with the same key.
    pub fn update(&mut self, table: &str, row: Row, keys: KeyColumns<'_>) -> Result<(), StoreError> {
        let slot = self
            .tables
            .get_mut(table)
            .and_then(|entry| {
                let index = entry.position(&row, keys)?;
                entry.rows.get_mut(index)
            })
            .ok_or_else(|| StoreError::MissingRecord {
                table: table.to_string(),
                key: render_row_key(&row, keys),
            })?;
        *slot = row;
        Ok(())
    }

    /// Replace the row with the same key, or insert it when absent.
    pub fn upsert(&mut self, table: &str, row: Row, keys: KeyColumns<'_>) -> Result<Row, StoreError> {
        let exists = self
            .tables
            .get(table)
            .and_then(|entry| entry.position(&row, keys))
            .is_some();
        if exists {
            self.update(table, row.clone(), keys)?;
            Ok(row)
        } else {
            self.insert(table, row, keys)
        }
    }

    /// Overwrite one column of the row identified by `keys`.
    pub fn set_column(
        &mut self,
        table: &str,
        keys: KeyColumns<'_>,
        column: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let probe: Row = keys
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect();
        let slot = self
            .tables
            .get_mut(table)
            .and_then(|entry| {
                let index = entry.position(&probe, keys)?;
                entry.rows.get_mut(index)
            })
            .ok_or_else(|| StoreError::MissingRecord {
                table: table.to_string(),
                key: render_row_key(&probe, keys),
            })?;
        slot.insert(column.to_string(), value);
        Ok(())
    }

    /// Rows of `table` whose `column` equals `value`, in insertion order.
    #[must_use]
    pub fn find(&self, table: &str, column: &str, value: &Value) -> Vec<Row> {
        self.rows(table)
            .iter()
            .filter(|row| row.get(column) == Some(value))
            .cloned()
            .collect()
    }

    /// Number of rows of `table` whose `column` equals `value`.
    #[must_use]
    pub fn count(&self, table: &str, column: &str, value: &Value) -> usize {
        self.rows(table)
            .iter()
            .filter(|row| row.get(column) == Some(value))
            .count()
    }

    /// Every row of `table`; empty for unknown tables.
    #[must_use]
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables
            .get(table)
            .map(|entry| entry.rows.as_slice())
            .unwrap_or_default()
    }
}

fn render_row_key(row: &Row, keys: KeyColumns<'_>) -> String {
    keys.iter()
        .map(|(column, fallback)| render_key(row.get(*column).unwrap_or(fallback)))
        .collect::<Vec<_>>()
        .join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn insert_assigns_sequential_ids() -> Result<(), StoreError> {
        let mut tables = Tables::default();
        let keys = [("id", json!(0))];
        let first = tables.insert("users", row(&[("id", json!(0)), ("name", json!("a"))]), &keys)?;
        let second = tables.insert("users", row(&[("id", json!(0)), ("name", json!("b"))]), &keys)?;

        assert_eq!(first.get("id"), Some(&json!(1)));
        assert_eq!(second.get("id"), Some(&json!(2)));
        assert_eq!(tables.rows("users").len(), 2);
        Ok(())
    }

    #[test]
    fn insert_rejects_duplicate_keys() -> Result<(), StoreError> {
        let mut tables = Tables::default();
        let keys = [("code", json!("en"))];
        tables.insert("languages", row(&[("code", json!("en"))]), &keys)?;
        let duplicate = tables.insert("languages", row(&[("code", json!("en"))]), &keys);

        assert_eq!(
            duplicate,
            Err(StoreError::DuplicateKey {
                table: "languages".to_string(),
                key: "en".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn update_requires_existing_row() {
        let mut tables = Tables::default();
        let keys = [("id", json!(4))];
        let result = tables.update("users", row(&[("id", json!(4))]), &keys);
        assert!(matches!(result, Err(StoreError::MissingRecord { .. })));
    }

    #[test]
    fn upsert_replaces_then_inserts() -> Result<(), StoreError> {
        let mut tables = Tables::default();
        let keys = [("id", json!(3))];
        tables.upsert("users", row(&[("id", json!(3)), ("name", json!("a"))]), &keys)?;
        tables.upsert("users", row(&[("id", json!(3)), ("name", json!("b"))]), &keys)?;

        assert_eq!(tables.rows("users").len(), 1);
        assert_eq!(tables.count("users", "name", &json!("b")), 1);
        Ok(())
    }

    #[test]
    fn set_column_touches_one_value() -> Result<(), StoreError> {
        let mut tables = Tables::default();
        let keys = [("id", json!(0))];
        let stored = tables.insert("users", row(&[("id", json!(0)), ("name", json!("a"))]), &keys)?;
        let id = stored.get("id").cloned().unwrap_or(Value::Null);

        tables.set_column("users", &[("id", id)], "name", json!(""))?;
        assert_eq!(tables.find("users", "name", &json!("")).len(), 1);
        Ok(())
    }

    #[test]
    fn rows_without_keys_are_appended() -> Result<(), StoreError> {
        let mut tables = Tables::default();
        tables.insert("notes", row(&[("body", json!("x"))]), &[])?;
        tables.insert("notes", row(&[("body", json!("x"))]), &[])?;
        assert_eq!(tables.count("notes", "body", &json!("x")), 2);
        Ok(())
    }

    proptest! {
        #[test]
        fn generated_ids_are_dense(count in 1_usize..40) {
            let mut tables = Tables::default();
            let keys = [("id", json!(0))];
            for _ in 0..count {
                let stored = tables.insert("posts", row(&[("id", json!(0))]), &keys);
                prop_assert!(stored.is_ok());
            }
            for id in 1..=count {
                prop_assert_eq!(tables.count("posts", "id", &json!(id)), 1);
            }
        }
    }
}
