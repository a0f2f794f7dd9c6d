//! Model schema boundary contract.
//!
//! A persisted type describes itself explicitly (type name, table, primary
//! key values, column values, associations) instead of being inspected at
//! runtime. `#[derive(Model)]` generates this from `#[model(...)]` attributes.

use crate::capability::{Validator, ValidatorWithError};
use crate::scope::Target;
use crate::tags::TagValidate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Column values of one record, keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Schema description of one model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    type_name: &'static str,
    table: &'static str,
    primary_keys: Vec<(&'static str, Value)>,
}

impl ModelSchema {
    /// Describe a model type stored in `table`.
    #[must_use]
    pub const fn new(type_name: &'static str, table: &'static str) -> Self {
        Self {
            type_name,
            table,
            primary_keys: Vec::new(),
        }
    }

    /// Append a primary key column and its current value.
    #[must_use]
    pub fn with_primary_key(mut self, column: &'static str, value: Value) -> Self {
        self.primary_keys.push((column, value));
        self
    }

    /// Declared type name (e.g. `User`).
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Table the model is persisted to.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table
    }

    /// Primary key columns with their values, in declaration order.
    #[must_use]
    pub fn primary_keys(&self) -> &[(&'static str, Value)] {
        &self.primary_keys
    }

    /// Primary key values rendered as plain text, in declaration order.
    pub fn primary_key_values(&self) -> impl Iterator<Item = String> + '_ {
        self.primary_keys.iter().map(|(_, value)| render_key(value))
    }

    /// True when every primary key is unset (or the model declares none).
    #[must_use]
    pub fn is_new_record(&self) -> bool {
        self.primary_keys.iter().all(|(_, value)| is_zero_key(value))
    }
}

impl fmt::Display for ModelSchema {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.primary_key_values().collect();
        write!(formatter, "{}({})", self.type_name, keys.join("::"))
    }
}

/// Render a key value without JSON quoting; null renders as empty text.
#[must_use]
pub fn render_key(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// True for the zero value of a key column (null, `0`, `""`, `false`).
#[must_use]
pub fn is_zero_key(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Convert a field into a column value; unserializable values become null.
pub fn column_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Related records written together with their owner.
pub enum Association<'a> {
    /// A single related record.
    One {
        /// Field name of the association.
        name: &'static str,
        /// Column on the related record that holds the owner's key.
        foreign_key: &'static str,
        /// The related record.
        model: &'a dyn Model,
    },
    /// A list of related records, written as one collection.
    Many {
        /// Field name of the association.
        name: &'static str,
        /// Column on each related record that holds the owner's key.
        foreign_key: &'static str,
        /// The related records in declaration order.
        models: Vec<&'a dyn Model>,
    },
}

impl<'a> Association<'a> {
    /// Field name of the association.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::One { name, .. } | Self::Many { name, .. } => name,
        }
    }

    /// Column on the related records that holds the owner's key.
    #[must_use]
    pub const fn foreign_key(&self) -> &'static str {
        match self {
            Self::One { foreign_key, .. } | Self::Many { foreign_key, .. } => foreign_key,
        }
    }

    /// Write target for the association.
    #[must_use]
    pub fn into_target(self) -> Target<'a> {
        match self {
            Self::One { model, .. } => Target::Single(model),
            Self::Many { models, .. } => Target::Collection(models),
        }
    }
}

impl fmt::Debug for Association<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One {
                name,
                foreign_key,
                model,
            } => formatter
                .debug_struct("One")
                .field("name", name)
                .field("foreign_key", foreign_key)
                .field("model", &model.schema())
                .finish(),
            Self::Many {
                name,
                foreign_key,
                models,
            } => formatter
                .debug_struct("Many")
                .field("name", name)
                .field("foreign_key", foreign_key)
                .field("len", &models.len())
                .finish(),
        }
    }
}

/// A persisted model type.
///
/// The two capability queries default to `None`; a model opts into custom
/// validation by returning itself from one or both of them.
pub trait Model: TagValidate + Send + Sync {
    /// Describe the type name, table and primary key values.
    fn schema(&self) -> ModelSchema;

    /// Column values, associations excluded.
    fn row(&self) -> Row;

    /// Associations written after this record's callbacks succeed.
    fn associations(&self) -> Vec<Association<'_>> {
        Vec::new()
    }

    /// Side-effecting validator that reports through the scope.
    fn validator(&self) -> Option<&dyn Validator> {
        None
    }

    /// Validator that returns its failure.
    fn validator_with_error(&self) -> Option<&dyn ValidatorWithError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_keys_render_as_empty_or_zero() {
        let schema = ModelSchema::new("User", "users")
            .with_primary_key("id", json!(0))
            .with_primary_key("tenant", Value::Null);

        let values: Vec<String> = schema.primary_key_values().collect();
        assert_eq!(values, vec!["0".to_string(), String::new()]);
        assert!(schema.is_new_record());
    }

    #[test]
    fn string_keys_are_not_quoted() {
        let schema = ModelSchema::new("Language", "languages").with_primary_key("code", json!("en"));
        assert_eq!(schema.to_string(), "Language(en)");
        assert!(!schema.is_new_record());
    }

    #[test]
    fn schema_without_keys_counts_as_new() {
        let schema = ModelSchema::new("Note", "notes");
        assert!(schema.is_new_record());
        assert_eq!(schema.primary_key_values().count(), 0);
    }

    #[test]
    fn column_value_serializes_primitives() {
        assert_eq!(column_value("a@b.co"), json!("a@b.co"));
        assert_eq!(column_value(&7_u64), json!(7));
        assert_eq!(column_value(&Option::<String>::None), Value::Null);
    }
}
