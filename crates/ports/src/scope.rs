//! Write operation boundary contract.

use crate::model::Model;
use model_validations_shared::Result;
use serde_json::Value;
use std::fmt;

/// Boxed error registered on a write operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The in-flight write operation as seen by callbacks and validators.
///
/// Errors are accumulated, never thrown: the host aborts the write when any
/// error is present after its callbacks ran.
pub trait Scope {
    /// Register an error on the operation.
    fn add_error(&mut self, error: BoxError);

    /// Errors registered so far, in registration order.
    fn errors(&self) -> &[BoxError];

    /// Per-operation setting, if present.
    fn setting(&self, key: &str) -> Option<&Value>;

    /// Count stored records of `table` whose `column` equals `value`.
    ///
    /// Reads see the operation's own transaction snapshot, including rows
    /// written earlier in the same operation.
    fn count(&self, table: &str, column: &str, value: &Value) -> Result<usize>;

    /// True once any error has been registered.
    fn has_error(&self) -> bool {
        !self.errors().is_empty()
    }

    /// Boolean setting; absent or non-boolean values read as `false`.
    fn flag(&self, key: &str) -> bool {
        self.setting(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// The value a write operation was handed.
pub enum Target<'a> {
    /// One record.
    Single(&'a dyn Model),
    /// An ordered collection of records of one type.
    Collection(Vec<&'a dyn Model>),
    /// Anything that is not a record (raw rows, column maps).
    Other,
}

impl<'a> Target<'a> {
    /// Records in processing order; empty for `Other`.
    #[must_use]
    pub fn models(&self) -> Vec<&'a dyn Model> {
        match self {
            Self::Single(model) => vec![*model],
            Self::Collection(models) => models.clone(),
            Self::Other => Vec::new(),
        }
    }

    /// Short shape name for logging.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Single(_) => "single",
            Self::Collection(_) => "collection",
            Self::Other => "other",
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(model) => formatter
                .debug_tuple("Single")
                .field(&model.schema())
                .finish(),
            Self::Collection(models) => formatter
                .debug_list()
                .entries(models.iter().map(|model| model.schema()))
                .finish(),
            Self::Other => formatter.write_str("Other"),
        }
    }
}
