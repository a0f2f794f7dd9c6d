//! The in-flight write operation handed to callbacks.

use crate::callbacks::Phase;
use crate::tables::Tables;
use model_validations_ports::{BoxError, Scope, Target, Value};
use model_validations_shared::Result;
use std::collections::BTreeMap;
use std::fmt;

/// Setting set on column-only updates. Validation callbacks skip them.
pub const UPDATE_COLUMN_MARKER: &str = "store:update_column";

/// Per-operation settings.
pub type Settings = BTreeMap<String, Value>;

/// One write operation: what is written and where its errors go.
///
/// The fields are public so a callback can iterate `target` while registering
/// errors on `scope`.
#[derive(Debug)]
pub struct Statement<'a> {
    /// Phase being run.
    pub phase: Phase,
    /// Value handed to the write.
    pub target: Target<'a>,
    /// Error sink and settings of the operation.
    pub scope: OperationScope<'a>,
}

/// [`Scope`] implementation for one write operation.
pub struct OperationScope<'a> {
    settings: &'a Settings,
    tables: &'a Tables,
    errors: Vec<BoxError>,
}

impl<'a> OperationScope<'a> {
    /// Scope reading `tables` (the operation's transaction snapshot).
    #[must_use]
    pub const fn new(settings: &'a Settings, tables: &'a Tables) -> Self {
        Self {
            settings,
            tables,
            errors: Vec::new(),
        }
    }

    /// Errors registered during the operation, in order.
    #[must_use]
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }
}

impl Scope for OperationScope<'_> {
    fn add_error(&mut self, error: BoxError) {
        self.errors.push(error);
    }

    fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    fn count(&self, table: &str, column: &str, value: &Value) -> Result<usize> {
        Ok(self.tables.count(table, column, value))
    }
}

impl fmt::Debug for OperationScope<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OperationScope")
            .field("settings", self.settings)
            .field("errors", &self.errors.len())
            .finish_non_exhaustive()
    }
}
