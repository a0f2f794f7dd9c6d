//! Write pipeline errors.

use model_validations_ports::BoxError;
use model_validations_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::fmt;

/// Storage faults raised by the pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record with the same primary key already exists.
    #[error("duplicate primary key {key} in table {table}")]
    DuplicateKey {
        /// Table name.
        table: String,
        /// Rendered primary key.
        key: String,
    },
    /// An update addressed a record that is not stored.
    #[error("record {key} not found in table {table}")]
    MissingRecord {
        /// Table name.
        table: String,
        /// Rendered primary key.
        key: String,
    },
    /// An update was issued for a model without primary key values.
    #[error("cannot update {type_name} without a primary key value")]
    MissingPrimaryKey {
        /// Declared model type.
        type_name: String,
    },
    /// A lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for ErrorEnvelope {
    fn from(error: StoreError) -> Self {
        let message = error.to_string();
        match error {
            StoreError::DuplicateKey { table, key } => {
                Self::expected(ErrorCode::new("store", "duplicate_key"), message)
                    .with_metadata("table", table)
                    .with_metadata("key", key)
            },
            StoreError::MissingRecord { table, key } => {
                Self::expected(ErrorCode::not_found(), message)
                    .with_metadata("table", table)
                    .with_metadata("key", key)
            },
            StoreError::MissingPrimaryKey { type_name } => {
                Self::expected(ErrorCode::invalid_input(), message)
                    .with_metadata("model", type_name)
            },
            StoreError::Poisoned => {
                Self::unexpected(ErrorCode::internal(), message, ErrorClass::NonRetriable)
            },
        }
    }
}

/// A rejected write: every error attached during the operation.
#[derive(Debug)]
pub struct WriteError {
    errors: Vec<BoxError>,
}

impl WriteError {
    /// Wrap the errors of an aborted operation.
    #[must_use]
    pub const fn new(errors: Vec<BoxError>) -> Self {
        Self { errors }
    }

    /// Errors in attachment order.
    #[must_use]
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }

    /// Owned errors in attachment order.
    #[must_use]
    pub fn into_errors(self) -> Vec<BoxError> {
        self.errors
    }
}

impl From<StoreError> for WriteError {
    fn from(error: StoreError) -> Self {
        Self::new(vec![Box::new(error)])
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                formatter.write_str("; ")?;
            }
            write!(formatter, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for WriteError {}

#[cfg(test)]
mod tests {
    use super::*;
    use model_validations_shared::ErrorKind;

    #[test]
    fn write_error_joins_messages() {
        let error = WriteError::new(vec![
            "Name can't be blank".into(),
            "Email is not a valid email address".into(),
        ]);
        assert_eq!(
            error.to_string(),
            "Name can't be blank; Email is not a valid email address"
        );
        assert_eq!(error.errors().len(), 2);
    }

    #[test]
    fn duplicate_key_maps_to_expected_envelope() {
        let envelope = ErrorEnvelope::from(StoreError::DuplicateKey {
            table: "users".to_string(),
            key: "1".to_string(),
        });
        assert_eq!(envelope.kind, ErrorKind::Expected);
        assert_eq!(envelope.code, ErrorCode::new("store", "duplicate_key"));
        assert_eq!(
            envelope.metadata.get("table").map(String::as_str),
            Some("users")
        );
    }

    #[test]
    fn poisoned_lock_is_unexpected() {
        let envelope = ErrorEnvelope::from(StoreError::Poisoned);
        assert_eq!(envelope.kind, ErrorKind::Unexpected);
    }
}
