//! Field-level validation error.

use model_validations_ports::{BoxError, Model, ModelSchema};
use model_validations_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// One field of one model that failed validation.
///
/// The model is captured as its schema description when the error is built,
/// so the error owns everything it needs to compute [`label`](Self::label).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    resource: ModelSchema,
    column: String,
    message: String,
}

impl ValidationError {
    /// Error for `column` of `resource`.
    pub fn new(resource: &dyn Model, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_schema(resource.schema(), column, message)
    }

    /// Error for an already described model.
    pub fn from_schema(
        resource: ModelSchema,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Schema of the model that failed.
    #[must_use]
    pub const fn resource(&self) -> &ModelSchema {
        &self.resource
    }

    /// Offending field name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Final message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `{TypeName}_{primary keys joined by "::"}_{column}`.
    ///
    /// Unset keys still render (`0` or empty), so this never fails.
    #[must_use]
    pub fn label(&self) -> String {
        let keys: Vec<String> = self.resource.primary_key_values().collect();
        format!(
            "{}_{}_{}",
            self.resource.type_name(),
            keys.join("::"),
            self.column
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<&ValidationError> for ErrorEnvelope {
    fn from(error: &ValidationError) -> Self {
        Self::expected(
            ErrorCode::new("validations", "invalid_field"),
            error.message.clone(),
        )
        .with_metadata("column", error.column.clone())
        .with_metadata("label", error.label())
        .with_metadata("model", error.resource.type_name())
    }
}

impl From<ValidationError> for ErrorEnvelope {
    fn from(error: ValidationError) -> Self {
        Self::from(&error)
    }
}

/// Validation errors among an operation's errors, in attachment order.
pub fn validation_errors(errors: &[BoxError]) -> impl Iterator<Item = &ValidationError> {
    errors
        .iter()
        .filter_map(|error| error.downcast_ref::<ValidationError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_validations_shared::ErrorKind;
    use serde_json::json;

    fn user(id: serde_json::Value) -> ModelSchema {
        ModelSchema::new("User", "users").with_primary_key("id", id)
    }

    #[test]
    fn display_is_the_message() {
        let error = ValidationError::from_schema(user(json!(1)), "Name", "invalid user name");
        assert_eq!(error.to_string(), "invalid user name");
        assert_eq!(error.column(), "Name");
    }

    #[test]
    fn label_joins_type_keys_and_column() {
        let error = ValidationError::from_schema(user(json!(12)), "Email", "taken");
        assert_eq!(error.label(), "User_12_Email");
    }

    #[test]
    fn label_renders_unset_keys() {
        let zero = ValidationError::from_schema(user(json!(0)), "Name", "blank");
        assert_eq!(zero.label(), "User_0_Name");

        let composite = ModelSchema::new("Membership", "memberships")
            .with_primary_key("user_id", json!(3))
            .with_primary_key("group", serde_json::Value::Null);
        let error = ValidationError::from_schema(composite, "Role", "blank");
        assert_eq!(error.label(), "Membership_3::_Role");
    }

    #[test]
    fn envelope_carries_identity() {
        let error = ValidationError::from_schema(user(json!(5)), "Email", "taken");
        let envelope = ErrorEnvelope::from(&error);

        assert_eq!(envelope.kind, ErrorKind::Expected);
        assert_eq!(envelope.code, ErrorCode::new("validations", "invalid_field"));
        assert_eq!(envelope.message, "taken");
        assert_eq!(
            envelope.metadata.get("label").map(String::as_str),
            Some("User_5_Email")
        );
    }

    #[test]
    fn validation_errors_skips_other_errors() {
        let errors: Vec<BoxError> = vec![
            "invalid company name".into(),
            Box::new(ValidationError::from_schema(user(json!(0)), "Name", "blank")),
        ];
        let found: Vec<&str> = validation_errors(&errors).map(ValidationError::column).collect();
        assert_eq!(found, vec!["Name"]);
    }
}
