//! Custom validator capabilities a model may expose.
//!
//! A model can implement neither, either or both. They are discovered through
//! [`Model::validator`](crate::Model::validator) and
//! [`Model::validator_with_error`](crate::Model::validator_with_error).

use crate::scope::{BoxError, Scope};

/// Validator that reports failures by registering them on the scope.
pub trait Validator {
    /// Validate the model, calling [`Scope::add_error`] for each failure.
    fn validate(&self, scope: &mut dyn Scope);
}

/// Validator that returns its failure.
pub trait ValidatorWithError {
    /// Validate the model; `Err` is registered on the operation by the caller.
    fn validate(&self, scope: &dyn Scope) -> Result<(), BoxError>;
}
