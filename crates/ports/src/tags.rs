//! Tag validation contract and raw failure shapes.
//!
//! Raw failures mirror what a tag engine reports: one leaf per failing field,
//! grouped into composites (a struct, or an embedded field group inside it).
//! Leaf text is deliberately engine-shaped (`"Password: 123 does not validate
//! as length(6|20)"`); turning it into a sentence is the caller's job.

use crate::scope::Scope;
use std::fmt;

/// Reason reported by the `required` rule.
pub const REQUIRED_REASON: &str = "non zero value required";

/// One field that failed one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    field: String,
    path: Vec<String>,
    reason: String,
    validator: String,
    custom_message: bool,
}

impl FieldFailure {
    /// Failure with a free-form reason.
    pub fn new(
        field: impl Into<String>,
        reason: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            path: Vec::new(),
            reason: reason.into(),
            validator: validator.into(),
            custom_message: false,
        }
    }

    /// Zero value on a `required` field.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, REQUIRED_REASON, "required")
    }

    /// A value rejected by a rule, rendered as `"{value} does not validate as {rule}"`.
    ///
    /// `rule` keeps its parameters (`length(6|20)`); the stored validator name
    /// drops them (`length`).
    pub fn rule(field: impl Into<String>, value: &str, rule: &str) -> Self {
        let validator = rule.split('(').next().unwrap_or(rule);
        Self::new(field, format!("{value} does not validate as {rule}"), validator)
    }

    /// A rule failure with a configured message that replaces the rendered text.
    pub fn custom(
        field: impl Into<String>,
        message: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            custom_message: true,
            ..Self::new(field, message, validator)
        }
    }

    /// Prefix the path with an enclosing field name.
    #[must_use]
    pub fn within(mut self, parent: &str) -> Self {
        self.path.insert(0, parent.to_string());
        self
    }

    /// Reported field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Enclosing field names, outermost first.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Rule outcome without the field prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Rule name (`required`, `length`, `email`, ...).
    #[must_use]
    pub fn validator(&self) -> &str {
        &self.validator
    }

    /// True when the reason is a configured message.
    #[must_use]
    pub const fn has_custom_message(&self) -> bool {
        self.custom_message
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.custom_message {
            return formatter.write_str(&self.reason);
        }
        for parent in &self.path {
            write!(formatter, "{parent}.")?;
        }
        write!(formatter, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldFailure {}

/// Failure reported by a tag engine: a leaf or an ordered group of failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// A single field failure.
    Leaf(FieldFailure),
    /// Failures of a struct or embedded field group, in field order.
    Composite(Vec<RawFailure>),
}

impl RawFailure {
    /// `Ok` when nothing failed, otherwise a composite of `failures`.
    pub fn collect(failures: Vec<Self>) -> Result<(), Self> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Self::Composite(failures))
        }
    }

    /// Prefix every leaf's path with an enclosing field name.
    #[must_use]
    pub fn within(self, parent: &str) -> Self {
        match self {
            Self::Leaf(failure) => Self::Leaf(failure.within(parent)),
            Self::Composite(children) => Self::Composite(
                children
                    .into_iter()
                    .map(|child| child.within(parent))
                    .collect(),
            ),
        }
    }
}

impl From<FieldFailure> for RawFailure {
    fn from(failure: FieldFailure) -> Self {
        Self::Leaf(failure)
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(failure) => failure.fmt(formatter),
            Self::Composite(children) => {
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        formatter.write_str(";")?;
                    }
                    child.fmt(formatter)?;
                }
                Ok(())
            },
        }
    }
}

impl std::error::Error for RawFailure {}

/// Field-annotation validation, usually derived with `#[derive(TagValidate)]`.
pub trait TagValidate {
    /// Run every field rule; `Err` carries all failures found.
    ///
    /// The scope is passed through to custom rules (e.g. uniqueness checks).
    fn validate_tags(&self, scope: &dyn Scope) -> Result<(), RawFailure>;
}
