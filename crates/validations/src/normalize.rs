//! Rewrites raw tag-engine messages into field sentences.

use crate::error::ValidationError;
use model_validations_ports::{FieldFailure, Model, REQUIRED_REASON};
use regex::Regex;
use std::sync::LazyLock;

static LENGTH_BOUNDS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\(([0-9]+)\|([0-9]+)\)").ok());

/// Sentence for a raw message reported on `field`.
///
/// Known shapes are matched by substring in a fixed order; anything else,
/// including a length message without a `(min|max)` pair, is returned as is.
pub fn normalize(field: &str, raw: &str) -> String {
    if raw.contains(REQUIRED_REASON) {
        return format!("{field} can't be blank");
    }
    if raw.contains("as length") {
        return length_bounds(raw).map_or_else(
            || raw.to_string(),
            |(min, max)| format!("{field} is the wrong length (should be {min}~{max} characters)"),
        );
    }
    if raw.contains("as numeric") {
        return format!("{field} is not a number");
    }
    if raw.contains("as email") {
        return format!("{field} is not a valid email address");
    }
    raw.to_string()
}

/// Normalize a tag failure and attach it to the model it came from.
pub fn formatted_error(failure: &FieldFailure, resource: &dyn Model) -> ValidationError {
    let message = normalize(failure.field(), &failure.to_string());
    ValidationError::new(resource, failure.field(), message)
}

fn length_bounds(raw: &str) -> Option<(&str, &str)> {
    let captures = LENGTH_BOUNDS.as_ref()?.captures(raw)?;
    let min = captures.get(1)?.as_str();
    let max = captures.get(2)?.as_str();
    Some((min, max))
}
