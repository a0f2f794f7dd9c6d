//! Result helpers for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn result_alias_defaults_to_envelope() {
        let value: Result<i32> = Err(ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad"));
        let mapped = value.map_err(|error| error.with_metadata("field", "name"));

        assert!(matches!(
            mapped,
            Err(ref error) if error.metadata.get("field").map(String::as_str) == Some("name")
        ));
    }
}
