//! Environment overrides for [`ValidationsConfig`](crate::ValidationsConfig).
//!
//! Env vars are read into a map first so parsing stays testable without
//! touching the process environment.

use model_validations_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: register the hook on creates.
pub const ENV_ON_CREATE: &str = "MODEL_VALIDATIONS_ON_CREATE";
/// Env var: register the hook on updates.
pub const ENV_ON_UPDATE: &str = "MODEL_VALIDATIONS_ON_UPDATE";
/// Env var: callback name override.
pub const ENV_CALLBACK_NAME: &str = "MODEL_VALIDATIONS_CALLBACK_NAME";

/// Parsed env overrides; `None` leaves the configured value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationsEnv {
    /// Override for `onCreate`.
    pub on_create: Option<bool>,
    /// Override for `onUpdate`.
    pub on_update: Option<bool>,
    /// Override for `callbackName`.
    pub callback_name: Option<String>,
}

impl ValidationsEnv {
    /// Parse overrides from a name → value map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            on_create: parse_optional_bool(map, ENV_ON_CREATE)?,
            on_update: parse_optional_bool(map, ENV_ON_UPDATE)?,
            callback_name: parse_optional_trimmed_string(map, ENV_CALLBACK_NAME)?,
        })
    }

    /// Parse overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in [ENV_ON_CREATE, ENV_ON_UPDATE, ENV_CALLBACK_NAME] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }
}

/// Invalid env var values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let message = error.to_string();
        match error {
            EnvParseError::EmptyValue { var } => {
                Self::expected(ErrorCode::new("config", "empty_env_var"), message)
                    .with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value } => {
                Self::expected(ErrorCode::new("config", "invalid_env_bool"), message)
                    .with_metadata("env_var", var)
                    .with_metadata("value", value)
            },
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<String>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed.to_string()))
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn empty_map_overrides_nothing() -> Result<(), EnvParseError> {
        assert_eq!(ValidationsEnv::from_map(&BTreeMap::new())?, ValidationsEnv::default());
        Ok(())
    }

    #[test]
    fn booleans_accept_common_spellings() -> Result<(), EnvParseError> {
        let parsed = ValidationsEnv::from_map(&env(&[
            (ENV_ON_CREATE, " Yes "),
            (ENV_ON_UPDATE, "off"),
            (ENV_CALLBACK_NAME, "  app:validate "),
        ]))?;
        assert_eq!(parsed.on_create, Some(true));
        assert_eq!(parsed.on_update, Some(false));
        assert_eq!(parsed.callback_name.as_deref(), Some("app:validate"));
        Ok(())
    }

    #[test]
    fn invalid_bool_is_reported_with_value() {
        let error = ValidationsEnv::from_map(&env(&[(ENV_ON_CREATE, "maybe")]));
        assert_eq!(
            error,
            Err(EnvParseError::InvalidBool {
                var: ENV_ON_CREATE,
                value: "maybe".to_string(),
            })
        );

        let envelope = ErrorEnvelope::from(EnvParseError::InvalidBool {
            var: ENV_ON_CREATE,
            value: "maybe".to_string(),
        });
        assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_bool"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let error = ValidationsEnv::from_map(&env(&[(ENV_CALLBACK_NAME, "   ")]));
        assert_eq!(
            error,
            Err(EnvParseError::EmptyValue {
                var: ENV_CALLBACK_NAME
            })
        );
    }
}
