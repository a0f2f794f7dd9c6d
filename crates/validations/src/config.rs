//! Hook registration settings.
//!
//! Precedence (highest wins): env overrides, config file, defaults.

use crate::callbacks::{CALLBACK_NAME, SKIP_VALIDATIONS};
use crate::env::ValidationsEnv;
use model_validations_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How and where the validation hook is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ValidationsConfig {
    /// Name the hook is registered under.
    pub callback_name: String,
    /// Per-operation setting that disables validation when `true`.
    pub skip_setting: String,
    /// Register on the create phase.
    pub on_create: bool,
    /// Register on the update phase.
    pub on_update: bool,
    /// Create callback the hook is placed before; appended when unset or absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_anchor: Option<String>,
    /// Update callback the hook is placed before; appended when unset or absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_anchor: Option<String>,
}

impl Default for ValidationsConfig {
    fn default() -> Self {
        Self {
            callback_name: CALLBACK_NAME.to_string(),
            skip_setting: SKIP_VALIDATIONS.to_string(),
            on_create: true,
            on_update: true,
            create_anchor: None,
            update_anchor: None,
        }
    }
}

impl ValidationsConfig {
    /// Reject blank names and anchors that point at the hook itself.
    pub fn validate(&self) -> Result<(), ErrorEnvelope> {
        if self.callback_name.trim().is_empty() {
            return Err(invalid_value("callbackName", "callbackName must be non-empty"));
        }
        if self.skip_setting.trim().is_empty() {
            return Err(invalid_value("skipSetting", "skipSetting must be non-empty"));
        }
        for (field, anchor) in [
            ("createAnchor", &self.create_anchor),
            ("updateAnchor", &self.update_anchor),
        ] {
            let Some(anchor) = anchor else {
                continue;
            };
            if anchor.trim().is_empty() {
                return Err(invalid_value(field, format!("{field} must be non-empty")));
            }
            if *anchor == self.callback_name {
                return Err(invalid_value(
                    field,
                    format!("{field} cannot name the validation callback itself"),
                ));
            }
        }
        Ok(())
    }
}

/// Config file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl ConfigFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ErrorEnvelope> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ErrorEnvelope::expected(
                ErrorCode::new("config", "unsupported_format"),
                "config file must end in .toml or .json",
            )
            .with_metadata("path", path.display().to_string())),
        }
    }
}

/// Parse a config document; missing keys take their defaults.
pub fn parse_config(input: &str, format: ConfigFormat) -> Result<ValidationsConfig, ErrorEnvelope> {
    let config: ValidationsConfig = match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        })?,
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        })?,
    };
    config.validate()?;
    Ok(config)
}

/// Apply env overrides on top of `config` and validate the result.
pub fn apply_env_overrides(
    mut config: ValidationsConfig,
    env: &ValidationsEnv,
) -> Result<ValidationsConfig, ErrorEnvelope> {
    if let Some(on_create) = env.on_create {
        config.on_create = on_create;
    }
    if let Some(on_update) = env.on_update {
        config.on_update = on_update;
    }
    if let Some(name) = &env.callback_name {
        config.callback_name.clone_from(name);
    }
    config.validate()?;
    Ok(config)
}

/// Load from optional config text and env overrides.
pub fn load_config_from_sources(
    config_text: Option<(&str, ConfigFormat)>,
    env: &ValidationsEnv,
) -> Result<ValidationsConfig, ErrorEnvelope> {
    let config = match config_text {
        None => ValidationsConfig::default(),
        Some((input, format)) => parse_config(input, format)?,
    };
    apply_env_overrides(config, env)
}

/// Load from an optional `.toml`/`.json` file and env overrides.
pub fn load_config_from_path(
    config_path: Option<&Path>,
    env: &ValidationsEnv,
) -> Result<ValidationsConfig, ErrorEnvelope> {
    let Some(path) = config_path else {
        return load_config_from_sources(None, env);
    };
    let format = ConfigFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.display().to_string())
    })?;
    load_config_from_sources(Some((text.as_str(), format)), env)
}

/// Load from an optional file and the process environment.
pub fn load_config_std_env(config_path: Option<&Path>) -> Result<ValidationsConfig, ErrorEnvelope> {
    let env = ValidationsEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_config_from_path(config_path, &env)
}

/// Pretty JSON with a trailing newline.
pub fn to_pretty_json(config: &ValidationsConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn invalid_value(field: &'static str, message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::new("config", "invalid_value"), message)
        .with_metadata("field", field)
}
