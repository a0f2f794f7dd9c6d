//! # model-validations-ports
//!
//! Boundary contracts between a write pipeline (the host) and the validation
//! layer: how a model describes itself, what a write operation exposes to
//! callbacks, and the validator capabilities a model may opt into.
//!
//! This crate depends only on `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod capability;
pub mod model;
pub mod rules;
pub mod scope;
pub mod tags;

pub use capability::{Validator, ValidatorWithError};
pub use model::{
    Association, Model, ModelSchema, Row, column_value, is_zero_key, render_key,
};
pub use scope::{BoxError, Scope, Target};
pub use tags::{FieldFailure, REQUIRED_REASON, RawFailure, TagValidate};

pub use serde_json::Value;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_validations_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if !in_deps {
                continue;
            }
            if line.starts_with("model-validations") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_shared() {
        let deps = workspace_deps();
        assert_eq!(deps, vec!["model-validations-shared".to_string()]);
    }

    #[test]
    fn ports_can_use_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
