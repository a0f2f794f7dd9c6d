//! # model-validations
//!
//! Validation for model writes. A hook registered on a [`Db`]'s create and
//! update phases runs each model's custom validators and its derived tag
//! rules, turns every failure into a [`ValidationError`], and registers them
//! all on the write so it is aborted with the complete list.
//!
//! ```ignore
//! let db = Db::new();
//! model_validations::register_callbacks(&db)?;
//! let error = db.save(&user).unwrap_err();
//! assert_eq!(error.to_string(), "Name can't be blank; Email is not a valid email address");
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod callbacks;
pub mod config;
pub mod env;
pub mod error;
pub mod flatten;
pub mod normalize;

pub use callbacks::{
    CALLBACK_NAME, Registration, SKIP_VALIDATIONS, register_callbacks, register_callbacks_with,
    validate, validate_model, validate_with,
};
pub use config::{
    ConfigFormat, ValidationsConfig, apply_env_overrides, load_config_from_path,
    load_config_from_sources, load_config_std_env, parse_config, to_pretty_json,
};
pub use env::{EnvParseError, ValidationsEnv};
pub use error::{ValidationError, validation_errors};
pub use flatten::flatten;
pub use normalize::{formatted_error, normalize};

pub use model_validations_store::Db;
