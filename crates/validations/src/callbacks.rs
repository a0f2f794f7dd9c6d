//! The validation hook and its registration on a [`Db`].

use crate::config::ValidationsConfig;
use crate::flatten::flatten;
use crate::normalize::formatted_error;
use model_validations_ports::{Model, Scope};
use model_validations_shared::ErrorEnvelope;
use model_validations_store::{Callback, Db, Phase, Statement, UPDATE_COLUMN_MARKER};
use std::sync::Arc;
use tracing::debug;

/// Name the hook is registered under by default.
pub const CALLBACK_NAME: &str = "validations:validate";

/// Per-operation setting that disables validation when `true`.
pub const SKIP_VALIDATIONS: &str = "validations:skip_validations";

/// Outcome of a registration call, per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registration {
    /// The hook was newly added to the create phase.
    pub create: bool,
    /// The hook was newly added to the update phase.
    pub update: bool,
}

/// Validate the statement's target with the default skip setting.
pub fn validate(statement: &mut Statement<'_>) {
    validate_with(statement, SKIP_VALIDATIONS);
}

/// Validate the statement's target, honoring `skip_setting`.
///
/// Nothing runs for column-only updates, for operations that opted out, or
/// when an earlier callback already registered an error. Otherwise every
/// model of the target is validated in order and each failure is registered
/// on the statement's scope; aborting the write is left to the host.
pub fn validate_with(statement: &mut Statement<'_>, skip_setting: &str) {
    let Statement { target, scope, .. } = statement;

    if scope.flag(UPDATE_COLUMN_MARKER) {
        debug!(reason = "update_column", "skipping validation");
        return;
    }
    if scope.flag(skip_setting) {
        debug!(reason = "skip_setting", setting = skip_setting, "skipping validation");
        return;
    }
    if scope.has_error() {
        debug!(
            reason = "existing_error",
            errors = scope.errors().len(),
            "skipping validation"
        );
        return;
    }

    let models = target.models();
    debug!(target = target.shape(), models = models.len(), "validating write target");
    for model in models {
        validate_model(model, scope);
    }
}

/// Run both validator capabilities, then the tag rules, for one model.
pub fn validate_model(model: &dyn Model, scope: &mut dyn Scope) {
    if let Some(validator) = model.validator() {
        validator.validate(scope);
    }
    if let Some(validator) = model.validator_with_error() {
        if let Err(error) = validator.validate(scope) {
            scope.add_error(error);
        }
    }
    if let Err(raw) = model.validate_tags(scope) {
        for failure in flatten(raw) {
            scope.add_error(Box::new(formatted_error(&failure, model)));
        }
    }
}

/// Register the hook on both phases with the default settings.
pub fn register_callbacks(db: &Db) -> Result<Registration, ErrorEnvelope> {
    register_callbacks_with(db, &ValidationsConfig::default())
}

/// Register the hook as configured.
///
/// A phase that already has a callback under the configured name keeps it,
/// so registering twice never validates twice.
pub fn register_callbacks_with(
    db: &Db,
    config: &ValidationsConfig,
) -> Result<Registration, ErrorEnvelope> {
    config.validate()?;
    let skip_setting = config.skip_setting.clone();
    let callback: Callback = Arc::new(move |statement: &mut Statement<'_>| {
        validate_with(statement, &skip_setting);
    });

    let registration = db.with_callbacks(|callbacks| {
        let mut registration = Registration::default();
        let phases = [
            (Phase::Create, config.on_create, config.create_anchor.as_deref()),
            (Phase::Update, config.on_update, config.update_anchor.as_deref()),
        ];
        for (phase, enabled, anchor) in phases {
            if !enabled {
                continue;
            }
            let processor = callbacks.processor_mut(phase);
            if processor.get(&config.callback_name).is_some() {
                debug!(
                    %phase,
                    name = %config.callback_name,
                    "validation callback already registered"
                );
                continue;
            }
            let name = config.callback_name.clone();
            let added = match anchor {
                Some(anchor) => processor.register_before(anchor, name, Arc::clone(&callback)),
                None => processor.register(name, Arc::clone(&callback)),
            };
            debug!(
                %phase,
                name = %config.callback_name,
                anchor,
                "registered validation callback"
            );
            match phase {
                Phase::Create => registration.create = added,
                Phase::Update => registration.update = added,
            }
        }
        registration
    })?;

    Ok(registration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback {
        Arc::new(|_statement: &mut Statement<'_>| {})
    }

    #[test]
    fn registers_on_both_phases_once() -> Result<(), ErrorEnvelope> {
        let db = Db::new();
        let first = register_callbacks(&db)?;
        let second = register_callbacks(&db)?;

        assert_eq!(first, Registration { create: true, update: true });
        assert_eq!(second, Registration::default());
        assert_eq!(db.callback_names(Phase::Create)?, vec![CALLBACK_NAME.to_string()]);
        assert_eq!(db.callback_names(Phase::Update)?, vec![CALLBACK_NAME.to_string()]);
        Ok(())
    }

    #[test]
    fn anchor_places_hook_before_it() -> Result<(), ErrorEnvelope> {
        let db = Db::new();
        db.with_callbacks(|callbacks| {
            callbacks.create().register("stamp", noop());
            callbacks.create().register("audit", noop());
        })?;
        let config = ValidationsConfig {
            create_anchor: Some("audit".to_string()),
            on_update: false,
            ..ValidationsConfig::default()
        };

        let registration = register_callbacks_with(&db, &config)?;

        assert_eq!(registration, Registration { create: true, update: false });
        assert_eq!(
            db.callback_names(Phase::Create)?,
            vec!["stamp", CALLBACK_NAME, "audit"]
        );
        assert!(db.callback_names(Phase::Update)?.is_empty());
        Ok(())
    }

    #[test]
    fn existing_callback_under_the_name_is_kept() -> Result<(), ErrorEnvelope> {
        let db = Db::new();
        let existing = noop();
        db.with_callbacks(|callbacks| callbacks.update().register(CALLBACK_NAME, Arc::clone(&existing)))?;

        let registration = register_callbacks(&db)?;

        assert_eq!(registration, Registration { create: true, update: false });
        let kept = db.with_callbacks(|callbacks| {
            callbacks
                .processor(Phase::Update)
                .get(CALLBACK_NAME)
                .is_some_and(|stored| Arc::ptr_eq(stored, &existing))
        })?;
        assert!(kept);
        Ok(())
    }

    #[test]
    fn invalid_config_registers_nothing() -> Result<(), ErrorEnvelope> {
        let db = Db::new();
        let config = ValidationsConfig {
            callback_name: "  ".to_string(),
            ..ValidationsConfig::default()
        };

        assert!(register_callbacks_with(&db, &config).is_err());
        assert!(db.callback_names(Phase::Create)?.is_empty());
        Ok(())
    }
}
