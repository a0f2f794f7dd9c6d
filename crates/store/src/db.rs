//! Write pipeline handle.
//!
//! Every write runs inside one transaction: the registered callbacks for its
//! phase see a snapshot of the tables, associations go through the same
//! pipeline, and the snapshot replaces the stored tables only when no error
//! was registered anywhere along the way.
//!
//! Writes are serialized. No table lock is held while callbacks run, so a
//! callback may read through any handle to the same store; it sees committed
//! rows only; the in-flight ones are visible through its scope.

use crate::callbacks::{Callbacks, Phase};
use crate::error::{StoreError, WriteError};
use crate::statement::{OperationScope, Settings, Statement, UPDATE_COLUMN_MARKER};
use crate::tables::Tables;
use model_validations_ports::{Association, BoxError, Model, ModelSchema, Row, Target, Value};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Inner {
    tables: RwLock<Tables>,
    callbacks: RwLock<Callbacks>,
    writer: Mutex<()>,
}

/// Cloneable handle to an in-memory store and its callback registry.
///
/// Clones share storage and callbacks; settings added with [`Db::set`] only
/// apply to the returned handle.
///
/// Callbacks may call [`Db::find`], [`Db::count`] and [`Db::rows`] on a clone.
/// They must not write through one: writes wait for the running write, so a
/// nested write never starts.
///
/// Associated rows get their owner's key in the association's foreign key
/// column when the row has that column and the owner has a single primary key.
/// Nothing else about foreign keys is maintained.
#[derive(Debug, Clone, Default)]
pub struct Db {
    inner: Arc<Inner>,
    settings: Settings,
}

impl Db {
    /// Empty store with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle whose operations carry an extra setting.
    #[must_use]
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut settings = self.settings.clone();
        settings.insert(key.into(), value.into());
        Self {
            inner: Arc::clone(&self.inner),
            settings,
        }
    }

    /// Settings carried by this handle.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutate the callback registry.
    pub fn with_callbacks<R>(&self, edit: impl FnOnce(&mut Callbacks) -> R) -> Result<R, StoreError> {
        let mut callbacks = self
            .inner
            .callbacks
            .write()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(edit(&mut callbacks))
    }

    /// Callback names registered for `phase`, in run order.
    pub fn callback_names(&self, phase: Phase) -> Result<Vec<String>, StoreError> {
        let callbacks = self
            .inner
            .callbacks
            .read()
            .map_err(|_| StoreError::Poisoned)?;
        Ok(callbacks
            .processor(phase)
            .names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Insert one record and its associations.
    pub fn create(&self, model: &dyn Model) -> Result<(), WriteError> {
        self.transaction(&self.settings, |tx| {
            tx.write_models(Phase::Create, Target::Single(model), None)
        })
    }

    /// Insert a collection of records as one operation.
    pub fn create_batch<M: Model>(&self, models: &[M]) -> Result<(), WriteError> {
        let targets: Vec<&dyn Model> = models
            .iter()
            .map(|model| {
                let model: &dyn Model = model;
                model
            })
            .collect();
        self.transaction(&self.settings, |tx| {
            tx.write_models(Phase::Create, Target::Collection(targets), None)
        })
    }

    /// Update a stored record and its associations.
    ///
    /// New records among the associations are inserted.
    pub fn update(&self, model: &dyn Model) -> Result<(), WriteError> {
        let schema = model.schema();
        if schema.is_new_record() {
            return Err(StoreError::MissingPrimaryKey {
                type_name: schema.type_name().to_string(),
            }
            .into());
        }
        self.transaction(&self.settings, |tx| {
            tx.write_models(Phase::Update, Target::Single(model), None)
        })
    }

    /// Create when the primary key is unset, update otherwise.
    pub fn save(&self, model: &dyn Model) -> Result<(), WriteError> {
        if model.schema().is_new_record() {
            self.create(model)
        } else {
            self.update(model)
        }
    }

    /// Overwrite a single column of a stored record.
    ///
    /// The operation carries [`UPDATE_COLUMN_MARKER`]; associations are not
    /// written.
    pub fn update_column(
        &self,
        model: &dyn Model,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<(), WriteError> {
        let value = value.into();
        let mut settings = self.settings.clone();
        settings.insert(UPDATE_COLUMN_MARKER.to_string(), Value::Bool(true));
        self.transaction(&settings, |tx| {
            tx.run_callbacks(Phase::Update, Target::Single(model))?;
            let schema = model.schema();
            if schema.is_new_record() {
                return Err(vec![boxed(StoreError::MissingPrimaryKey {
                    type_name: schema.type_name().to_string(),
                })]);
            }
            tx.tables
                .set_column(schema.table(), schema.primary_keys(), column, value)
                .map_err(|error| vec![boxed(error)])
        })
    }

    /// Insert a raw row that is not a model.
    pub fn create_row(&self, table: &str, row: Row) -> Result<(), WriteError> {
        self.transaction(&self.settings, |tx| {
            tx.run_callbacks(Phase::Create, Target::Other)?;
            tx.tables
                .insert(table, row, &[])
                .map(drop)
                .map_err(|error| vec![boxed(error)])
        })
    }

    /// Stored rows of `table` whose `column` equals `value`.
    pub fn find(&self, table: &str, column: &str, value: &Value) -> Result<Vec<Row>, StoreError> {
        let tables = self.inner.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.find(table, column, value))
    }

    /// Number of stored rows of `table` whose `column` equals `value`.
    pub fn count(&self, table: &str, column: &str, value: &Value) -> Result<usize, StoreError> {
        let tables = self.inner.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.count(table, column, value))
    }

    /// Every stored row of `table`.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let tables = self.inner.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.rows(table).to_vec())
    }

    // The table lock is only taken to copy the snapshot and to commit it.
    fn transaction<F>(&self, settings: &Settings, body: F) -> Result<(), WriteError>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<(), Vec<BoxError>>,
    {
        let _writer = self.inner.writer.lock().map_err(|_| StoreError::Poisoned)?;
        let callbacks = self
            .inner
            .callbacks
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .clone();
        let snapshot = self
            .inner
            .tables
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .clone();
        let mut tx = Transaction {
            callbacks: &callbacks,
            settings,
            tables: snapshot,
        };

        match body(&mut tx) {
            Ok(()) => {
                let mut stored = self
                    .inner
                    .tables
                    .write()
                    .map_err(|_| StoreError::Poisoned)?;
                *stored = tx.tables;
                Ok(())
            },
            Err(errors) => {
                warn!(errors = errors.len(), "write rolled back");
                Err(WriteError::new(errors))
            },
        }
    }
}

struct Transaction<'s> {
    callbacks: &'s Callbacks,
    settings: &'s Settings,
    tables: Tables,
}

impl Transaction<'_> {
    fn run_callbacks(&self, phase: Phase, target: Target<'_>) -> Result<(), Vec<BoxError>> {
        let callbacks = self.callbacks.processor(phase).callbacks();
        debug!(
            %phase,
            target = target.shape(),
            callbacks = callbacks.len(),
            "running write callbacks"
        );
        let mut statement = Statement {
            phase,
            target,
            scope: OperationScope::new(self.settings, &self.tables),
        };
        for callback in &callbacks {
            callback(&mut statement);
        }

        let errors = statement.scope.into_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            debug!(%phase, errors = errors.len(), "write callbacks registered errors");
            Err(errors)
        }
    }

    fn write_models(
        &mut self,
        phase: Phase,
        target: Target<'_>,
        owner: Option<&OwnerKey>,
    ) -> Result<(), Vec<BoxError>> {
        let models = target.models();
        self.run_callbacks(phase, target)?;

        for model in models {
            let stored = self
                .persist(phase, model, owner)
                .map_err(|error| vec![boxed(error)])?;
            let schema = model.schema();
            for association in model.associations() {
                let association_phase = phase_for(&association);
                let owner_key = owner_reference(&schema, &stored, association.foreign_key());
                debug!(
                    association = association.name(),
                    phase = %association_phase,
                    foreign_key = association.foreign_key(),
                    "writing association"
                );
                self.write_models(association_phase, association.into_target(), owner_key.as_ref())?;
            }
        }
        Ok(())
    }

    // Update-phase records without a key are new members of a saved
    // association and are inserted.
    fn persist(
        &mut self,
        phase: Phase,
        model: &dyn Model,
        owner: Option<&OwnerKey>,
    ) -> Result<Row, StoreError> {
        let schema = model.schema();
        let mut row = model.row();
        if let Some((column, value)) = owner {
            if let Some(slot) = row.get_mut(*column) {
                slot.clone_from(value);
            }
        }
        if phase == Phase::Create || schema.is_new_record() {
            self.tables.insert(schema.table(), row, schema.primary_keys())
        } else {
            self.tables.upsert(schema.table(), row, schema.primary_keys())
        }
    }
}

/// Foreign key column and the owner's stored key value.
type OwnerKey = (&'static str, Value);

fn owner_reference(schema: &ModelSchema, stored: &Row, foreign_key: &'static str) -> Option<OwnerKey> {
    let [(column, _)] = schema.primary_keys() else {
        return None;
    };
    stored
        .get(*column)
        .map(|value| (foreign_key, value.clone()))
}

// Associations are saved: created when every record is new, updated otherwise.
fn phase_for(association: &Association<'_>) -> Phase {
    let all_new = match association {
        Association::One { model, .. } => model.schema().is_new_record(),
        Association::Many { models, .. } => models
            .iter()
            .all(|model| model.schema().is_new_record()),
    };
    if all_new { Phase::Create } else { Phase::Update }
}

fn boxed(error: StoreError) -> BoxError {
    Box::new(error)
}
