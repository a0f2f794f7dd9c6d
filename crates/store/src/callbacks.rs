//! Named callbacks per write phase.

use crate::statement::Statement;
use std::fmt;
use std::sync::Arc;

/// A callback run against every write of its phase.
///
/// It may read through a clone of the owning [`Db`](crate::Db); writing
/// through one blocks, because writes are serialized.
pub type Callback = Arc<dyn Fn(&mut Statement<'_>) + Send + Sync>;

/// Write phase a processor serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Inserting new records.
    Create,
    /// Updating stored records.
    Update,
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => formatter.write_str("create"),
            Self::Update => formatter.write_str("update"),
        }
    }
}

/// Ordered, uniquely named callbacks of one phase.
#[derive(Default, Clone)]
pub struct Processor {
    entries: Vec<(String, Callback)>,
}

impl Processor {
    /// Callback registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Callback> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, callback)| callback)
    }

    /// Append a callback; returns `false` and keeps the existing entry when
    /// `name` is taken.
    pub fn register(&mut self, name: impl Into<String>, callback: Callback) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.entries.push((name, callback));
        true
    }

    /// Insert a callback ahead of `anchor`, or append it when `anchor` is not
    /// registered. Returns `false` when `name` is taken.
    pub fn register_before(
        &mut self,
        anchor: &str,
        name: impl Into<String>,
        callback: Callback,
    ) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        match self.entries.iter().position(|(entry, _)| entry == anchor) {
            Some(index) => self.entries.insert(index, (name, callback)),
            None => self.entries.push((name, callback)),
        }
        true
    }

    /// Remove a callback; returns `false` when none was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| entry != name);
        self.entries.len() != before
    }

    /// Registered names in run order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Snapshot of the callbacks in run order.
    #[must_use]
    pub fn callbacks(&self) -> Vec<Callback> {
        self.entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.names()).finish()
    }
}

/// Callback registry of a [`Db`](crate::Db).
#[derive(Debug, Default, Clone)]
pub struct Callbacks {
    create: Processor,
    update: Processor,
}

impl Callbacks {
    /// Processor for creates.
    pub fn create(&mut self) -> &mut Processor {
        &mut self.create
    }

    /// Processor for updates.
    pub fn update(&mut self) -> &mut Processor {
        &mut self.update
    }

    /// Processor serving `phase`.
    #[must_use]
    pub const fn processor(&self, phase: Phase) -> &Processor {
        match phase {
            Phase::Create => &self.create,
            Phase::Update => &self.update,
        }
    }

    /// Mutable processor serving `phase`.
    pub fn processor_mut(&mut self, phase: Phase) -> &mut Processor {
        match phase {
            Phase::Create => &mut self.create,
            Phase::Update => &mut self.update,
        }
    }
}
