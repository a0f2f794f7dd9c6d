//! # model-validations-store
//!
//! A small in-memory write pipeline that hosts callback plugins the way an
//! ORM does: named callbacks per phase, an operation scope that accumulates
//! errors, and a transaction that is rolled back when any error is present.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod callbacks;
pub mod db;
pub mod error;
pub mod statement;
pub mod tables;

pub use callbacks::{Callback, Callbacks, Phase, Processor};
pub use db::Db;
pub use error::{StoreError, WriteError};
pub use statement::{OperationScope, Settings, Statement, UPDATE_COLUMN_MARKER};
pub use tables::Tables;
