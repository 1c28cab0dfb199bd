//! Core types for recordstore
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`Record`]: the stored entity, with its [`RecordKey`] and [`VersionToken`]
//! - [`StoreError`]: structured error kinds (not found, conflict, consistency, storage, cancelled)
//! - [`Context`]: cancellation and deadline handle passed through storage calls

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod types;

pub use context::{CancelHandle, CancelReason, Context};
pub use error::{Result, StoreError};
pub use types::{Record, RecordKey, VersionToken};
