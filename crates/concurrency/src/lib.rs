//! Concurrency layer for recordstore
//!
//! This crate implements the optimistic-concurrency pieces the versioned
//! store is built from:
//! - [`TransactionGuard`]: owns an open transaction and rolls it back on
//!   every exit path that does not commit
//! - [`validate_version`]: the compare step of compare-and-swap on version
//!   tokens

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod guard;
pub mod validation;

pub use guard::{TransactionGuard, TransactionStatus};
pub use validation::validate_version;
