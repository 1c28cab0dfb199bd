//! # recordstore
//!
//! A record store with optimistic concurrency control.
//!
//! Records are saved under generated keys. In the default optimistic mode
//! every save of an existing record carries the version token the caller
//! last read; if someone else saved in between, the save fails with a
//! conflict instead of silently overwriting their work. A last-write-wins
//! mode is available as a baseline.
//!
//! ## Quick Start
//!
//! ```ignore
//! use recordstore::prelude::*;
//!
//! let store = Store::open("./records.db")?;
//! let ctx = Context::new();
//!
//! let mut post = Record::new("Hello", "first draft");
//! store.save(&ctx, &mut post)?;
//!
//! // Another writer read the same version
//! let mut stale = post.clone();
//!
//! post.content = "second draft".into();
//! store.save(&ctx, &mut post)?;
//!
//! stale.content = "competing draft".into();
//! assert!(store.save(&ctx, &mut stale).unwrap_err().is_conflict());
//! ```
//!
//! ## Backends
//!
//! - SQLite file ([`Store::open`]): serializable saves via `BEGIN IMMEDIATE`
//! - Memory ([`Store::ephemeral`]): a single writer lease serializes saves
//!
//! ## Cancellation
//!
//! Every operation takes a [`Context`]. Cancel it from another thread with
//! a [`CancelHandle`] or give it a deadline with [`Context::with_timeout`].

#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Store, StoreBuilder};
pub use error::{Error, Result};

// Configuration
pub use config::{Backend, MigrationPolicy, StoreConfig};

// Re-export types
pub use types::*;
