//! Convenient imports for recordstore.
//!
//! ```ignore
//! use recordstore::prelude::*;
//!
//! let store = Store::ephemeral()?;
//! store.save(&Context::new(), &mut Record::new("title", "content"))?;
//! ```

// Main entry point
pub use crate::database::{Store, StoreBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::StoreConfig;

// Core types
pub use crate::types::{CancelHandle, ConcurrencyMode, Context, Record, RecordKey, VersionToken};
