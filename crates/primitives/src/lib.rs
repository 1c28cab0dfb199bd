//! Record stores for recordstore
//!
//! Two stores share one [`RecordStore`] interface:
//! - [`LastWriteWinsStore`]: unconditional updates; concurrent writers
//!   silently overwrite each other
//! - [`VersionedStore`]: compare-and-swap on a version token inside a
//!   serializable transaction; stale writers get a conflict
//!
//! Both are stateless facades over a [`recordstore_storage::Repository`]
//! and are `Send + Sync`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lww;
mod rows;
pub mod store;
pub mod versioned;

pub use lww::LastWriteWinsStore;
pub use store::{ConcurrencyMode, RecordStore};
pub use versioned::VersionedStore;
