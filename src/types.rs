//! Public types for the recordstore API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Records
pub use recordstore_core::Record;
pub use recordstore_core::RecordKey;
pub use recordstore_core::VersionToken;

// Cancellation
pub use recordstore_core::CancelHandle;
pub use recordstore_core::CancelReason;
pub use recordstore_core::Context;

// Store behaviour
pub use recordstore_primitives::ConcurrencyMode;
pub use recordstore_storage::JournalMode;
pub use recordstore_storage::Schema;
