//! Version validation
//!
//! Tokens are opaque and only ever compared for equality. There is no
//! ordering between versions: a caller either holds the stored token or it
//! does not.

use recordstore_core::{RecordKey, Result, StoreError, VersionToken};
use tracing::debug;

/// Check that the caller's version matches the stored one
///
/// Returns [`StoreError::Conflict`] carrying both tokens when they differ.
/// Two missing tokens compare equal.
pub fn validate_version(
    key: &RecordKey,
    caller: Option<&VersionToken>,
    stored: Option<&VersionToken>,
) -> Result<()> {
    if caller == stored {
        return Ok(());
    }
    debug!(
        key = %key,
        caller = ?caller.map(VersionToken::as_str),
        stored = ?stored.map(VersionToken::as_str),
        "version mismatch"
    );
    Err(StoreError::Conflict {
        key: key.clone(),
        caller: caller.cloned(),
        stored: stored.cloned(),
    })
}
