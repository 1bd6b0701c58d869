//! Protocol-level errors.

use thiserror::Error;

/// Errors raised when decoding a message at the wire boundary.
///
/// Same-origin senders are normally trusted, but nothing stops a stray
/// participant from publishing on the same channel name, so the decode path
/// validates the tag and payload shape instead of panicking on junk.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
