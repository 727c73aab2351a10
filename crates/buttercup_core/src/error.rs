//! Error (common error types)

use thiserror::Error;

/// Unified error type for archive operations.
///
/// Command-level errors (`InvalidCommand`, `EntityNotFound`, `DuplicateId`,
/// `InvalidMove`) leave the archive unchanged. Datasource and envelope errors
/// surface from load/save; a failed save keeps the dirty flag set.
#[derive(Debug, Error)]
pub enum ButtercupError {
    /// A history line could not be decoded or failed validation.
    ///
    /// Covers unknown slugs, malformed quoting, and wrong argument counts.
    #[error("invalid command '{line}': {reason}")]
    InvalidCommand {
        /// The offending history line
        line: String,
        /// Description of what is wrong with it
        reason: String,
    },

    /// A command referenced a group or entry ID that does not exist.
    #[error("no group or entry with id '{0}'")]
    EntityNotFound(String),

    /// A creation command collided with an existing ID.
    #[error("id '{0}' already exists in this archive")]
    DuplicateId(String),

    /// A group move would create a cycle.
    #[error("cannot move group '{group}' into '{target}': target is a descendant")]
    InvalidMove {
        /// Group being moved
        group: String,
        /// Requested new parent
        target: String,
    },

    /// The envelope signature is missing or names an unsupported version.
    #[error("unrecognized archive format: {0}")]
    UnrecognizedFormat(String),

    /// Decryption failed: wrong password, bad HMAC, or a damaged payload.
    ///
    /// Tampering and truncation are deliberately indistinguishable from a
    /// wrong password.
    #[error("authentication failed: cannot decrypt archive")]
    AuthenticationFailure,

    /// A datasource transport failure.
    #[error("network error: {message}")]
    Network {
        /// Transport-level description
        message: String,
    },

    /// The remote rejected a save (e.g. version/ETag mismatch).
    #[error("remote rejected save: {message}")]
    Conflict {
        /// Remote-provided description
        message: String,
    },

    /// The datasource has no archive to load.
    #[error("archive not found: {0}")]
    NotFound(String),

    /// IO failure from a file-backed datasource.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A replay produced an inconsistent tree. Fatal: callers should treat
    /// this as corruption and abort rather than continue with partial state.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ButtercupError>;
