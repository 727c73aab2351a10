#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Archive façade (groups, entries, lookups)
pub mod archive;

/// The mutation command language (descriptor, codec, builder)
pub mod command;

/// Configuration records
pub mod config;

/// Master credentials
pub mod credentials;

/// Storage datasource abstraction
pub mod datasource;

/// The encrypted envelope format
pub mod envelope;

/// Error (common error types)
pub mod error;

/// History compaction
pub mod flatten;

/// Reconciliation of divergent histories
pub mod sync;

/// The command executor
pub mod westley;

/// Workspace coordination and the per-archive save queue
pub mod workspace;

pub use archive::{Archive, Entry, EntryMut, Group, GroupMut, ARCHIVE_FORMAT};
pub use command::{Command, CommandBuilder, Slug};
pub use config::{EnvelopeConfig, ExecutorConfig};
pub use credentials::{Credentials, KeyDerivationParams};
pub use datasource::{Datasource, TextDatasource};
#[cfg(not(target_arch = "wasm32"))]
pub use datasource::FileDatasource;
pub use error::{ButtercupError, Result};
pub use flatten::Flattener;
pub use sync::{HistoryComparator, HistoryDiff};
pub use westley::Westley;
pub use workspace::Workspace;
