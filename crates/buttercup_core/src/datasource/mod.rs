//! Storage datasource abstraction.
//!
//! A datasource is a capability set — load, save, describe — over wherever
//! an envelope lives. The canonical implementation is [`TextDatasource`],
//! whose content IS the envelope text; remote kinds compose a transport
//! with a text datasource rather than reimplementing decryption.
//!
//! ## Object safety
//!
//! `Datasource` is designed to be object-safe so it can be used behind
//! `dyn Datasource` (the workspace stores one). All async methods return
//! boxed futures; the core never depends on a specific runtime.

mod file;
mod registry;
mod text;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileDatasource;
pub use registry::{datasource_from_object, register_datasource, DatasourceFactory};
pub use text::TextDatasource;

use std::future::Future;
use std::pin::Pin;

use crate::credentials::Credentials;
use crate::error::Result;

/// A boxed future for object-safe async methods.
///
/// Futures are `Send` so datasources can be driven from multi-threaded
/// runtimes; the engine itself never spawns.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Pluggable storage backend for one archive.
pub trait Datasource: Send + Sync + std::fmt::Debug {
    /// Datasource kind tag (`"text"`, `"file"`, remote kinds...).
    ///
    /// Authoritative for the workspace's clear-before-reload behavior:
    /// every kind except `"text"` gets its cache invalidated before a
    /// remote comparison.
    fn kind(&self) -> &str;

    /// Fetch and decrypt the history.
    fn load<'a>(&'a mut self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Vec<String>>>;

    /// Encrypt and persist the history.
    fn save<'a>(
        &'a mut self,
        history: &'a [String],
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<()>>;

    /// Pure metadata descriptor: `{"type": ..., ...params}`.
    ///
    /// Round-trips through [`datasource_from_object`] for registered kinds.
    fn to_object(&self) -> serde_json::Value;

    /// Drop any cached fetched payload.
    ///
    /// Called before remote comparisons and on credential rotation so stale
    /// content cannot masquerade as the remote. The text kind stores its
    /// buffer as primary state, so its implementation is a no-op.
    fn invalidate_cache(&mut self) {}
}
