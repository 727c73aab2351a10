//! File-backed datasource.
//!
//! Only available on non-WASM targets.

#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::io::ErrorKind;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

#[cfg(not(target_arch = "wasm32"))]
use serde_json::json;
#[cfg(not(target_arch = "wasm32"))]
use tracing::debug;

#[cfg(not(target_arch = "wasm32"))]
use super::{BoxFuture, Datasource, TextDatasource};
#[cfg(not(target_arch = "wasm32"))]
use crate::credentials::Credentials;
#[cfg(not(target_arch = "wasm32"))]
use crate::error::{ButtercupError, Result};

/// Datasource persisting the envelope to a file on disk.
///
/// Composes a [`TextDatasource`]: this type moves bytes between the file
/// and the inner buffer, the inner buffer does the envelope work.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileDatasource {
    path: PathBuf,
    text: TextDatasource,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileDatasource {
    /// A file datasource for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            text: TextDatasource::new(),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Datasource for FileDatasource {
    fn kind(&self) -> &str {
        "file"
    }

    fn load<'a>(&'a mut self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let raw = fs::read_to_string(&self.path).map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ButtercupError::NotFound(self.path.display().to_string())
                } else {
                    ButtercupError::Io(e)
                }
            })?;
            debug!(path = %self.path.display(), bytes = raw.len(), "read archive file");
            self.text.set_content(raw);
            self.text.load(credentials).await
        })
    }

    fn save<'a>(
        &'a mut self,
        history: &'a [String],
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.text.save(history, credentials).await?;
            let sealed = self
                .text
                .content()
                .ok_or_else(|| {
                    ButtercupError::InternalInvariant("text save produced no content".into())
                })?;
            fs::write(&self.path, sealed)?;
            debug!(path = %self.path.display(), "wrote archive file");
            Ok(())
        })
    }

    fn to_object(&self) -> serde_json::Value {
        json!({ "type": "file", "path": self.path })
    }

    fn invalidate_cache(&mut self) {
        self.text.clear_content();
    }
}
