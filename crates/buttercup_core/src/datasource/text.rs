//! In-memory text datasource.

use serde_json::json;

use super::{BoxFuture, Datasource};
use crate::config::EnvelopeConfig;
use crate::credentials::Credentials;
use crate::envelope;
use crate::error::{ButtercupError, Result};

/// The canonical in-memory datasource: its content is the envelope text.
///
/// Remote datasources wrap one of these — they move bytes, the text
/// datasource does the envelope work.
#[derive(Debug, Default)]
pub struct TextDatasource {
    content: Option<String>,
    config: EnvelopeConfig,
}

impl TextDatasource {
    /// An empty text datasource with default envelope configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty text datasource with explicit envelope configuration.
    pub fn with_config(config: EnvelopeConfig) -> Self {
        Self {
            content: None,
            config,
        }
    }

    /// Replace the buffered envelope text.
    pub fn set_content(&mut self, raw: impl Into<String>) {
        self.content = Some(raw.into());
    }

    /// The buffered envelope text, if any.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Drop the buffered envelope text.
    pub fn clear_content(&mut self) {
        self.content = None;
    }
}

impl Datasource for TextDatasource {
    fn kind(&self) -> &str {
        "text"
    }

    fn load<'a>(&'a mut self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            match &self.content {
                Some(text) => envelope::open_history(text, credentials),
                None => Err(ButtercupError::UnrecognizedFormat(
                    "text datasource has no content".into(),
                )),
            }
        })
    }

    fn save<'a>(
        &'a mut self,
        history: &'a [String],
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sealed = envelope::seal_history(history, credentials, &self.config)?;
            self.content = Some(sealed);
            Ok(())
        })
    }

    fn to_object(&self) -> serde_json::Value {
        json!({ "type": "text" })
    }

    // Default invalidate_cache: the buffer is primary state, not a cache
}
