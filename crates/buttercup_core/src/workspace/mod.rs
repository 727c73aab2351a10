//! Workspace coordination.
//!
//! A workspace binds one archive to one datasource and one set of master
//! credentials, and serializes everything that touches the remote copy:
//! saves go through the archive's process-wide FIFO channel, and remote
//! reconciliation goes load → compare → merge → replace.

mod channel;

pub use channel::{
    channel_for_archive, CancelHandle, QueuedTask, SaveChannel, TaskInfo, TaskPriority,
};

use tracing::debug;

use crate::archive::Archive;
use crate::credentials::Credentials;
use crate::datasource::Datasource;
use crate::error::{ButtercupError, Result};
use crate::flatten::Flattener;
use crate::sync::{merge_archives, HistoryComparator};

/// Coordinator for one archive + datasource + credentials binding.
pub struct Workspace {
    archive: Archive,
    datasource: Box<dyn Datasource>,
    credentials: Credentials,
    flattener: Flattener,
}

impl Workspace {
    /// Bind an archive to its datasource and master credentials.
    pub fn new(archive: Archive, datasource: Box<dyn Datasource>, credentials: Credentials) -> Self {
        Self {
            archive,
            datasource,
            credentials,
            flattener: Flattener::default(),
        }
    }

    /// Use a non-default flatten threshold for the save path.
    pub fn with_flattener(mut self, flattener: Flattener) -> Self {
        self.flattener = flattener;
        self
    }

    /// Replace the whole binding.
    pub fn set_archive(
        &mut self,
        archive: Archive,
        datasource: Box<dyn Datasource>,
        credentials: Credentials,
    ) {
        self.archive = archive;
        self.datasource = datasource;
        self.credentials = credentials;
    }

    /// The current archive.
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// The current archive, mutable.
    pub fn archive_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }

    /// The bound datasource.
    pub fn datasource(&self) -> &dyn Datasource {
        self.datasource.as_ref()
    }

    /// Replace the master credentials. In-memory only: takes effect on the
    /// next save. Any payload the datasource fetched under the old
    /// credentials is invalidated.
    pub fn update_primary_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.datasource.invalidate_cache();
    }

    /// Load the remote copy and report whether it diverges from the local
    /// archive. The local archive is not touched.
    pub async fn local_differs_from_remote(&mut self) -> Result<bool> {
        let staged = self.stage_remote().await?;
        let local_history = self.archive.westley().history_ref();
        let differs =
            HistoryComparator::new(local_history, staged.westley().history_ref()).archives_differ();
        Ok(differs)
    }

    /// Load the remote copy, merge it with the local archive, and replace
    /// the local archive with the result.
    pub async fn merge_from_remote(&mut self) -> Result<&Archive> {
        let staged = self.stage_remote().await?;
        let merged = merge_archives(&self.archive, &staged)?;
        debug!(
            local = self.archive.westley().history_ref().len(),
            remote = staged.westley().history_ref().len(),
            merged = merged.westley().history_ref().len(),
            "merged remote archive"
        );
        self.archive = merged;
        Ok(&self.archive)
    }

    /// Merge from the remote copy only if it diverges.
    pub async fn update(&mut self) -> Result<()> {
        if self.local_differs_from_remote().await? {
            self.merge_from_remote().await?;
        }
        Ok(())
    }

    /// Encrypt and persist the archive through its per-archive save channel.
    ///
    /// Saves for the same archive ID run strictly one at a time, in enqueue
    /// order, across the whole process. The dirty flag is cleared only on
    /// success; a failed save leaves it set so callers can retry.
    pub async fn save(&mut self) -> Result<()> {
        let archive_id = self.archive.ensure_id()?;
        self.flattener.maybe_flatten(&mut self.archive)?;
        let history = self.archive.history();

        let task = channel_for_archive(&archive_id).enqueue(TaskPriority::Normal, "saving");
        let outcome = task
            .run(self.datasource.save(&history, &self.credentials))
            .await;
        match outcome {
            Some(Ok(())) => {
                self.archive.clear_dirty_state();
                debug!(archive = %archive_id, lines = history.len(), "saved archive");
                Ok(())
            }
            Some(Err(e)) => Err(e),
            // The workspace never hands out its own cancel handle
            None => Err(ButtercupError::InternalInvariant(
                "save task cancelled before start".into(),
            )),
        }
    }

    /// Fetch the remote copy into a staged archive.
    ///
    /// Non-text datasources cache fetched payloads; the cache is dropped
    /// first so stale content cannot masquerade as the remote.
    async fn stage_remote(&mut self) -> Result<Archive> {
        if self.datasource.kind() != "text" {
            self.datasource.invalidate_cache();
        }
        let lines = self.datasource.load(&self.credentials).await?;
        Archive::from_history_with_config(&lines, self.archive.westley().config().clone())
    }
}
