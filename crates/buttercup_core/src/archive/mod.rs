//! Archive façade.
//!
//! `Archive` is the typed surface over the executor: every mutation builds a
//! command line and routes it through [`Westley::execute`], so the history
//! stays the single source of truth. Group and entry views returned from
//! lookups are identity + lookup only — re-resolve them after a replay or a
//! merge.

pub(crate) mod tree;

mod entry;
mod group;

pub use entry::{Entry, EntryMut};
pub use group::{Group, GroupMut};

use indexmap::IndexMap;

use crate::command::{generate_entity_id, CommandBuilder, Slug, ROOT_PARENT_ID};
use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::westley::{execute_built, Westley};

/// The on-disk schema tag written by the `fmt` command.
pub const ARCHIVE_FORMAT: &str = "buttercup/a";

/// A hierarchical secrets archive, materialized by replaying its history.
#[derive(Debug)]
pub struct Archive {
    westley: Westley,
}

impl Archive {
    /// Create an empty archive with default executor configuration.
    ///
    /// The new archive already carries its `fmt` line and is dirty until
    /// first saved.
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an empty archive with explicit executor configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        let mut westley = Westley::new(config);
        let line = CommandBuilder::new(Slug::Format)
            .arg(ARCHIVE_FORMAT)
            .encode()
            .expect("fmt takes one argument");
        westley
            .execute(&line)
            .expect("fmt always applies to an empty tree");
        Self { westley }
    }

    /// Rebuild an archive by replaying history lines.
    ///
    /// The result is clean (not dirty): its state matches what was loaded.
    pub fn from_history<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        Self::from_history_with_config(lines, ExecutorConfig::default())
    }

    /// Replay history lines with explicit executor configuration.
    pub fn from_history_with_config<S: AsRef<str>>(
        lines: &[S],
        config: ExecutorConfig,
    ) -> Result<Self> {
        let mut westley = Westley::new(config);
        for line in lines {
            westley.execute(line.as_ref())?;
        }
        westley.clear_dirty_state();
        Ok(Self { westley })
    }

    /// Replay a newline-joined history export.
    pub fn from_history_text(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        Self::from_history(&lines)
    }

    /// Snapshot copy of the history.
    pub fn history(&self) -> Vec<String> {
        self.westley.history()
    }

    /// Canonical newline-joined history export.
    pub fn history_text(&self) -> String {
        self.westley.history_ref().join("\n")
    }

    /// The archive identifier, assigned on first save.
    pub fn id(&self) -> Option<&str> {
        self.westley.tree().archive_id.as_deref()
    }

    /// Assign an identifier if the archive does not have one yet.
    pub fn ensure_id(&mut self) -> Result<String> {
        if let Some(id) = self.id() {
            return Ok(id.to_string());
        }
        let id = generate_entity_id();
        execute_built(
            &mut self.westley,
            CommandBuilder::new(Slug::ArchiveId).arg(&id),
        )?;
        Ok(id)
    }

    /// The on-disk schema tag.
    pub fn format(&self) -> Option<&str> {
        self.westley.tree().format.as_deref()
    }

    /// Archive attributes.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.westley.tree().attributes
    }

    /// Set an archive attribute.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        execute_built(
            &mut self.westley,
            CommandBuilder::new(Slug::SetArchiveAttribute)
                .arg(key)
                .arg(value),
        )
    }

    /// Delete an archive attribute.
    pub fn delete_attribute(&mut self, key: &str) -> Result<()> {
        execute_built(
            &mut self.westley,
            CommandBuilder::new(Slug::DeleteArchiveAttribute).arg(key),
        )
    }

    /// Create a top-level group and return its ID.
    pub fn create_group(&mut self, title: &str) -> Result<String> {
        self.create_group_under(ROOT_PARENT_ID, title)
    }

    pub(crate) fn create_group_under(&mut self, parent: &str, title: &str) -> Result<String> {
        let id = generate_entity_id();
        execute_built(
            &mut self.westley,
            CommandBuilder::new(Slug::CreateGroup).arg(parent).arg(&id),
        )?;
        execute_built(
            &mut self.westley,
            CommandBuilder::new(Slug::SetGroupTitle).arg(&id).arg(title),
        )?;
        Ok(id)
    }

    /// Top-level groups in creation order.
    pub fn groups(&self) -> Vec<Group<'_>> {
        self.westley
            .tree()
            .root_groups
            .iter()
            .filter_map(|id| self.find_group_by_id(id))
            .collect()
    }

    /// Look up a group anywhere in the tree.
    pub fn find_group_by_id(&self, id: &str) -> Option<Group<'_>> {
        Group::resolve(self.westley.tree(), id)
    }

    /// Look up an entry anywhere in the tree.
    pub fn find_entry_by_id(&self, id: &str) -> Option<Entry<'_>> {
        Entry::resolve(self.westley.tree(), id)
    }

    /// Mutating handle for a group.
    pub fn group_mut(&mut self, id: &str) -> Result<GroupMut<'_>> {
        GroupMut::resolve(self, id)
    }

    /// Mutating handle for an entry.
    pub fn entry_mut(&mut self, id: &str) -> Result<EntryMut<'_>> {
        EntryMut::resolve(self, id)
    }

    /// True iff there are unsaved commands.
    pub fn is_dirty(&self) -> bool {
        self.westley.is_dirty()
    }

    /// Mark the current state as persisted.
    pub fn clear_dirty_state(&mut self) {
        self.westley.clear_dirty_state()
    }

    /// Structural equality, normalized over sibling order.
    pub fn structurally_equals(&self, other: &Archive) -> bool {
        self.westley.tree().structurally_equals(other.westley.tree())
    }

    /// Wrap an executor that already carries replayed state.
    ///
    /// Used by the merger; the result keeps whatever dirty state the
    /// executor has.
    pub(crate) fn from_westley(westley: Westley) -> Self {
        Self { westley }
    }

    /// The executor this archive owns.
    pub fn westley(&self) -> &Westley {
        &self.westley
    }

    pub(crate) fn westley_mut(&mut self) -> &mut Westley {
        &mut self.westley
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}
