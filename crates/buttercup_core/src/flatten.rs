//! History compaction.
//!
//! A long-lived archive accumulates history far beyond what its tree needs:
//! overwritten properties, deleted groups, padding. The flattener rewrites
//! the history as the minimal command sequence that recreates the current
//! tree, with siblings in ID order so the result is stable under repeated
//! flattening.

use tracing::debug;

use crate::archive::tree::ArchiveTree;
use crate::archive::{Archive, ARCHIVE_FORMAT};
use crate::command::{CommandBuilder, Slug, ROOT_PARENT_ID};
use crate::config::DEFAULT_FLATTEN_THRESHOLD;
use crate::error::{ButtercupError, Result};

/// Rewrites archive histories into equivalent shorter form.
#[derive(Debug, Clone)]
pub struct Flattener {
    threshold: usize,
}

impl Flattener {
    /// A flattener that triggers above `threshold` history lines.
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// True if the archive's history has outgrown the threshold.
    pub fn should_flatten(&self, archive: &Archive) -> bool {
        archive.westley().history_ref().len() > self.threshold
    }

    /// Flatten only when the threshold is exceeded. Returns whether a
    /// flatten happened.
    pub fn maybe_flatten(&self, archive: &mut Archive) -> Result<bool> {
        if !self.should_flatten(archive) {
            return Ok(false);
        }
        self.flatten(archive)?;
        Ok(true)
    }

    /// Unconditionally replace the archive's history with its flattened
    /// form. The replayed tree is unchanged; the old history is discarded.
    pub fn flatten(&self, archive: &mut Archive) -> Result<()> {
        let before = archive.westley().history_ref().len();
        let lines = serialize_tree(archive.westley().tree())?;
        let after = lines.len();
        archive
            .westley_mut()
            .replace_history(lines)
            .map_err(|e| {
                ButtercupError::InternalInvariant(format!(
                    "flattened history failed to replay: {e}"
                ))
            })?;
        debug!(before, after, "flattened archive history");
        Ok(())
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(DEFAULT_FLATTEN_THRESHOLD)
    }
}

fn serialize_tree(tree: &ArchiveTree) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    let format = tree.format.as_deref().unwrap_or(ARCHIVE_FORMAT);
    lines.push(CommandBuilder::new(Slug::Format).arg(format).encode()?);
    if let Some(id) = &tree.archive_id {
        lines.push(CommandBuilder::new(Slug::ArchiveId).arg(id).encode()?);
    }
    for (key, value) in &tree.attributes {
        lines.push(
            CommandBuilder::new(Slug::SetArchiveAttribute)
                .arg(key)
                .arg(value)
                .encode()?,
        );
    }

    let mut roots: Vec<&String> = tree.root_groups.iter().collect();
    roots.sort();
    for group in roots {
        serialize_group(tree, ROOT_PARENT_ID, group, &mut lines)?;
    }
    Ok(lines)
}

fn serialize_group(
    tree: &ArchiveTree,
    parent: &str,
    id: &str,
    lines: &mut Vec<String>,
) -> Result<()> {
    let node = tree
        .groups
        .get(id)
        .ok_or_else(|| ButtercupError::InternalInvariant(format!("dangling group id '{id}'")))?;

    lines.push(
        CommandBuilder::new(Slug::CreateGroup)
            .arg(parent)
            .arg(id)
            .encode()?,
    );
    if !node.title.is_empty() {
        lines.push(
            CommandBuilder::new(Slug::SetGroupTitle)
                .arg(id)
                .arg(&node.title)
                .encode()?,
        );
    }
    for (key, value) in &node.attributes {
        lines.push(
            CommandBuilder::new(Slug::SetGroupAttribute)
                .arg(id)
                .arg(key)
                .arg(value)
                .encode()?,
        );
    }

    let mut entries: Vec<&String> = node.entries.iter().collect();
    entries.sort();
    for entry in entries {
        serialize_entry(tree, id, entry, lines)?;
    }

    let mut children: Vec<&String> = node.groups.iter().collect();
    children.sort();
    for child in children {
        serialize_group(tree, id, child, lines)?;
    }
    Ok(())
}

fn serialize_entry(
    tree: &ArchiveTree,
    group: &str,
    id: &str,
    lines: &mut Vec<String>,
) -> Result<()> {
    let node = tree
        .entries
        .get(id)
        .ok_or_else(|| ButtercupError::InternalInvariant(format!("dangling entry id '{id}'")))?;

    lines.push(
        CommandBuilder::new(Slug::CreateEntry)
            .arg(group)
            .arg(id)
            .encode()?,
    );
    for (key, value) in &node.properties {
        lines.push(
            CommandBuilder::new(Slug::SetEntryProperty)
                .arg(id)
                .arg(key)
                .arg(value)
                .encode()?,
        );
    }
    for (key, value) in &node.attributes {
        lines.push(
            CommandBuilder::new(Slug::SetEntryAttribute)
                .arg(id)
                .arg(key)
                .arg(value)
                .encode()?,
        );
    }
    Ok(())
}
