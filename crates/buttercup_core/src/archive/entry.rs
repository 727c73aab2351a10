//! Entry views and mutating handles.

use indexmap::IndexMap;

use super::tree::{ArchiveTree, EntryNode};
use super::Archive;
use crate::command::{CommandBuilder, Slug};
use crate::error::{ButtercupError, Result};
use crate::westley::execute_built;

/// Read-only view of an entry.
///
/// Identity + lookup only; re-resolve after any mutation or replay.
#[derive(Clone, Copy)]
pub struct Entry<'a> {
    id: &'a str,
    node: &'a EntryNode,
}

impl<'a> Entry<'a> {
    pub(crate) fn resolve(tree: &'a ArchiveTree, id: &str) -> Option<Entry<'a>> {
        let (id, node) = tree.entries.get_key_value(id)?;
        Some(Entry {
            id: id.as_str(),
            node,
        })
    }

    /// The entry's ID.
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// The owning group's ID.
    pub fn parent_id(&self) -> &'a str {
        &self.node.parent
    }

    /// All properties.
    pub fn properties(&self) -> &'a IndexMap<String, String> {
        &self.node.properties
    }

    /// One property, if set.
    pub fn property(&self, key: &str) -> Option<&'a str> {
        self.node.properties.get(key).map(String::as_str)
    }

    /// All attributes.
    pub fn attributes(&self) -> &'a IndexMap<String, String> {
        &self.node.attributes
    }
}

impl std::fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Property values may be secrets; show keys only
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("properties", &self.node.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Mutating handle for an entry. Every operation emits a command.
#[derive(Debug)]
pub struct EntryMut<'a> {
    archive: &'a mut Archive,
    id: String,
}

impl<'a> EntryMut<'a> {
    pub(crate) fn resolve(archive: &'a mut Archive, id: &str) -> Result<EntryMut<'a>> {
        if !archive.westley().tree().entries.contains_key(id) {
            return Err(ButtercupError::EntityNotFound(id.to_string()));
        }
        Ok(EntryMut {
            archive,
            id: id.to_string(),
        })
    }

    /// The entry's ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set a property. An empty value is valid; use
    /// [`delete_property`](EntryMut::delete_property) for removal.
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::SetEntryProperty)
                .arg(&self.id)
                .arg(key)
                .arg(value),
        )
    }

    /// Delete a property.
    pub fn delete_property(&mut self, key: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::DeleteEntryProperty)
                .arg(&self.id)
                .arg(key),
        )
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::SetEntryAttribute)
                .arg(&self.id)
                .arg(key)
                .arg(value),
        )
    }

    /// Delete an attribute.
    pub fn delete_attribute(&mut self, key: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::DeleteEntryAttribute)
                .arg(&self.id)
                .arg(key),
        )
    }

    /// Move this entry to another group.
    pub fn move_to_group(&mut self, group: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::MoveEntry).arg(&self.id).arg(group),
        )
    }

    /// Delete this entry.
    pub fn delete(self) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::DeleteEntry).arg(&self.id),
        )
    }
}
