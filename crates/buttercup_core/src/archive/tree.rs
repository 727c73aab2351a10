//! In-memory archive tree.
//!
//! Nodes live in ID-keyed arenas; parent links are IDs, never owning
//! references, so the structure is acyclic by construction. All operations
//! validate before they mutate, which makes each one atomic.

use indexmap::IndexMap;

use crate::command::ROOT_PARENT_ID;
use crate::error::{ButtercupError, Result};

/// A group node: container for entries and child groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupNode {
    /// Group title, empty until a `tgr` assigns one
    pub title: String,
    /// Group attributes
    pub attributes: IndexMap<String, String>,
    /// Parent group ID; `None` means the archive root
    pub parent: Option<String>,
    /// Child group IDs in creation order
    pub groups: Vec<String>,
    /// Child entry IDs in creation order
    pub entries: Vec<String>,
}

/// An entry node: a leaf carrying properties and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryNode {
    /// Owning group ID
    pub parent: String,
    /// Entry properties ("username", "password", "url", ...)
    pub properties: IndexMap<String, String>,
    /// Entry attributes
    pub attributes: IndexMap<String, String>,
}

/// The whole archive tree: arenas plus root-level bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ArchiveTree {
    /// On-disk schema tag, set by `fmt`
    pub format: Option<String>,
    /// Opaque archive identifier, set by `aid`
    pub archive_id: Option<String>,
    /// Archive attributes
    pub attributes: IndexMap<String, String>,
    /// IDs of top-level groups in creation order
    pub root_groups: Vec<String>,
    /// All groups, keyed by ID
    pub groups: IndexMap<String, GroupNode>,
    /// All entries, keyed by ID
    pub entries: IndexMap<String, EntryNode>,
}

impl ArchiveTree {
    /// True if any group or entry already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.groups.contains_key(id) || self.entries.contains_key(id)
    }

    /// True if `candidate` is `ancestor` itself or lives anywhere in its
    /// subtree.
    pub fn is_descendant_or_self(&self, ancestor: &str, candidate: &str) -> bool {
        if ancestor == candidate {
            return true;
        }
        let mut current = candidate;
        while let Some(node) = self.groups.get(current) {
            match &node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut GroupNode> {
        self.groups
            .get_mut(id)
            .ok_or_else(|| ButtercupError::EntityNotFound(id.to_string()))
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut EntryNode> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| ButtercupError::EntityNotFound(id.to_string()))
    }

    /// Create a group under `parent` (the root sentinel or a group ID).
    pub fn create_group(&mut self, parent: &str, id: &str) -> Result<()> {
        if self.contains_id(id) || id == ROOT_PARENT_ID {
            return Err(ButtercupError::DuplicateId(id.to_string()));
        }
        if parent == ROOT_PARENT_ID {
            self.root_groups.push(id.to_string());
            self.groups.insert(id.to_string(), GroupNode::default());
        } else {
            self.group_mut(parent)?.groups.push(id.to_string());
            let node = GroupNode {
                parent: Some(parent.to_string()),
                ..GroupNode::default()
            };
            self.groups.insert(id.to_string(), node);
        }
        Ok(())
    }

    /// Set a group's title.
    pub fn set_group_title(&mut self, id: &str, title: &str) -> Result<()> {
        self.group_mut(id)?.title = title.to_string();
        Ok(())
    }

    /// Move a group under a new parent (the root sentinel or a group ID).
    ///
    /// Rejects moves into the group's own subtree.
    pub fn move_group(&mut self, id: &str, new_parent: &str) -> Result<()> {
        if !self.groups.contains_key(id) {
            return Err(ButtercupError::EntityNotFound(id.to_string()));
        }
        if new_parent != ROOT_PARENT_ID {
            if !self.groups.contains_key(new_parent) {
                return Err(ButtercupError::EntityNotFound(new_parent.to_string()));
            }
            if self.is_descendant_or_self(id, new_parent) {
                return Err(ButtercupError::InvalidMove {
                    group: id.to_string(),
                    target: new_parent.to_string(),
                });
            }
        }

        self.detach_group(id);
        if new_parent == ROOT_PARENT_ID {
            self.root_groups.push(id.to_string());
            self.group_mut(id)?.parent = None;
        } else {
            self.group_mut(new_parent)?.groups.push(id.to_string());
            self.group_mut(id)?.parent = Some(new_parent.to_string());
        }
        Ok(())
    }

    /// Delete a group and its whole subtree.
    pub fn delete_group(&mut self, id: &str) -> Result<()> {
        if !self.groups.contains_key(id) {
            return Err(ButtercupError::EntityNotFound(id.to_string()));
        }
        self.detach_group(id);
        self.discard_subtree(id);
        Ok(())
    }

    /// Set a group attribute.
    pub fn set_group_attribute(&mut self, id: &str, key: &str, value: &str) -> Result<()> {
        self.group_mut(id)?
            .attributes
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Delete a group attribute. Missing keys are not an error.
    pub fn delete_group_attribute(&mut self, id: &str, key: &str) -> Result<()> {
        self.group_mut(id)?.attributes.shift_remove(key);
        Ok(())
    }

    /// Create an entry inside an existing group.
    pub fn create_entry(&mut self, group: &str, id: &str) -> Result<()> {
        if self.contains_id(id) || id == ROOT_PARENT_ID {
            return Err(ButtercupError::DuplicateId(id.to_string()));
        }
        self.group_mut(group)?.entries.push(id.to_string());
        let node = EntryNode {
            parent: group.to_string(),
            ..EntryNode::default()
        };
        self.entries.insert(id.to_string(), node);
        Ok(())
    }

    /// Move an entry to another group.
    pub fn move_entry(&mut self, id: &str, new_group: &str) -> Result<()> {
        if !self.entries.contains_key(id) {
            return Err(ButtercupError::EntityNotFound(id.to_string()));
        }
        if !self.groups.contains_key(new_group) {
            return Err(ButtercupError::EntityNotFound(new_group.to_string()));
        }
        let old_group = self.entries[id].parent.clone();
        if let Some(node) = self.groups.get_mut(&old_group) {
            node.entries.retain(|e| e != id);
        }
        self.group_mut(new_group)?.entries.push(id.to_string());
        self.entry_mut(id)?.parent = new_group.to_string();
        Ok(())
    }

    /// Delete an entry.
    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        let parent = self
            .entries
            .get(id)
            .map(|e| e.parent.clone())
            .ok_or_else(|| ButtercupError::EntityNotFound(id.to_string()))?;
        if let Some(group) = self.groups.get_mut(&parent) {
            group.entries.retain(|e| e != id);
        }
        self.entries.shift_remove(id);
        Ok(())
    }

    /// Set an entry property. Empty values are valid.
    pub fn set_entry_property(&mut self, id: &str, key: &str, value: &str) -> Result<()> {
        self.entry_mut(id)?
            .properties
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Delete an entry property. Missing keys are not an error.
    pub fn delete_entry_property(&mut self, id: &str, key: &str) -> Result<()> {
        self.entry_mut(id)?.properties.shift_remove(key);
        Ok(())
    }

    /// Set an entry attribute.
    pub fn set_entry_attribute(&mut self, id: &str, key: &str, value: &str) -> Result<()> {
        self.entry_mut(id)?
            .attributes
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Delete an entry attribute. Missing keys are not an error.
    pub fn delete_entry_attribute(&mut self, id: &str, key: &str) -> Result<()> {
        self.entry_mut(id)?.attributes.shift_remove(key);
        Ok(())
    }

    fn detach_group(&mut self, id: &str) {
        let parent = self.groups.get(id).and_then(|g| g.parent.clone());
        match parent {
            Some(parent_id) => {
                if let Some(node) = self.groups.get_mut(&parent_id) {
                    node.groups.retain(|g| g != id);
                }
            }
            None => self.root_groups.retain(|g| g != id),
        }
    }

    fn discard_subtree(&mut self, id: &str) {
        let Some(node) = self.groups.shift_remove(id) else {
            return;
        };
        for entry in node.entries {
            self.entries.shift_remove(&entry);
        }
        for child in node.groups {
            self.discard_subtree(&child);
        }
    }

    /// Structural equality: same archive metadata and the same tree, with
    /// sibling order normalized by ID.
    ///
    /// Creation order is a replay artifact (merging reorders it), so two
    /// archives holding the same content compare equal here even when their
    /// histories differ.
    pub fn structurally_equals(&self, other: &ArchiveTree) -> bool {
        self.format == other.format
            && self.archive_id == other.archive_id
            && sorted_map(&self.attributes) == sorted_map(&other.attributes)
            && self.sibling_groups_equal(&self.root_groups, other, &other.root_groups)
    }

    fn sibling_groups_equal(&self, mine: &[String], other: &ArchiveTree, theirs: &[String]) -> bool {
        let mut mine: Vec<&String> = mine.iter().collect();
        let mut theirs: Vec<&String> = theirs.iter().collect();
        mine.sort();
        theirs.sort();
        if mine != theirs {
            return false;
        }
        mine.iter().all(|id| {
            let (a, b) = match (self.groups.get(*id), other.groups.get(*id)) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            a.title == b.title
                && sorted_map(&a.attributes) == sorted_map(&b.attributes)
                && self.sibling_entries_equal(&a.entries, other, &b.entries)
                && self.sibling_groups_equal(&a.groups, other, &b.groups)
        })
    }

    fn sibling_entries_equal(
        &self,
        mine: &[String],
        other: &ArchiveTree,
        theirs: &[String],
    ) -> bool {
        let mut mine: Vec<&String> = mine.iter().collect();
        let mut theirs: Vec<&String> = theirs.iter().collect();
        mine.sort();
        theirs.sort();
        if mine != theirs {
            return false;
        }
        mine.iter().all(|id| {
            let (a, b) = match (self.entries.get(*id), other.entries.get(*id)) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            sorted_map(&a.properties) == sorted_map(&b.properties)
                && sorted_map(&a.attributes) == sorted_map(&b.attributes)
        })
    }
}

fn sorted_map(map: &IndexMap<String, String>) -> Vec<(&String, &String)> {
    let mut pairs: Vec<_> = map.iter().collect();
    pairs.sort();
    pairs
}
