//! Group views and mutating handles.

use indexmap::IndexMap;

use super::tree::{ArchiveTree, GroupNode};
use super::{Archive, Entry};
use crate::command::{generate_entity_id, CommandBuilder, Slug, ROOT_PARENT_ID};
use crate::error::{ButtercupError, Result};
use crate::westley::execute_built;

/// Read-only view of a group.
///
/// Holds identity plus a borrow of the tree; it is invalidated by any
/// mutation and must be re-resolved afterwards.
#[derive(Clone, Copy)]
pub struct Group<'a> {
    tree: &'a ArchiveTree,
    id: &'a str,
    node: &'a GroupNode,
}

impl<'a> Group<'a> {
    pub(crate) fn resolve(tree: &'a ArchiveTree, id: &str) -> Option<Group<'a>> {
        let (id, node) = tree.groups.get_key_value(id)?;
        Some(Group {
            tree,
            id: id.as_str(),
            node,
        })
    }

    /// The group's ID.
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// The group's title.
    pub fn title(&self) -> &'a str {
        &self.node.title
    }

    /// The group's attributes.
    pub fn attributes(&self) -> &'a IndexMap<String, String> {
        &self.node.attributes
    }

    /// Parent group ID, or `None` for a top-level group.
    pub fn parent_id(&self) -> Option<&'a str> {
        self.node.parent.as_deref()
    }

    /// Child groups in creation order.
    pub fn groups(&self) -> Vec<Group<'a>> {
        self.node
            .groups
            .iter()
            .filter_map(|id| Group::resolve(self.tree, id))
            .collect()
    }

    /// Entries in creation order.
    pub fn entries(&self) -> Vec<Entry<'a>> {
        self.node
            .entries
            .iter()
            .filter_map(|id| Entry::resolve(self.tree, id))
            .collect()
    }
}

impl std::fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("title", &self.node.title)
            .finish()
    }
}

/// Mutating handle for a group. Every operation emits a command.
#[derive(Debug)]
pub struct GroupMut<'a> {
    archive: &'a mut Archive,
    id: String,
}

impl<'a> GroupMut<'a> {
    pub(crate) fn resolve(archive: &'a mut Archive, id: &str) -> Result<GroupMut<'a>> {
        if !archive.westley().tree().groups.contains_key(id) {
            return Err(ButtercupError::EntityNotFound(id.to_string()));
        }
        Ok(GroupMut {
            archive,
            id: id.to_string(),
        })
    }

    /// The group's ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the title.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::SetGroupTitle)
                .arg(&self.id)
                .arg(title),
        )
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::SetGroupAttribute)
                .arg(&self.id)
                .arg(key)
                .arg(value),
        )
    }

    /// Delete an attribute.
    pub fn delete_attribute(&mut self, key: &str) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::DeleteGroupAttribute)
                .arg(&self.id)
                .arg(key),
        )
    }

    /// Move this group under `parent` (a group ID or the root sentinel).
    ///
    /// Moving into the group's own subtree is rejected with `InvalidMove`
    /// before any command is emitted; history and dirty state are untouched.
    pub fn move_to(&mut self, parent: &str) -> Result<()> {
        let tree = self.archive.westley().tree();
        if parent != ROOT_PARENT_ID && tree.is_descendant_or_self(&self.id, parent) {
            return Err(ButtercupError::InvalidMove {
                group: self.id.clone(),
                target: parent.to_string(),
            });
        }
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::MoveGroup)
                .arg(&self.id)
                .arg(parent),
        )
    }

    /// Delete this group and its subtree.
    pub fn delete(self) -> Result<()> {
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::DeleteGroup).arg(&self.id),
        )
    }

    /// Create a child group and return its ID.
    pub fn create_group(&mut self, title: &str) -> Result<String> {
        let id = self.id.clone();
        self.archive.create_group_under(&id, title)
    }

    /// Create an entry in this group and return its ID.
    pub fn create_entry(&mut self) -> Result<String> {
        let id = generate_entity_id();
        execute_built(
            self.archive.westley_mut(),
            CommandBuilder::new(Slug::CreateEntry)
                .arg(&self.id)
                .arg(&id),
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorConfig;

    fn quiet() -> Archive {
        Archive::with_config(ExecutorConfig::without_padding())
    }

    #[test]
    fn test_group_view_reads_tree() {
        let mut archive = quiet();
        let outer = archive.create_group("Outer").unwrap();
        let inner = archive.group_mut(&outer).unwrap().create_group("Inner").unwrap();

        let view = archive.find_group_by_id(&outer).unwrap();
        assert_eq!(view.title(), "Outer");
        assert_eq!(view.parent_id(), None);
        let children = view.groups();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), inner);
        assert_eq!(children[0].parent_id(), Some(outer.as_str()));
    }

    #[test]
    fn test_move_into_descendant_leaves_archive_unchanged() {
        let mut archive = quiet();
        let outer = archive.create_group("Outer").unwrap();
        let inner = archive.group_mut(&outer).unwrap().create_group("Inner").unwrap();

        archive.clear_dirty_state();
        let before = archive.history();

        let err = archive.group_mut(&outer).unwrap().move_to(&inner).unwrap_err();
        assert!(matches!(err, ButtercupError::InvalidMove { .. }));
        assert_eq!(archive.history(), before);
        assert!(!archive.is_dirty());
    }

    #[test]
    fn test_delete_group_removes_subtree() {
        let mut archive = quiet();
        let outer = archive.create_group("Outer").unwrap();
        let inner = archive.group_mut(&outer).unwrap().create_group("Inner").unwrap();
        let entry = archive.group_mut(&inner).unwrap().create_entry().unwrap();

        archive.group_mut(&outer).unwrap().delete().unwrap();
        assert!(archive.find_group_by_id(&outer).is_none());
        assert!(archive.find_group_by_id(&inner).is_none());
        assert!(archive.find_entry_by_id(&entry).is_none());
    }

    #[test]
    fn test_group_mut_requires_existing_id() {
        let mut archive = quiet();
        assert!(matches!(
            archive.group_mut("nope"),
            Err(ButtercupError::EntityNotFound(_))
        ));
    }
}
