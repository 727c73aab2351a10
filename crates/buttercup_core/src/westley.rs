//! The command executor.
//!
//! `Westley` owns the live archive tree and the append-only history. Every
//! mutation flows through [`Westley::execute`]: the line is decoded,
//! validated against the current tree, applied, and recorded. A failed
//! command leaves tree, history, and dirty flag exactly as they were.

use crate::archive::tree::ArchiveTree;
use crate::command::{generate_entity_id, Command, CommandBuilder, Slug};
use crate::config::ExecutorConfig;
use crate::error::Result;

/// Executor: live tree, history, dirty tracking, padding.
#[derive(Debug)]
pub struct Westley {
    tree: ArchiveTree,
    history: Vec<String>,
    dirty: bool,
    config: ExecutorConfig,
    commands_since_pad: u32,
}

impl Westley {
    /// Create an empty executor.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            tree: ArchiveTree::default(),
            history: Vec::new(),
            dirty: false,
            config,
            commands_since_pad: 0,
        }
    }

    /// Decode `line`, apply it to the tree, and record it.
    ///
    /// Transactional per command: on any error the executor is unchanged.
    pub fn execute(&mut self, line: &str) -> Result<()> {
        let command = Command::decode(line)?;
        self.apply(&command)?;
        self.history.push(line.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Record one `pad` line if the configured cadence says it is due.
    ///
    /// Called by the façade after each emitted command; replay never pads.
    pub fn pad(&mut self) {
        let Some(cadence) = self.config.padding_cadence else {
            return;
        };
        self.commands_since_pad += 1;
        if self.commands_since_pad >= cadence.get() {
            self.commands_since_pad = 0;
            // pad has no tree effect, so it can bypass apply()
            self.history.push(format!("pad {}", generate_entity_id()));
        }
    }

    /// Reset tree and history to empty.
    pub fn clear(&mut self) {
        self.tree = ArchiveTree::default();
        self.history.clear();
        self.dirty = false;
        self.commands_since_pad = 0;
    }

    /// Mark the current state as persisted.
    pub fn clear_dirty_state(&mut self) {
        self.dirty = false;
    }

    /// True iff commands have executed since the last [`clear_dirty_state`].
    ///
    /// [`clear_dirty_state`]: Westley::clear_dirty_state
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Snapshot copy of the history lines.
    pub fn history(&self) -> Vec<String> {
        self.history.clone()
    }

    /// The history lines, borrowed.
    pub fn history_ref(&self) -> &[String] {
        &self.history
    }

    /// The live tree, read-only. Mutation goes through [`Westley::execute`].
    pub(crate) fn tree(&self) -> &ArchiveTree {
        &self.tree
    }

    pub(crate) fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Replace the history wholesale after a flatten.
    ///
    /// The caller guarantees `lines` replays to the current tree; the tree
    /// is rebuilt from the lines to keep the two in lockstep.
    pub(crate) fn replace_history(&mut self, lines: Vec<String>) -> Result<()> {
        let mut rebuilt = ArchiveTree::default();
        for line in &lines {
            let command = Command::decode(line)?;
            apply_to(&mut rebuilt, &command)?;
        }
        self.tree = rebuilt;
        self.history = lines;
        self.dirty = true;
        self.commands_since_pad = 0;
        Ok(())
    }

    fn apply(&mut self, command: &Command) -> Result<()> {
        apply_to(&mut self.tree, command)
    }
}

fn apply_to(tree: &mut ArchiveTree, command: &Command) -> Result<()> {
    let arg = |i: usize| command.args[i].as_str();
    match command.slug {
        Slug::ArchiveId => {
            tree.archive_id = Some(arg(0).to_string());
            Ok(())
        }
        Slug::SetArchiveAttribute => {
            tree.attributes.insert(arg(0).to_string(), arg(1).to_string());
            Ok(())
        }
        Slug::DeleteArchiveAttribute => {
            tree.attributes.shift_remove(arg(0));
            Ok(())
        }
        Slug::CreateGroup => tree.create_group(arg(0), arg(1)),
        Slug::SetGroupTitle => tree.set_group_title(arg(0), arg(1)),
        Slug::MoveGroup => tree.move_group(arg(0), arg(1)),
        Slug::DeleteGroup => tree.delete_group(arg(0)),
        Slug::SetGroupAttribute => tree.set_group_attribute(arg(0), arg(1), arg(2)),
        Slug::DeleteGroupAttribute => tree.delete_group_attribute(arg(0), arg(1)),
        Slug::CreateEntry => tree.create_entry(arg(0), arg(1)),
        Slug::MoveEntry => tree.move_entry(arg(0), arg(1)),
        Slug::DeleteEntry => tree.delete_entry(arg(0)),
        Slug::SetEntryProperty => tree.set_entry_property(arg(0), arg(1), arg(2)),
        Slug::DeleteEntryProperty => tree.delete_entry_property(arg(0), arg(1)),
        Slug::SetEntryAttribute => tree.set_entry_attribute(arg(0), arg(1), arg(2)),
        Slug::DeleteEntryAttribute => tree.delete_entry_attribute(arg(0), arg(1)),
        Slug::Pad => Ok(()),
        Slug::Format => {
            tree.format = Some(arg(0).to_string());
            Ok(())
        }
    }
}

/// Convenience: build and execute a command in one step.
///
/// Used by the façade, which always goes slug + args rather than raw lines.
pub(crate) fn execute_built(westley: &mut Westley, builder: CommandBuilder) -> Result<()> {
    let line = builder.encode()?;
    westley.execute(&line)?;
    westley.pad();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ButtercupError;

    fn quiet() -> Westley {
        Westley::new(ExecutorConfig::without_padding())
    }

    #[test]
    fn test_execute_records_raw_line_and_sets_dirty() {
        let mut westley = quiet();
        assert!(!westley.is_dirty());

        westley.execute("cgr 0 g1").unwrap();
        westley.execute("tgr g1 \"Banking\"").unwrap();

        assert!(westley.is_dirty());
        assert_eq!(westley.history(), vec!["cgr 0 g1", "tgr g1 \"Banking\""]);
        assert_eq!(westley.tree().groups["g1"].title, "Banking");
    }

    #[test]
    fn test_failed_command_changes_nothing() {
        let mut westley = quiet();
        westley.execute("cgr 0 g1").unwrap();
        westley.clear_dirty_state();

        let err = westley.execute("tgr missing \"x\"").unwrap_err();
        assert!(matches!(err, ButtercupError::EntityNotFound(_)));
        assert_eq!(westley.history().len(), 1);
        assert!(!westley.is_dirty());

        let err = westley.execute("nonsense").unwrap_err();
        assert!(matches!(err, ButtercupError::InvalidCommand { .. }));
        assert_eq!(westley.history().len(), 1);
        assert!(!westley.is_dirty());
    }

    #[test]
    fn test_pad_lines_are_no_ops() {
        let mut westley = quiet();
        westley.execute("cgr 0 g1").unwrap();
        westley.execute("pad 8shd72k").unwrap();
        westley.execute("tgr g1 Banking").unwrap();

        assert_eq!(westley.history().len(), 3);
        assert_eq!(westley.tree().groups.len(), 1);
    }

    #[test]
    fn test_padding_cadence() {
        let config = ExecutorConfig {
            padding_cadence: std::num::NonZeroU32::new(2),
        };
        let mut westley = Westley::new(config);

        westley.execute("cgr 0 g1").unwrap();
        westley.pad();
        assert_eq!(westley.history().len(), 1);

        westley.execute("tgr g1 a").unwrap();
        westley.pad();
        // Second command triggered one pad line
        assert_eq!(westley.history().len(), 3);
        assert!(westley.history()[2].starts_with("pad "));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut westley = quiet();
        westley.execute("cgr 0 g1").unwrap();
        westley.clear();

        assert!(westley.history().is_empty());
        assert!(!westley.is_dirty());
        assert!(westley.tree().groups.is_empty());
    }

    #[test]
    fn test_archive_metadata_commands() {
        let mut westley = quiet();
        westley.execute("fmt buttercup/a").unwrap();
        westley.execute("aid 9f2k1m").unwrap();
        westley.execute("saa color \"dark blue\"").unwrap();
        westley.execute("daa color").unwrap();

        assert_eq!(westley.tree().format.as_deref(), Some("buttercup/a"));
        assert_eq!(westley.tree().archive_id.as_deref(), Some("9f2k1m"));
        assert!(westley.tree().attributes.is_empty());
    }
}
