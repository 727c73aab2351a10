//! Three-way history merge.
//!
//! Ordering contract: `common ++ secondary_kept ++ primary_kept` — the
//! remote tail lands first because its edits are older relative to the
//! user's current ones. When both sides diverged, destructive commands are
//! stripped from both tails: concurrent deletions from a divergent point
//! have ambiguous intent, and keeping content beats silently losing it.

use tracing::warn;

use super::comparator::{HistoryComparator, HistoryDiff};
use crate::archive::Archive;
use crate::command::{is_destructive_line, is_padding_line};
use crate::error::{ButtercupError, Result};
use crate::westley::Westley;

/// Merge a comparator diff into a single history.
///
/// Deterministic: the same diff always yields the same lines. Not
/// commutative — swap primary and secondary and the result changes.
pub fn merge_histories(diff: &HistoryDiff) -> Vec<String> {
    let both_diverged = !diff.primary.is_empty() && !diff.secondary.is_empty();
    let keep = |line: &&String| -> bool {
        // Tail pad lines carry random nonces and would re-diverge forever
        if is_padding_line(line) {
            return false;
        }
        !(both_diverged && is_destructive_line(line))
    };

    let mut merged = diff.common.clone();
    merged.extend(diff.secondary.iter().filter(keep).cloned());
    merged.extend(diff.primary.iter().filter(keep).cloned());
    merged
}

/// Merge `incoming` (the staged remote archive) into `local` and replay the
/// result into a fresh archive.
///
/// The common prefix must replay cleanly — it already did on both sides, so
/// a failure there is [`ButtercupError::InternalInvariant`]. Tail lines that
/// no longer apply after merging (for example opposite concurrent group
/// moves) are dropped with a warning rather than failing the whole merge.
pub fn merge_archives(local: &Archive, incoming: &Archive) -> Result<Archive> {
    let local_history = local.westley().history_ref();
    let incoming_history = incoming.westley().history_ref();
    let diff = HistoryComparator::new(local_history, incoming_history).calculate_differences();

    let common_len = diff.common.len();
    let merged = merge_histories(&diff);

    let mut westley = Westley::new(local.westley().config().clone());
    for (index, line) in merged.iter().enumerate() {
        match westley.execute(line) {
            Ok(()) => {}
            Err(e) if index < common_len => {
                return Err(ButtercupError::InternalInvariant(format!(
                    "shared history prefix failed to replay: {e}"
                )));
            }
            Err(
                e @ (ButtercupError::EntityNotFound(_)
                | ButtercupError::DuplicateId(_)
                | ButtercupError::InvalidMove { .. }),
            ) => {
                warn!(line = %line, error = %e, "dropping inapplicable command during merge");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Archive::from_westley(westley))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorConfig;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_orders_remote_tail_first() {
        let diff = HistoryDiff {
            common: lines(&["fmt buttercup/a"]),
            primary: lines(&["cgr 0 local1"]),
            secondary: lines(&["cgr 0 remote1"]),
        };
        assert_eq!(
            merge_histories(&diff),
            lines(&["fmt buttercup/a", "cgr 0 remote1", "cgr 0 local1"])
        );
    }

    #[test]
    fn test_destructive_stripped_only_when_both_diverged() {
        let both = HistoryDiff {
            common: lines(&["fmt buttercup/a", "cgr 0 g1", "cen g1 e1"]),
            primary: lines(&["sep e1 password edited"]),
            secondary: lines(&["den e1"]),
        };
        let merged = merge_histories(&both);
        assert!(!merged.iter().any(|l| l.starts_with("den")));
        assert!(merged.contains(&"sep e1 password edited".to_string()));

        // Only one side diverged: the deletion stands
        let one_side = HistoryDiff {
            common: lines(&["fmt buttercup/a", "cgr 0 g1", "cen g1 e1"]),
            primary: lines(&[]),
            secondary: lines(&["den e1"]),
        };
        assert!(merge_histories(&one_side).contains(&"den e1".to_string()));
    }

    #[test]
    fn test_tail_padding_is_dropped() {
        let diff = HistoryDiff {
            common: lines(&["fmt buttercup/a", "pad abc123"]),
            primary: lines(&["pad def456", "cgr 0 g1"]),
            secondary: lines(&["pad ghi789"]),
        };
        let merged = merge_histories(&diff);
        assert_eq!(merged, lines(&["fmt buttercup/a", "pad abc123", "cgr 0 g1"]));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let diff = HistoryDiff {
            common: lines(&["fmt buttercup/a"]),
            primary: lines(&["cgr 0 a1", "dgr a1"]),
            secondary: lines(&["cgr 0 b1"]),
        };
        assert_eq!(merge_histories(&diff), merge_histories(&diff));
    }

    #[test]
    fn test_merge_archives_combines_divergent_creations() {
        let mut base = Archive::with_config(ExecutorConfig::without_padding());
        let group = base.create_group("Shared").unwrap();

        let mut local = Archive::from_history(&base.history()).unwrap();
        let mut remote = Archive::from_history(&base.history()).unwrap();
        let local_entry = local.group_mut(&group).unwrap().create_entry().unwrap();
        let remote_entry = remote.group_mut(&group).unwrap().create_entry().unwrap();

        let merged = merge_archives(&local, &remote).unwrap();
        assert!(merged.find_entry_by_id(&local_entry).is_some());
        assert!(merged.find_entry_by_id(&remote_entry).is_some());
    }

    #[test]
    fn test_merge_archives_edit_survives_concurrent_delete() {
        let mut base = Archive::with_config(ExecutorConfig::without_padding());
        let group = base.create_group("Shared").unwrap();
        let entry = base.group_mut(&group).unwrap().create_entry().unwrap();

        let mut local = Archive::from_history(&base.history()).unwrap();
        let mut remote = Archive::from_history(&base.history()).unwrap();
        local
            .entry_mut(&entry)
            .unwrap()
            .set_property("password", "edited")
            .unwrap();
        remote.entry_mut(&entry).unwrap().delete().unwrap();

        let merged = merge_archives(&local, &remote).unwrap();
        let survivor = merged.find_entry_by_id(&entry).unwrap();
        assert_eq!(survivor.property("password"), Some("edited"));
    }

    #[test]
    fn test_merge_archives_drops_conflicting_moves() {
        let mut base = Archive::with_config(ExecutorConfig::without_padding());
        let a = base.create_group("A").unwrap();
        let b = base.create_group("B").unwrap();

        let mut local = Archive::from_history(&base.history()).unwrap();
        let mut remote = Archive::from_history(&base.history()).unwrap();
        local.group_mut(&a).unwrap().move_to(&b).unwrap();
        remote.group_mut(&b).unwrap().move_to(&a).unwrap();

        // Remote's move applies first; local's opposite move would cycle
        // and is dropped. Both groups survive.
        let merged = merge_archives(&local, &remote).unwrap();
        assert!(merged.find_group_by_id(&a).is_some());
        assert!(merged.find_group_by_id(&b).is_some());
        assert_eq!(merged.find_group_by_id(&b).unwrap().parent_id(), Some(a.as_str()));
    }

    #[test]
    fn test_merged_archive_is_dirty() {
        let base = Archive::with_config(ExecutorConfig::without_padding());
        let mut local = Archive::from_history(&base.history()).unwrap();
        let mut remote = Archive::from_history(&base.history()).unwrap();
        local.create_group("L").unwrap();
        remote.create_group("R").unwrap();

        let merged = merge_archives(&local, &remote).unwrap();
        assert!(merged.is_dirty());
    }
}
