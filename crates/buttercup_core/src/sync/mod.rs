//! Reconciliation of divergent archive histories.
//!
//! Two copies of an archive that started from the same save share a common
//! history prefix; edits made on each side since then form divergent tails.
//! Reconciliation is a three-way merge over those line sequences:
//!
//! ```text
//!    local history  ──┐
//!                     ├── HistoryComparator ── HistoryDiff ── merge ── fresh Archive
//!    remote history ──┘
//! ```
//!
//! # Key Components
//!
//! - [`HistoryComparator`] - computes the common prefix and divergent tails
//! - [`HistoryDiff`] - the `{common, primary, secondary}` triple
//! - [`merge_histories`] / [`merge_archives`] - the merge itself

mod comparator;
mod merger;

pub use comparator::{HistoryComparator, HistoryDiff};
pub use merger::{merge_archives, merge_histories};
