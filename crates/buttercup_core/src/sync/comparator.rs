//! History comparison: common prefix and divergent tails.

/// The outcome of comparing two histories.
///
/// `common ++ primary` reproduces the first input; `common ++ secondary`
/// reproduces the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDiff {
    /// Longest line-equal shared prefix
    pub common: Vec<String>,
    /// First history's divergent tail
    pub primary: Vec<String>,
    /// Second history's divergent tail
    pub secondary: Vec<String>,
}

/// Compares two histories sharing a common origin.
#[derive(Debug)]
pub struct HistoryComparator<'a> {
    primary: &'a [String],
    secondary: &'a [String],
}

impl<'a> HistoryComparator<'a> {
    /// Compare `primary` (usually local) against `secondary` (usually the
    /// staged remote).
    pub fn new(primary: &'a [String], secondary: &'a [String]) -> Self {
        Self { primary, secondary }
    }

    /// Length of the longest shared prefix, by line equality.
    pub fn common_prefix_len(&self) -> usize {
        self.primary
            .iter()
            .zip(self.secondary.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// True if either side has lines past the shared prefix.
    pub fn archives_differ(&self) -> bool {
        let common = self.common_prefix_len();
        self.primary.len() > common || self.secondary.len() > common
    }

    /// Split both histories into the `{common, primary, secondary}` triple.
    pub fn calculate_differences(&self) -> HistoryDiff {
        let common = self.common_prefix_len();
        HistoryDiff {
            common: self.primary[..common].to_vec(),
            primary: self.primary[common..].to_vec(),
            secondary: self.secondary[common..].to_vec(),
        }
    }
}
