use std::collections::BTreeSet;

use crate::domain::entities::table::{RowIdentity, Table};
use crate::error::EditorError;

/// Set difference of row identities between a pre-edit and a post-edit table.
///
/// A row whose cell changed shows up once in `removed` and once in `added`; the
/// two are never paired into an edit. Duplicate rows collapse to one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDiff {
    pub removed: BTreeSet<RowIdentity>,
    pub added: BTreeSet<RowIdentity>,
}

impl RowDiff {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

pub fn diff_rows(original: &Table, edited: &Table) -> Result<RowDiff, EditorError> {
    original.ensure_same_columns(edited)?;

    let before: BTreeSet<RowIdentity> = original.row_identities().collect();
    let after: BTreeSet<RowIdentity> = edited.row_identities().collect();

    Ok(RowDiff {
        removed: before.difference(&after).copied().collect(),
        added: after.difference(&before).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[Vec<&str>]) -> Table {
        Table::from_text_rows(&["id", "name"], rows).expect("valid table")
    }

    #[test]
    fn reordering_is_not_a_change() {
        let original = table(&[vec!["1", "a"], vec!["2", "b"]]);
        let edited = table(&[vec!["2", "b"], vec!["1", "a"]]);
        let diff = diff_rows(&original, &edited).expect("same columns");
        assert!(diff.is_empty());
    }

    #[test]
    fn cell_edit_is_one_removed_and_one_added() {
        let original = table(&[vec!["1", "a"], vec!["2", "b"]]);
        let edited = table(&[vec!["1", "a"], vec!["2", "B"]]);
        let diff = diff_rows(&original, &edited).expect("same columns");
        assert_eq!(diff.removed_count(), 1);
        assert_eq!(diff.added_count(), 1);
    }

    #[test]
    fn removed_duplicate_collapses() {
        let original = table(&[vec!["1", "a"], vec!["1", "a"], vec!["2", "b"]]);
        let edited = table(&[vec!["1", "a"], vec!["2", "b"]]);
        let diff = diff_rows(&original, &edited).expect("same columns");
        assert!(diff.is_empty());
    }

    #[test]
    fn added_row_only() {
        let original = table(&[vec!["1", "a"]]);
        let edited = table(&[vec!["1", "a"], vec!["2", "b"]]);
        let diff = diff_rows(&original, &edited).expect("same columns");
        assert!(!diff.has_removals());
        assert_eq!(diff.added_count(), 1);
    }

    #[test]
    fn diverging_columns_are_rejected() {
        let original = table(&[vec!["1", "a"]]);
        let edited = Table::from_text_rows(&["id", "label"], &[vec!["1", "a"]])
            .expect("valid table");
        assert!(matches!(
            diff_rows(&original, &edited),
            Err(EditorError::ShapeMismatch { .. })
        ));
    }
}
