use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;

use crate::error::EditorError;

/// A single typed cell.
#[derive(Debug, Clone)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Missing sentinel, including a NaN number.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

// Numbers compare by bit pattern so that equality stays reflexive for NaN and
// agrees with `Hash`. Negative zero is folded into zero first.
fn number_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Missing, CellValue::Missing) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => number_bits(*a) == number_bits(*b),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Missing => {}
            CellValue::Text(v) => v.hash(state),
            CellValue::Number(v) => number_bits(*v).hash(state),
            CellValue::DateTime(v) => v.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Text(v) => f.write_str(v),
            CellValue::Number(v) => f.write_str(&format_number(*v)),
            CellValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Content hash of one row's ordered cell tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowIdentity(pub u64);

impl RowIdentity {
    pub fn of(row: &[CellValue]) -> Self {
        let mut hasher = DefaultHasher::new();
        row.hash(&mut hasher);
        RowIdentity(hasher.finish())
    }
}

/// Named columns plus rows aligned positionally with them.
///
/// Every row has exactly `columns.len()` cells; constructors reject anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, EditorError> {
        let width = columns.len();
        if let Some((row_idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(EditorError::shape(
                format!("{width} cells per row"),
                format!("{} cells in row {row_idx}", row.len()),
            ));
        }
        Ok(Self { columns, rows })
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table of text cells. Convenience for imports and tests.
    pub fn from_text_rows<S: AsRef<str>>(
        columns: &[S],
        rows: &[Vec<S>],
    ) -> Result<Self, EditorError> {
        let columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| CellValue::text(v.as_ref())).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        (self.columns, self.rows)
    }

    /// Replaces the column labels, keeping rows untouched.
    pub fn with_columns(self, columns: Vec<String>) -> Result<Self, EditorError> {
        if columns.len() != self.columns.len() {
            return Err(EditorError::shape(
                format!("{} column labels", self.columns.len()),
                format!("{} column labels", columns.len()),
            ));
        }
        Ok(Self {
            columns,
            rows: self.rows,
        })
    }

    /// Same shape, every cell passed through `f`.
    pub fn map_cells<F>(&self, mut f: F) -> Table
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(&mut f).collect())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Errors unless `other` carries the exact same column labels in the same order.
    pub fn ensure_same_columns(&self, other: &Table) -> Result<(), EditorError> {
        if self.columns == other.columns {
            return Ok(());
        }
        Err(EditorError::shape(
            format!("columns [{}]", self.columns.join(", ")),
            format!("columns [{}]", other.columns.join(", ")),
        ))
    }

    pub fn row_identities(&self) -> impl Iterator<Item = RowIdentity> + '_ {
        self.rows.iter().map(|row| RowIdentity::of(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_ragged_rows() {
        let result = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::text("x")]],
        );
        assert!(matches!(result, Err(EditorError::ShapeMismatch { .. })));
    }

    #[test]
    fn zero_column_table_is_valid() {
        let table = Table::new(Vec::new(), vec![Vec::new(), Vec::new()])
            .expect("empty rows fit zero columns");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn identical_rows_share_identity() {
        let a = vec![CellValue::text("x"), CellValue::Number(1.5), CellValue::Missing];
        let b = a.clone();
        assert_eq!(RowIdentity::of(&a), RowIdentity::of(&b));
    }

    #[test]
    fn text_and_number_with_same_rendering_differ() {
        let a = vec![CellValue::text("1")];
        let b = vec![CellValue::Number(1.0)];
        assert_ne!(RowIdentity::of(&a), RowIdentity::of(&b));
    }

    #[test]
    fn nan_is_missing_and_equal_to_itself() {
        let nan = CellValue::Number(f64::NAN);
        assert!(nan.is_missing());
        assert_eq!(nan, nan.clone());
    }

    #[test]
    fn signed_zeros_share_identity() {
        let positive = vec![CellValue::Number(0.0)];
        let negative = vec![CellValue::Number(-0.0)];
        assert_eq!(positive, negative);
        assert_eq!(RowIdentity::of(&positive), RowIdentity::of(&negative));
    }

    #[test]
    fn as_text_only_borrows_text_cells() {
        assert_eq!(CellValue::text("abc").as_text(), Some("abc"));
        assert_eq!(CellValue::Number(1.0).as_text(), None);
        assert_eq!(CellValue::Missing.as_text(), None);
    }

    #[test]
    fn display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Missing.to_string(), "");
    }
}
