use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::entities::table::{CellValue, Table};
use crate::{DATE_OUTPUT_FORMAT, MISSING_MARKER};

/// Textual spelling of a missing value some writers leave behind.
const TEXTUAL_NAN: &str = "nan";

const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ISO_DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// Position of the year field within a candidate format.
#[derive(Debug, Clone, Copy)]
enum YearField {
    Leading,
    Trailing,
}

impl YearField {
    /// chrono's `%Y` accepts short, signed and space-padded years, so the
    /// year is checked for exactly four ASCII digits before parsing.
    fn is_full_year(self, text: &str) -> bool {
        let year = match self {
            YearField::Leading => text.split('-').next(),
            YearField::Trailing => text.rsplit('/').next(),
        };
        year.is_some_and(|y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()))
    }
}

const DATE_INPUT_FORMATS: [(&str, YearField); 2] = [
    (ISO_DATE_INPUT_FORMAT, YearField::Leading),
    (DATE_OUTPUT_FORMAT, YearField::Trailing),
];

/// First candidate format that parses `text`, tried in fixed order.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if !text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if YearField::Leading.is_full_year(text) {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, DATETIME_INPUT_FORMAT) {
            return Some(parsed.date());
        }
    }
    DATE_INPUT_FORMATS
        .iter()
        .filter(|(_, year)| year.is_full_year(text))
        .find_map(|(fmt, _)| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Canonical form of one cell: `--` for missing, `DD/MM/YYYY` for anything
/// date-like, the original value otherwise.
pub fn normalize_cell(value: &CellValue) -> CellValue {
    if value.is_missing() {
        return CellValue::text(MISSING_MARKER);
    }
    match value {
        CellValue::Text(text) if text == TEXTUAL_NAN => CellValue::text(MISSING_MARKER),
        CellValue::DateTime(instant) => {
            CellValue::Text(instant.format(DATE_OUTPUT_FORMAT).to_string())
        }
        CellValue::Text(text) => match parse_date_text(text) {
            Some(date) => CellValue::Text(date.format(DATE_OUTPUT_FORMAT).to_string()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

/// Applies [`normalize_cell`] to every cell. Shape and labels are preserved.
pub fn normalize_dates(table: &Table) -> Table {
    table.map_cells(normalize_cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::text(value)
    }

    #[test]
    fn missing_values_become_marker() {
        assert_eq!(normalize_cell(&CellValue::Missing), text("--"));
        assert_eq!(normalize_cell(&CellValue::Number(f64::NAN)), text("--"));
        assert_eq!(normalize_cell(&text("nan")), text("--"));
    }

    #[test]
    fn textual_nan_is_case_sensitive() {
        assert_eq!(normalize_cell(&text("NaN")), text("NaN"));
    }

    #[test]
    fn native_instant_is_formatted() {
        let instant = NaiveDate::from_ymd_opt(2023, 2, 10)
            .and_then(|d| d.and_hms_opt(13, 45, 0))
            .expect("valid instant");
        assert_eq!(
            normalize_cell(&CellValue::DateTime(instant)),
            text("10/02/2023")
        );
    }

    #[test]
    fn candidate_formats_are_recognized() {
        assert_eq!(
            normalize_cell(&text("2023-02-10 08:30:00")),
            text("10/02/2023")
        );
        assert_eq!(normalize_cell(&text("2023-02-10")), text("10/02/2023"));
        assert_eq!(normalize_cell(&text("10/02/2023")), text("10/02/2023"));
    }

    #[test]
    fn unparseable_values_pass_through() {
        assert_eq!(normalize_cell(&text("not-a-date")), text("not-a-date"));
        assert_eq!(normalize_cell(&text("2023-02-30")), text("2023-02-30"));
        assert_eq!(
            normalize_cell(&text("2023-02-10T08:30:00")),
            text("2023-02-10T08:30:00")
        );
        assert_eq!(normalize_cell(&text("")), text(""));
        assert_eq!(normalize_cell(&CellValue::Number(3.0)), CellValue::Number(3.0));
    }

    #[test]
    fn short_or_padded_years_are_not_dates() {
        for raw in ["5/1/23", "1/2/3", "23-01-05", " 2023-01-05", "+2023-01-05"] {
            assert_eq!(normalize_cell(&text(raw)), text(raw), "{raw:?}");
            assert_eq!(parse_date_text(raw), None, "{raw:?}");
        }
        assert_eq!(normalize_cell(&text("10/02/2023 ")), text("10/02/2023 "));
    }

    #[test]
    fn unpadded_day_and_month_are_accepted() {
        assert_eq!(normalize_cell(&text("2023-1-5")), text("05/01/2023"));
        assert_eq!(normalize_cell(&text("5/1/2023")), text("05/01/2023"));
        let normalized = normalize_cell(&text("2023-1-5"));
        assert_eq!(normalized.as_text(), Some("05/01/2023"));
    }

    #[test]
    fn marker_is_stable() {
        assert_eq!(normalize_cell(&text("--")), text("--"));
    }

    #[test]
    fn table_shape_is_preserved() {
        let table = Table::new(
            vec!["when".into(), "what".into()],
            vec![
                vec![text("2023-01-05"), text("A")],
                vec![CellValue::Missing, text("B")],
            ],
        )
        .expect("valid table");
        let normalized = normalize_dates(&table);
        assert_eq!(normalized.columns(), table.columns());
        assert_eq!(
            normalized.rows(),
            &[
                vec![text("05/01/2023"), text("A")],
                vec![text("--"), text("B")],
            ]
        );
    }
}
