/// Neutral marker every placeholder label is folded into before numbering.
pub const PLACEHOLDER_MARKER: &str = ".";

/// Prefix the columnar reader gives to columns that had no header.
const AUTO_NAME_PREFIX: &str = "Unnamed";

fn is_placeholder(label: &str) -> bool {
    label.trim().is_empty() || label.starts_with(AUTO_NAME_PREFIX)
}

/// Gives placeholder and blank labels stable, unique names.
///
/// Placeholders (and literal `.` labels) become `"0"`, `"1"`, ... counted left to
/// right over the placeholder columns only. Every other label is kept as is, even
/// if it duplicates another.
pub fn normalize_columns<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let marked = labels.iter().map(|label| {
        let label = label.as_ref();
        if is_placeholder(label) {
            PLACEHOLDER_MARKER
        } else {
            label
        }
    });

    let mut counter = 0_usize;
    marked
        .map(|label| {
            if label == PLACEHOLDER_MARKER {
                let name = counter.to_string();
                counter += 1;
                name
            } else {
                label.to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_left_to_right() {
        let labels = ["Name", "Unnamed: 1", "", "Date", "Unnamed: 4"];
        assert_eq!(
            normalize_columns(&labels),
            vec!["Name", "0", "1", "Date", "2"]
        );
    }

    #[test]
    fn literal_marker_is_numbered_too() {
        assert_eq!(normalize_columns(&[".", "a", "."]), vec!["0", "a", "1"]);
    }

    #[test]
    fn duplicate_regular_labels_pass_through() {
        assert_eq!(normalize_columns(&["a", "a"]), vec!["a", "a"]);
    }

    #[test]
    fn whitespace_only_label_is_blank() {
        assert_eq!(normalize_columns(&["  ", "x"]), vec!["0", "x"]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let labels: [&str; 0] = [];
        assert!(normalize_columns(&labels).is_empty());
    }
}
