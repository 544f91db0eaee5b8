//! Header detection and row width reconciliation shared by every format reader.
use crate::table::HeaderInfo;

/// How a data row whose width differs from the header is treated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Right-pad short rows with empty strings; longer rows are kept as they are
    #[default]
    Pad,
    /// Drop every row whose width is not exactly the header width
    Drop,
    /// Pad short rows and truncate long ones
    Fit,
}

impl RowPolicy {
    /// Reconciles one non-empty row against `width`, `None` when the row is dropped.
    pub fn apply(self, mut row: Vec<String>, width: usize) -> Option<Vec<String>> {
        match self {
            RowPolicy::Drop if row.len() != width => None,
            RowPolicy::Drop => Some(row),
            RowPolicy::Pad => {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                Some(row)
            }
            RowPolicy::Fit => {
                row.resize(width, String::new());
                Some(row)
            }
        }
    }
}

/// Splits raw rows into a header and reconciled data rows.
///
/// `header_row` is 1-based: earlier rows are skipped, the row at `header_row` becomes
/// the header and fixes the width, later empty rows are discarded. When the input has
/// fewer rows the header and the data are both empty.
pub fn reconcile<I>(rows: I, header_row: usize, policy: RowPolicy) -> (HeaderInfo, Vec<Vec<String>>)
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut rows = rows.into_iter().skip(header_row.max(1) - 1);
    let Some(header) = rows.next() else {
        return (HeaderInfo::default(), Vec::new());
    };
    let width = header.len();
    let data = rows
        .filter(|row| !row.is_empty())
        .filter_map(|row| policy.apply(row, width))
        .collect();
    (HeaderInfo::new(header), data)
}

/// Reconciles rows that already come with a separate header (HTML tables).
pub fn fit_rows(rows: Vec<Vec<String>>, width: usize, policy: RowPolicy) -> Vec<Vec<String>> {
    rows.into_iter()
        .filter(|row| !row.is_empty())
        .filter_map(|row| policy.apply(row, width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect()
    }

    #[test]
    fn pad_short_rows_keep_long_rows() {
        let (header, data) = reconcile(rows(&[&["a", "b", "c"], &["1", "2"], &["3", "4", "5", "6"]]), 1, RowPolicy::Pad);
        assert_eq!(header.columns(), ["a", "b", "c"]);
        assert_eq!(data, rows(&[&["1", "2", ""], &["3", "4", "5", "6"]]));
        assert!(data.iter().all(|row| row.len() >= header.len()));
    }

    #[test]
    fn fit_is_rectangular() {
        let (header, data) = reconcile(rows(&[&["a", "b", "c"], &["1", "2"], &["3", "4", "5", "6"]]), 1, RowPolicy::Fit);
        assert_eq!(data, rows(&[&["1", "2", ""], &["3", "4", "5"]]));
        assert!(data.iter().all(|row| row.len() == header.len()));
    }

    #[test]
    fn drop_mismatched_rows() {
        let (header, data) = reconcile(rows(&[&["a", "b", "c"], &["1", "2"], &["3", "4", "5"]]), 1, RowPolicy::Drop);
        assert_eq!(header.len(), 3);
        assert_eq!(data, rows(&[&["3", "4", "5"]]));
    }

    #[test]
    fn skip_rows_before_header() {
        let input = rows(&[&["title"], &[], &["a", "b"], &["1", "2"], &[], &["3"]]);
        let (header, data) = reconcile(input, 3, RowPolicy::Pad);
        assert_eq!(header.columns(), ["a", "b"]);
        assert_eq!(data, rows(&[&["1", "2"], &["3", ""]]));
        assert!(!data.iter().any(|row| row[0] == "title" || row[0] == "a"));
    }

    #[test]
    fn header_beyond_input() {
        let (header, data) = reconcile(rows(&[&["a"], &["1"]]), 5, RowPolicy::Pad);
        assert!(header.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn header_row_zero_means_first_row() {
        let (header, data) = reconcile(rows(&[&["a"], &["1"]]), 0, RowPolicy::Pad);
        assert_eq!(header.columns(), ["a"]);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn fit_rows_without_header_step() {
        let data = fit_rows(rows(&[&["1"], &[], &["2", "3", "4"]]), 2, RowPolicy::Fit);
        assert_eq!(data, rows(&[&["1", ""], &["2", "3"]]));
    }
}
