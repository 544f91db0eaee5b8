use std::fmt::Display;

/// Ordered column names of a table, taken from the configured header row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    columns: Vec<String>,
}

impl HeaderInfo {
    pub fn new(columns: Vec<String>) -> Self {
        HeaderInfo { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Result of a read: a header and the data rows below it.
///
/// Immutable once built; a new read produces a new table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    header: HeaderInfo,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: HeaderInfo, rows: Vec<Vec<String>>) -> Self {
        Table { header, rows }
    }

    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Table[{}] ({} rows)", self.header.columns.join(", "), self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn display_summary() {
        let table = Table::new(
            HeaderInfo::new(strings(&["a", "b"])),
            vec![strings(&["1", "2"]), strings(&["3", "4"])],
        );
        assert_eq!(table.to_string(), "Table[a, b] (2 rows)");
        assert_eq!(table.len(), 2);
        assert_eq!(table.header().len(), 2);
    }

    #[test]
    fn table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Table>();
    }
}
