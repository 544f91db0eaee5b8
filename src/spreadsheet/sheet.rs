use crate::spreadsheet::cell::Cell;

/// Cells collected from one worksheet, in the order the workbook stores them.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// Non-empty cells
    pub(crate) cells: Vec<Cell>,
    /// Largest row index seen so far
    pub(crate) row_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Appends a cell; empty values are not stored.
    pub(crate) fn push(&mut self, cell: Cell) {
        if cell.value.is_empty() {
            return;
        }
        self.row_upper_bound = Some(self.row_upper_bound.map_or(cell.row, |row| row.max(cell.row)));
        self.cells.push(cell);
    }

    /// Lays the cells out as physical rows, from the first worksheet row to the last used one.
    ///
    /// Rows without cells become empty vectors. Within a row, gaps before the
    /// last used column are filled with empty strings.
    pub(crate) fn into_rows(self) -> Vec<Vec<String>> {
        let Some(row_upper_bound) = self.row_upper_bound else {
            return Vec::new();
        };
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_upper_bound + 1];
        for cell in self.cells {
            let row = &mut rows[cell.row];
            if row.len() <= cell.col {
                row.resize(cell.col + 1, String::new());
            }
            row[cell.col] = cell.to_string();
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn cell(row: usize, col: usize, value: &str) -> Cell {
        Cell { row, col, kind: CellType::InlineString, value: value.to_owned() }
    }

    #[test]
    fn rows_keep_physical_positions() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.push(cell(1, 0, "a"));
        sheet.push(cell(1, 2, "c"));
        sheet.push(cell(3, 1, "x"));
        sheet.push(cell(4, 0, ""));
        assert_eq!(sheet.row_upper_bound, Some(3));
        let rows = sheet.into_rows();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], ["a", "", "c"]);
        assert!(rows[2].is_empty());
        assert_eq!(rows[3], ["", "x"]);
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        let sheet = Sheet::new("Sheet1");
        assert!(sheet.is_empty());
        assert!(sheet.into_rows().is_empty());
    }
}
