//! # Workbook decoding
//!
//! Hand-written decoders for Excel workbooks: the zipped XML parts of .xlsx
//! files and the BIFF8 records inside the compound file of .xls files. Both
//! produce a [`Sheet`](sheet::Sheet) that lays its cells out as raw rows.
pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::error::TabError;
use crate::spreadsheet::sheet::Sheet;
use thiserror::Error;

/// Errors raised while decoding a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// A required part is missing from the workbook
    #[error("Missing workbook part '{0}'")]
    FileError(String),

    /// The workbook declares no worksheet
    #[error("Workbook has no sheet")]
    SpreadsheetEmptyError,

    /// The workbook is encrypted
    #[error("Workbook is password protected")]
    SpreadsheetPasswordProtectedError,

    /// A cell refers to a style or shared string that does not exist
    #[error("Invalid {kind} index {index} at '{reference}'")]
    IndexError {
        kind: &'static str,
        index: usize,
        reference: String,
    },

    /// A row number or cell reference lies outside the worksheet grid or cannot be parsed
    #[error("Invalid cell reference '{0}'")]
    ReferenceError(String),
}

/// Common interface of the workbook decoders.
pub(crate) trait Spreadsheet {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Decodes every cell of the sheet at `index` in [`sheet_names`](Spreadsheet::sheet_names).
    fn read_sheet(&mut self, index: usize) -> Result<Sheet, TabError>;

    /// Decodes the sheet called `name`, or the first sheet when no sheet has that name.
    fn read_sheet_or_first(&mut self, name: &str) -> Result<Sheet, TabError> {
        let names = self.sheet_names();
        let index = match names.iter().position(|sheet_name| sheet_name == name) {
            Some(index) => index,
            None if names.is_empty() => Err(SpreadsheetError::SpreadsheetEmptyError)?,
            None => {
                tracing::debug!(requested = name, used = %names[0], "sheet not found, reading the first sheet");
                0
            }
        };
        self.read_sheet(index)
    }
}
