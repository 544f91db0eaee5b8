//! Format readers turning a [`Source`] into header and rows
mod csv;
mod html;
mod xls;
mod xlsx;

pub use self::csv::CsvReader;
pub use self::html::HtmlTableReader;
pub use self::xls::XlsReader;
pub use self::xlsx::XlsxReader;

use crate::error::TabError;
use crate::options::Format;
use crate::options::Options;
use crate::reconcile::reconcile;
use crate::source::Source;
use crate::spreadsheet::Spreadsheet;
use crate::table::HeaderInfo;

/// Reads one format.
///
/// `read` returns the data rows and records the header, which [`header`](Reader::header)
/// then reports until the next `read`. Implementations outside this crate can be
/// plugged in with [`Options::with_reader`].
pub trait Reader: Send {
    fn read(&mut self, options: &Options, source: &mut Source<'_>) -> Result<Vec<Vec<String>>, TabError>;

    /// Header found by the last successful read, empty before it
    fn header(&self) -> HeaderInfo;
}

impl Format {
    /// A fresh reader for this format
    pub fn reader(&self) -> Box<dyn Reader> {
        match self {
            Format::Xls => Box::<XlsReader>::default(),
            Format::Xlsx => Box::<XlsxReader>::default(),
            Format::Csv => Box::<CsvReader>::default(),
            Format::HtmlTable => Box::<HtmlTableReader>::default(),
        }
    }
}

/// Splits raw rows with the configured header row and the policy in effect for `format`.
pub(crate) fn split_header(options: &Options, format: Format, rows: Vec<Vec<String>>) -> (HeaderInfo, Vec<Vec<String>>) {
    let policy = options.policy_for(format).unwrap_or_default();
    let (header, rows) = reconcile(rows, options.header_row, policy);
    tracing::debug!(format = format.as_str(), columns = header.len(), rows = rows.len(), ?policy, "rows reconciled");
    (header, rows)
}

/// Raw rows of the configured sheet, or of the first sheet when it does not exist
pub(crate) fn sheet_rows<S: Spreadsheet>(mut spreadsheet: S, options: &Options) -> Result<Vec<Vec<String>>, TabError> {
    Ok(spreadsheet.read_sheet_or_first(&options.sheet)?.into_rows())
}
