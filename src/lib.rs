//! # Tabular Document Reader & Writer
//!
//! Reads one table out of a tabular document and writes it back out in another format.
//!
//! ## Features
//!
//! - **Input formats**: Excel workbooks (`.xlsx`, `.xlsm`, `.xls`), delimited text
//!   (UTF-8 with or without BOM, or a legacy encoding, GBK by default) and the
//!   Nth `<table>` of an HTML page
//! - **Output formats**: Excel workbooks (`.xlsx`) and CSV with a UTF-8 byte order mark
//! - **Header handling**: any 1-based row can hold the column names, rows above it are skipped
//! - **Row reconciliation**: short rows are padded, mismatched rows dropped or fitted
//!   to the header width depending on the [`RowPolicy`]
//! - **Pure Rust decoders**: zipped XML parts and BIFF8 compound files are decoded by hand
//!
//! ## Example
//!
//! ```no_run
//! use rusty_tab::{Format, Options, Source, Tabulator};
//!
//! # fn main() -> Result<(), rusty_tab::TabError> {
//! let mut tabulator = Tabulator::new(Options::default().with_file_name("input.csv").with_header_row(2));
//! let table = tabulator.open(Source::open("input.csv")?)?;
//! println!("{table}");
//! tabulator.write(Format::Xlsx, "output/table.xlsx")?;
//! # Ok(())
//! # }
//! ```
mod encoding;
mod error;
mod helpers;
mod html;
mod options;
mod reader;
mod reconcile;
mod source;
mod spreadsheet;
mod table;
mod tabulator;
mod writer;

pub use crate::encoding::to_utf8;
pub use crate::encoding::DEFAULT_LEGACY_ENCODING;
pub use crate::error::ConfigError;
pub use crate::error::ErrorKind;
pub use crate::error::TabError;
pub use crate::html::HtmlError;
pub use crate::html::HtmlTable;
pub use crate::html::Page;
pub use crate::options::Format;
pub use crate::options::Options;
pub use crate::reader::CsvReader;
pub use crate::reader::HtmlTableReader;
pub use crate::reader::Reader;
pub use crate::reader::XlsReader;
pub use crate::reader::XlsxReader;
pub use crate::reconcile::fit_rows;
pub use crate::reconcile::reconcile;
pub use crate::reconcile::RowPolicy;
pub use crate::source::ReadSeek;
pub use crate::source::Source;
pub use crate::spreadsheet::xls::XlsError;
pub use crate::spreadsheet::SpreadsheetError;
pub use crate::table::HeaderInfo;
pub use crate::table::Table;
pub use crate::tabulator::Tabulator;
pub use crate::writer::CsvWriter;
pub use crate::writer::Writer;
pub use crate::writer::XlsxWriter;
