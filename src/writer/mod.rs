//! Serializers for a read [`Table`]
mod csv;
mod xlsx;

pub use self::csv::CsvWriter;
pub use self::xlsx::XlsxWriter;

use crate::error::destination;
use crate::error::ConfigError;
use crate::error::TabError;
use crate::options::Format;
use crate::table::Table;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;

/// Writes one table in one format.
pub trait Writer {
    /// Serializes the table into `sink` and returns the number of bytes written.
    fn write_to(&self, sink: &mut dyn Write) -> Result<u64, TabError>;

    /// Serializes the table into the file at `path`, creating missing parent
    /// directories and replacing an existing file.
    fn save(&self, path: &Path) -> Result<(), TabError>;
}

impl Format {
    /// A writer for `table` in this format; only XLSX and CSV can be written.
    pub fn writer<'a>(&self, table: &'a Table) -> Result<Box<dyn Writer + 'a>, TabError> {
        match self {
            Format::Xlsx => Ok(Box::new(XlsxWriter::new(table))),
            Format::Csv => Ok(Box::new(CsvWriter::new(table))),
            Format::Xls | Format::HtmlTable => Err(ConfigError::UnsupportedWriteFormat(self.as_str()))?,
        }
    }
}

/// Creates the parent directory of `path` when it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), TabError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(destination(parent)),
        _ => Ok(()),
    }
}

/// Passes writes through and counts the bytes accepted.
pub(crate) struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        CountingWriter { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.count += size as u64;
        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
