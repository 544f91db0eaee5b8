use crate::error::ConfigError;
use crate::error::ResultMessage;
use crate::error::TabError;
use crate::options::Format;
use crate::options::Options;
use crate::reader::Reader;
use crate::source::Source;
use crate::table::Table;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

/// Reads one table with a reader chosen once at construction, then writes it out.
///
/// The reader is picked in this order: the reader given by [`Options::with_reader`],
/// the format of a recognized [`Options::file_name`] extension, [`Options::format`].
pub struct Tabulator {
    reader: Box<dyn Reader>,
    /// Format of the built-in reader, `None` for a caller-supplied one
    format: Option<Format>,
    options: Options,
    table: Option<Table>,
}

impl Tabulator {
    pub fn new(mut options: Options) -> Tabulator {
        let (reader, format) = match options.reader.take() {
            Some(reader) => (reader, None),
            None => {
                let format = options.file_name.as_deref()
                    .and_then(Format::from_path)
                    .unwrap_or(options.format);
                (format.reader(), Some(format))
            }
        };
        tracing::debug!(format = format.map_or("custom", |format| format.as_str()), "reader selected");
        Tabulator {
            reader,
            format,
            options,
            table: None,
        }
    }

    /// Reads `source` into a new table.
    ///
    /// On failure the previously read table, if any, stays in place.
    pub fn open(&mut self, mut source: Source<'_>) -> Result<&Table, TabError> {
        let label = self.format.map_or("custom", |format| format.as_str());
        let rows = self.reader
            .read(&self.options, &mut source)
            .with_prefix(&format!("Read {label} source failed"))?;
        let table = Table::new(self.reader.header(), rows);
        tracing::debug!(format = label, columns = table.header().len(), rows = table.len(), "table opened");
        Ok(self.table.insert(table))
    }

    /// Opens a local file as a seekable source and reads it.
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&Table, TabError> {
        let source = Source::open(path)?;
        self.open(source)
    }

    /// The last successfully read table
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn reader(&self) -> &dyn Reader {
        self.reader.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Saves the table in `format` to `path`.
    pub fn write<P: AsRef<Path>>(&self, format: Format, path: P) -> Result<(), TabError> {
        let table = self.opened()?;
        format.writer(table)?.save(path.as_ref())
    }

    /// Serializes the table in `format` into `sink`, returning the bytes written.
    pub fn write_to(&self, format: Format, sink: &mut dyn Write) -> Result<u64, TabError> {
        let table = self.opened()?;
        format.writer(table)?.write_to(sink)
    }

    /// Saves the table as CSV when `path` ends in `.csv`, as XLSX otherwise.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TabError> {
        let path = path.as_ref();
        let is_csv = path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        self.write(if is_csv { Format::Csv } else { Format::Xlsx }, path)
    }

    fn opened(&self) -> Result<&Table, TabError> {
        Ok(self.table.as_ref().ok_or(ConfigError::NotOpened)?)
    }
}
