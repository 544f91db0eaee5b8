use crate::error::destination;
use crate::error::TabError;
use crate::table::Table;
use crate::writer::ensure_parent_dir;
use crate::writer::CountingWriter;
use crate::writer::Writer;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Byte order mark written first so spreadsheet programs detect UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the table as UTF-8 comma separated values with standard quoting.
///
/// An empty header is left out; rows keep their own widths.
pub struct CsvWriter<'a> {
    table: &'a Table,
}

impl<'a> CsvWriter<'a> {
    pub fn new(table: &'a Table) -> Self {
        CsvWriter { table }
    }

    fn write_records<W: Write>(&self, mut sink: W) -> Result<W, TabError> {
        sink.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(sink);
        let header = self.table.header();
        if !header.is_empty() {
            writer.write_record(header.columns())?;
        }
        for row in self.table.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(writer.into_inner().map_err(|error| error.into_error())?)
    }
}

impl Writer for CsvWriter<'_> {
    fn write_to(&self, sink: &mut dyn Write) -> Result<u64, TabError> {
        let counter = self.write_records(CountingWriter::new(sink))
            .map_err(|error| error.at_destination("sink"))?;
        tracing::debug!(bytes = counter.count(), rows = self.table.len(), "csv written");
        Ok(counter.count())
    }

    fn save(&self, path: &Path) -> Result<(), TabError> {
        ensure_parent_dir(path)?;
        let target = path.display().to_string();
        let file = File::create(path).map_err(destination(path))?;
        let mut writer = self.write_records(BufWriter::new(file))
            .map_err(|error| error.at_destination(&target))?;
        writer.flush().map_err(destination(path))?;
        tracing::debug!(path = %target, rows = self.table.len(), "csv saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::table::HeaderInfo;
    use std::io;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn bom_header_and_quoting() -> Result<(), TabError> {
        let table = Table::new(
            HeaderInfo::new(strings(&["name", "note"])),
            vec![strings(&["Smith, J", "say \"hi\""]), strings(&["x", "", "extra"])],
        );
        let mut sink = Vec::new();
        let size = CsvWriter::new(&table).write_to(&mut sink)?;
        assert_eq!(size, sink.len() as u64);
        assert_eq!(sink, "\u{feff}name,note\n\"Smith, J\",\"say \"\"hi\"\"\"\nx,,extra\n".as_bytes());
        Ok(())
    }

    #[test]
    fn empty_header_is_left_out() -> Result<(), TabError> {
        let table = Table::new(HeaderInfo::default(), vec![strings(&["1", "2"])]);
        let mut sink = Vec::new();
        CsvWriter::new(&table).write_to(&mut sink)?;
        assert_eq!(sink, "\u{feff}1,2\n".as_bytes());
        Ok(())
    }

    #[test]
    fn failing_sink_is_a_destination_error() {
        let table = Table::new(HeaderInfo::new(strings(&["a"])), Vec::new());
        let error = CsvWriter::new(&table).write_to(&mut Full).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DestinationAccess);
    }

    #[test]
    fn save_replaces_existing_file() -> Result<(), TabError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("out.csv");
        std::fs::write(&path, "old content that is longer than the new one")?;
        let table = Table::new(HeaderInfo::new(strings(&["a"])), vec![strings(&["1"])]);
        CsvWriter::new(&table).save(&path)?;
        assert_eq!(std::fs::read(&path)?, "\u{feff}a\n1\n".as_bytes());
        Ok(())
    }
}
