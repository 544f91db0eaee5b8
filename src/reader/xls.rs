use crate::error::ConfigError;
use crate::error::TabError;
use crate::options::Format;
use crate::options::Options;
use crate::reader::sheet_rows;
use crate::reader::split_header;
use crate::reader::Reader;
use crate::source::Source;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::table::HeaderInfo;

/// Reads Excel 97-2003 workbooks; only seekable sources are accepted.
#[derive(Clone, Debug, Default)]
pub struct XlsReader {
    header: HeaderInfo,
}

impl Reader for XlsReader {
    fn read(&mut self, options: &Options, source: &mut Source<'_>) -> Result<Vec<Vec<String>>, TabError> {
        let Source::Seekable(reader) = source else {
            return Err(ConfigError::NotSeekable(Format::Xls.as_str()).into());
        };
        let rows = sheet_rows(XlsSpreadsheet::open(reader)?, options)?;
        let (header, rows) = split_header(options, Format::Xls, rows);
        self.header = header;
        Ok(rows)
    }

    fn header(&self) -> HeaderInfo {
        self.header.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spreadsheet::xls::testing::compound_file;
    use crate::spreadsheet::xls::testing::label_rows;
    use crate::spreadsheet::xls::testing::workbook_stream;
    use std::io::Cursor;

    #[test]
    fn stream_is_rejected_before_parsing() {
        let mut reader = XlsReader::default();
        let mut source = Source::stream(Cursor::new(b"not even a workbook".to_vec()));
        let error = reader.read(&Options::default(), &mut source).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(matches!(error, TabError::ConfigError(ConfigError::NotSeekable("xls"))));
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let mut reader = XlsReader::default();
        let mut source = Source::from_bytes(vec![7u8; 2048]);
        let error = reader.read(&Options::default(), &mut source).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decode);
        assert!(reader.header().is_empty());
    }

    #[test]
    fn drop_rows_narrower_than_the_header() -> Result<(), TabError> {
        let cells = label_rows(&[
            &["name", "score", "city"],
            &["Bob", "7", "Paris"],
            &["Eve", "3"],
            &[],
            &["Ann", "9", "Rome"],
        ]);
        let mut reader = XlsReader::default();
        let mut source = Source::from_bytes(compound_file(&workbook_stream(&[], &cells)));
        let rows = reader.read(&Options::default(), &mut source)?;
        assert_eq!(reader.header().columns(), ["name", "score", "city"]);
        assert_eq!(rows, [["Bob", "7", "Paris"], ["Ann", "9", "Rome"]]);
        Ok(())
    }
}
