use crate::error::TabError;
use crate::options::Format;
use crate::options::Options;
use crate::reader::sheet_rows;
use crate::reader::split_header;
use crate::reader::Reader;
use crate::source::Source;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::HeaderInfo;
use std::io::Cursor;
use std::io::Read;

/// Reads Excel 2007+ workbooks. A plain stream is buffered into memory since the archive needs seeking.
#[derive(Clone, Debug, Default)]
pub struct XlsxReader {
    header: HeaderInfo,
}

impl Reader for XlsxReader {
    fn read(&mut self, options: &Options, source: &mut Source<'_>) -> Result<Vec<Vec<String>>, TabError> {
        let rows = match source {
            Source::Seekable(reader) => sheet_rows(XlsxSpreadsheet::open(reader)?, options)?,
            Source::Stream(reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                sheet_rows(XlsxSpreadsheet::open(Cursor::new(bytes))?, options)?
            }
        };
        let (header, rows) = split_header(options, Format::Xlsx, rows);
        self.header = header;
        Ok(rows)
    }

    fn header(&self) -> HeaderInfo {
        self.header.clone()
    }
}
