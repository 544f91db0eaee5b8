use crate::error::destination;
use crate::error::ConfigError;
use crate::error::TabError;
use crate::spreadsheet::reference::index_to_reference;
use crate::table::Table;
use crate::writer::ensure_parent_dir;
use crate::writer::CountingWriter;
use crate::writer::Writer;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use std::fs::File;
use std::io::BufWriter;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const WORKSHEET_PATH: &str = "xl/worksheets/sheet1.xml";

/// Fixed parts of a single-sheet package
const PARTS: &[(&str, &str)] = &[
    (
        "[Content_Types].xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
    ),
    (
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    ),
    (
        "xl/workbook.xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
    ),
    (
        "xl/_rels/workbook.xml.rels",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
    ),
];

/// Writes the table as a one-sheet workbook named "Sheet1".
///
/// The header goes to row 1 and every data row below it, each value as an inline
/// string. Rows are streamed into the deflated worksheet entry one at a time.
pub struct XlsxWriter<'a> {
    table: &'a Table,
}

impl<'a> XlsxWriter<'a> {
    pub fn new(table: &'a Table) -> Self {
        XlsxWriter { table }
    }

    fn check_header(&self) -> Result<(), TabError> {
        if self.table.header().is_empty() {
            Err(ConfigError::MissingHeader)?
        }
        Ok(())
    }

    fn write_package<W: Write + Seek>(&self, mut zip: ZipWriter<W>) -> Result<W, TabError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in PARTS {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }
        zip.start_file(WORKSHEET_PATH, options)?;
        self.write_worksheet(&mut zip)?;
        Ok(zip.finish()?)
    }

    fn write_worksheet<W: Write>(&self, sink: W) -> Result<(), TabError> {
        let mut writer = quick_xml::Writer::new(sink);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.write_event(Event::Start(BytesStart::new("worksheet").with_attributes([("xmlns", NS_MAIN)])))?;
        writer.write_event(Event::Start(BytesStart::new("sheetData")))?;
        let header = std::iter::once(self.table.header().columns());
        let rows = header.chain(self.table.rows().iter().map(Vec::as_slice));
        for (row, values) in rows.enumerate() {
            write_row(&mut writer, row, values)?;
        }
        writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
        writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
        Ok(())
    }
}

impl Writer for XlsxWriter<'_> {
    fn write_to(&self, sink: &mut dyn Write) -> Result<u64, TabError> {
        self.check_header()?;
        // Entries carry data descriptors so the sink never has to seek
        let mut counter = CountingWriter::new(sink);
        self.write_package(ZipWriter::new_stream(&mut counter))
            .map_err(|error| error.at_destination("sink"))?;
        counter.flush().map_err(|error| TabError::from(error).at_destination("sink"))?;
        tracing::debug!(bytes = counter.count(), rows = self.table.len(), "xlsx written");
        Ok(counter.count())
    }

    fn save(&self, path: &Path) -> Result<(), TabError> {
        self.check_header()?;
        ensure_parent_dir(path)?;
        let target = path.display().to_string();
        let file = File::create(path).map_err(destination(path))?;
        let mut writer = self.write_package(ZipWriter::new(BufWriter::new(file)))
            .map_err(|error| error.at_destination(&target))?;
        writer.flush().map_err(destination(path))?;
        tracing::debug!(path = %target, rows = self.table.len(), "xlsx saved");
        Ok(())
    }
}

fn write_row<W: Write>(writer: &mut quick_xml::Writer<W>, row: usize, values: &[String]) -> Result<(), TabError> {
    let number = (row + 1).to_string();
    writer.write_event(Event::Start(BytesStart::new("row").with_attributes([("r", number.as_str())])))?;
    for (col, value) in values.iter().enumerate().filter(|(_, value)| !value.is_empty()) {
        let reference = index_to_reference(row, col);
        let text = xml_text(value);
        writer.write_event(Event::Start(
            BytesStart::new("c").with_attributes([("r", reference.as_str()), ("t", "inlineStr")]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("is")))?;
        writer.write_event(Event::Start(BytesStart::new("t").with_attributes([("xml:space", "preserve")])))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new("t")))?;
        writer.write_event(Event::End(BytesEnd::new("is")))?;
        writer.write_event(Event::End(BytesEnd::new("c")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Drops control characters XML 1.0 cannot carry
fn xml_text(value: &str) -> String {
    value
        .chars()
        .filter(|character| matches!(character, '\t' | '\n' | '\r') || !character.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spreadsheet::xlsx::XlsxSpreadsheet;
    use crate::spreadsheet::Spreadsheet;
    use crate::table::HeaderInfo;
    use std::io;
    use std::io::Cursor;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn written_package_reads_back() -> Result<(), TabError> {
        let table = Table::new(
            HeaderInfo::new(strings(&["name", "note"])),
            vec![strings(&["a < b", "  spaced  "]), strings(&["", "x\u{1}y"])],
        );
        let mut bytes = Vec::new();
        let size = XlsxWriter::new(&table).write_to(&mut bytes)?;
        assert_eq!(size, bytes.len() as u64);

        let mut spreadsheet = XlsxSpreadsheet::open(Cursor::new(bytes))?;
        assert_eq!(spreadsheet.sheet_names(), ["Sheet1"]);
        let rows = spreadsheet.read_sheet_or_first("Sheet1")?.into_rows();
        assert_eq!(rows, [vec!["name", "note"], vec!["a < b", "  spaced  "], vec!["", "xy"]]);
        Ok(())
    }

    /// A sink that only accepts forward writes
    struct Forward(Vec<u8>);

    impl Write for Forward {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stream_into_forward_only_sink() -> Result<(), TabError> {
        let rows = (0..500).map(|row| vec![row.to_string(), format!("value {row}")]).collect();
        let table = Table::new(HeaderInfo::new(strings(&["id", "value"])), rows);
        let mut sink = Forward(Vec::new());
        let size = XlsxWriter::new(&table).write_to(&mut sink)?;
        assert_eq!(size, sink.0.len() as u64);

        let mut spreadsheet = XlsxSpreadsheet::open(Cursor::new(sink.0))?;
        let rows = spreadsheet.read_sheet(0)?.into_rows();
        assert_eq!(rows.len(), 501);
        assert_eq!(rows[500], ["499", "value 499"]);
        Ok(())
    }

    #[test]
    fn empty_header_creates_nothing() -> Result<(), TabError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("out").join("table.xlsx");
        let table = Table::new(HeaderInfo::default(), vec![strings(&["1"])]);
        let error = XlsxWriter::new(&table).save(&path).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert!(!path.exists());
        assert!(!path.parent().is_some_and(Path::exists));

        let mut sink = Vec::new();
        assert!(XlsxWriter::new(&table).write_to(&mut sink).is_err());
        assert!(sink.is_empty());
        Ok(())
    }

    #[test]
    fn save_into_new_directory() -> Result<(), TabError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("nested").join("table.xlsx");
        let table = Table::new(HeaderInfo::new(strings(&["h"])), vec![strings(&["v"])]);
        XlsxWriter::new(&table).save(&path)?;
        let mut spreadsheet = XlsxSpreadsheet::open(File::open(&path)?)?;
        assert_eq!(spreadsheet.read_sheet(0)?.into_rows(), [vec!["h"], vec!["v"]]);
        Ok(())
    }
}
