use crate::encoding::to_utf8;
use crate::error::TabError;
use crate::options::Format;
use crate::options::Options;
use crate::reader::split_header;
use crate::reader::Reader;
use crate::source::Source;
use crate::table::HeaderInfo;

/// Reads delimited text in UTF-8 (with or without BOM) or the configured legacy encoding.
///
/// Records may have any number of fields; quoting is lenient.
#[derive(Clone, Debug, Default)]
pub struct CsvReader {
    header: HeaderInfo,
}

impl Reader for CsvReader {
    fn read(&mut self, options: &Options, source: &mut Source<'_>) -> Result<Vec<Vec<String>>, TabError> {
        let bytes = source.read_all()?;
        let text = to_utf8(&bytes, options.legacy_encoding);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect::<Vec<_>>());
        }
        let (header, rows) = split_header(options, Format::Csv, rows);
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
    use crate::reconcile::RowPolicy;

    fn read(options: &Options, bytes: &[u8]) -> Result<(HeaderInfo, Vec<Vec<String>>), TabError> {
        let mut reader = CsvReader::default();
        let rows = reader.read(options, &mut Source::from_bytes(bytes))?;
        Ok((reader.header(), rows))
    }

    #[test]
    fn pad_keeps_long_rows() -> Result<(), TabError> {
        let (header, rows) = read(&Options::default(), b"a,b,c\n1,2\n3,4,5,6\n")?;
        assert_eq!(header.columns(), ["a", "b", "c"]);
        assert_eq!(rows, [vec!["1", "2", ""], vec!["3", "4", "5", "6"]]);
        Ok(())
    }

    #[test]
    fn fit_truncates_long_rows() -> Result<(), TabError> {
        let options = Options::default().with_row_policy(RowPolicy::Fit);
        let (_, rows) = read(&options, b"a,b,c\n1,2\n3,4,5,6\n")?;
        assert_eq!(rows, [vec!["1", "2", ""], vec!["3", "4", "5"]]);
        Ok(())
    }

    #[test]
    fn bom_quotes_and_header_row() -> Result<(), TabError> {
        let options = Options::default().with_header_row(2);
        let (header, rows) = read(&options, "\u{feff}report\nname,note\n\"Smith, J\",\"say \"\"hi\"\"\"\n".as_bytes())?;
        assert_eq!(header.columns(), ["name", "note"]);
        assert_eq!(rows, [vec!["Smith, J", "say \"hi\""]]);
        Ok(())
    }

    #[test]
    fn legacy_encoded_text() -> Result<(), TabError> {
        let (bytes, _, _) = encoding_rs::GBK.encode("姓名,城市\n张三,北京\n");
        let (header, rows) = read(&Options::default(), &bytes)?;
        assert_eq!(header.columns(), ["姓名", "城市"]);
        assert_eq!(rows, [vec!["张三", "北京"]]);
        Ok(())
    }

    #[test]
    fn empty_input() -> Result<(), TabError> {
        let (header, rows) = read(&Options::default(), b"")?;
        assert!(header.is_empty());
        assert!(rows.is_empty());
        Ok(())
    }
}
