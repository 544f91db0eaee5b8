//! Read options and the supported formats.
use crate::error::ConfigError;
use crate::reader::Reader;
use crate::reconcile::RowPolicy;
use encoding_rs::Encoding;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;
use std::str::FromStr;

/// The closed set of supported table formats.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// Excel 97-2003 binary workbook (.xls)
    Xls,
    /// Excel 2007+ workbook (.xlsx, .xlsm)
    #[default]
    Xlsx,
    /// Delimited text (.csv)
    Csv,
    /// The Nth `<table>` of an HTML page
    HtmlTable,
}

impl Format {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::HtmlTable => "html-table",
        }
    }

    /// Infers the format from a file name extension, `None` for unknown extensions.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let extension = path.as_ref().extension().and_then(OsStr::to_str)?;
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            "html" | "htm" => Some(Self::HtmlTable),
            _ => None,
        }
    }

    /// Row policy applied when the options do not set one.
    pub const fn default_policy(&self) -> Option<RowPolicy> {
        match self {
            Self::Xlsx | Self::Csv => Some(RowPolicy::Pad),
            Self::Xls => Some(RowPolicy::Drop),
            // Extracted tables are already rectangular
            Self::HtmlTable => None,
        }
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    /// Parses a format name (case-insensitive):
    /// - Xlsx: "xlsx", "xlsm"
    /// - Xls: "xls"
    /// - Csv: "csv", "text"
    /// - HtmlTable: "html", "htm", "html-table", "html_table"
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            "csv" | "text" => Ok(Self::Csv),
            "html" | "htm" | "html-table" | "html_table" => Ok(Self::HtmlTable),
            _ => Err(ConfigError::UnknownFormat(name.to_owned())),
        }
    }
}

/// Options of one [`Tabulator`](crate::Tabulator); fixed once the tabulator is built.
pub struct Options {
    /// Format used when neither a reader override nor a recognized file name is given
    pub format: Format,
    /// Source file name, only used to infer the format from its extension
    pub file_name: Option<String>,
    /// Sheet to read from workbooks; the first sheet is used when it is absent
    pub sheet: String,
    /// 1-based row holding the column names
    pub header_row: usize,
    /// 1-based column where the header starts (reserved, not applied yet)
    pub header_column: usize,
    /// 0-based index of the table to extract from an HTML page
    pub table_index: usize,
    /// Overrides the format's default reconciliation policy
    pub row_policy: Option<RowPolicy>,
    /// Encoding tried when delimited text or HTML is not valid UTF-8
    pub legacy_encoding: &'static Encoding,
    pub(crate) reader: Option<Box<dyn Reader>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            format: Format::Xlsx,
            file_name: None,
            sheet: "Sheet1".to_owned(),
            header_row: 1,
            header_column: 1,
            table_index: 0,
            row_policy: None,
            legacy_encoding: crate::encoding::DEFAULT_LEGACY_ENCODING,
            reader: None,
        }
    }
}

impl Options {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    /// Values below 1 are treated as 1
    pub fn with_header_row(mut self, row: usize) -> Self {
        self.header_row = row.max(1);
        self
    }

    pub fn with_header_column(mut self, column: usize) -> Self {
        self.header_column = column.max(1);
        self
    }

    pub fn with_table_index(mut self, index: usize) -> Self {
        self.table_index = index;
        self
    }

    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = Some(policy);
        self
    }

    pub fn with_legacy_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.legacy_encoding = encoding;
        self
    }

    /// Replaces format selection with a caller-supplied reader
    pub fn with_reader(mut self, reader: Box<dyn Reader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Policy a reader for `format` applies: the configured one, else the format default.
    pub fn policy_for(&self, format: Format) -> Option<RowPolicy> {
        self.row_policy.or(format.default_policy())
    }
}

impl Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("format", &self.format)
            .field("file_name", &self.file_name)
            .field("sheet", &self.sheet)
            .field("header_row", &self.header_row)
            .field("header_column", &self.header_column)
            .field("table_index", &self.table_index)
            .field("row_policy", &self.row_policy)
            .field("legacy_encoding", &self.legacy_encoding.name())
            .field("reader", &self.reader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_format_names() {
        assert_eq!("XLSX".parse::<Format>().ok(), Some(Format::Xlsx));
        assert_eq!("html-table".parse::<Format>().ok(), Some(Format::HtmlTable));
        assert_eq!("Csv".parse::<Format>().ok(), Some(Format::Csv));
        assert!(matches!("ods".parse::<Format>(), Err(ConfigError::UnknownFormat(name)) if name == "ods"));
    }

    #[test]
    fn infer_format_from_extension() {
        assert_eq!(Format::from_path("data/test.xlsx"), Some(Format::Xlsx));
        assert_eq!(Format::from_path("TEST.XLS"), Some(Format::Xls));
        assert_eq!(Format::from_path("a.csv"), Some(Format::Csv));
        assert_eq!(Format::from_path("page.html"), Some(Format::HtmlTable));
        assert_eq!(Format::from_path("notes.txt"), None);
        assert_eq!(Format::from_path("no_extension"), None);
    }

    #[test]
    fn default_options() {
        let options = Options::default();
        assert_eq!(options.format, Format::Xlsx);
        assert_eq!(options.sheet, "Sheet1");
        assert_eq!(options.header_row, 1);
        assert_eq!(options.table_index, 0);
        assert_eq!(options.policy_for(Format::Xls), Some(RowPolicy::Drop));
        assert_eq!(options.policy_for(Format::HtmlTable), None);
    }

    #[test]
    fn configured_policy_applies_to_every_format() {
        let options = Options::default().with_row_policy(RowPolicy::Fit).with_header_row(0);
        assert_eq!(options.header_row, 1);
        for format in [Format::Xls, Format::Xlsx, Format::Csv, Format::HtmlTable] {
            assert_eq!(options.policy_for(format), Some(RowPolicy::Fit));
        }
    }
}
