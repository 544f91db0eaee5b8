use crate::error::TabError;
use crate::html::HtmlError;
use crate::html::Page;
use crate::options::Options;
use crate::reader::Reader;
use crate::reconcile::fit_rows;
use crate::source::Source;
use crate::table::HeaderInfo;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Reads the table at [`Options::table_index`] from an HTML page.
///
/// The page is loaded by the first `read` only; later reads, including reads through
/// clones of this reader, reuse that page (or its load failure) and ignore their source.
#[derive(Clone, Debug, Default)]
pub struct HtmlTableReader {
    page: Arc<OnceCell<Result<Page, HtmlError>>>,
    header: HeaderInfo,
}

impl Reader for HtmlTableReader {
    fn read(&mut self, options: &Options, source: &mut Source<'_>) -> Result<Vec<Vec<String>>, TabError> {
        let page = self.page
            .get_or_init(|| Page::read(source, options.legacy_encoding))
            .as_ref()
            .map_err(Clone::clone)?;
        let Some(table) = page.table(options.table_index) else {
            tracing::debug!(index = options.table_index, tables = page.len(), "html table index out of range");
            self.header = HeaderInfo::default();
            return Ok(Vec::new());
        };
        self.header = HeaderInfo::new(table.header.clone());
        let rows = match options.row_policy {
            Some(policy) => fit_rows(table.rows.clone(), table.header.len(), policy),
            None => table.rows.clone(),
        };
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
    use std::io;
    use std::io::Read;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    const PAGE: &str = "<table><tr><th>city</th><th>code</th></tr><tr><td>Paris</td><td>75</td></tr></table>\
                        <table><tr><th>id</th></tr><tr><td>1</td></tr><tr><td>2</td></tr></table>";

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    /// Counts the bytes handed out, to see whether a source was consumed
    struct Counted<'a>(&'a [u8], &'a AtomicUsize);

    impl Read for Counted<'_> {
        fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
            let size = self.0.read(buffer)?;
            self.1.fetch_add(size, Ordering::SeqCst);
            Ok(size)
        }
    }

    #[test]
    fn select_table_by_index() -> Result<(), TabError> {
        let mut reader = HtmlTableReader::default();
        let options = Options::default().with_table_index(1);
        let rows = reader.read(&options, &mut Source::from_bytes(PAGE))?;
        assert_eq!(reader.header().columns(), ["id"]);
        assert_eq!(rows, [vec!["1"], vec!["2"]]);
        Ok(())
    }

    #[test]
    fn index_out_of_range_is_empty() -> Result<(), TabError> {
        let mut reader = HtmlTableReader::default();
        let options = Options::default().with_table_index(5);
        let rows = reader.read(&options, &mut Source::from_bytes(PAGE))?;
        assert!(rows.is_empty());
        assert!(reader.header().is_empty());
        Ok(())
    }

    #[test]
    fn page_is_loaded_once() -> Result<(), TabError> {
        let mut reader = HtmlTableReader::default();
        let options = Options::default();
        reader.read(&options, &mut Source::from_bytes(PAGE))?;

        let consumed = AtomicUsize::new(0);
        let other = b"<table><tr><th>other</th></tr></table>";
        let rows = reader.read(&options, &mut Source::stream(Counted(other, &consumed)))?;
        assert_eq!(consumed.load(Ordering::SeqCst), 0);
        assert_eq!(reader.header().columns(), ["city", "code"]);
        assert_eq!(rows, [vec!["Paris", "75"]]);
        Ok(())
    }

    #[test]
    fn load_failure_is_replayed() {
        let mut reader = HtmlTableReader::default();
        let options = Options::default();
        let first = reader.read(&options, &mut Source::stream(Broken)).unwrap_err();
        assert_eq!(first.kind(), ErrorKind::SourceAccess);
        let second = reader.read(&options, &mut Source::from_bytes(PAGE)).unwrap_err();
        assert!(matches!(second, TabError::HtmlError(HtmlError::ReadError(message)) if message.contains("denied")));
    }

    #[test]
    fn clones_share_one_page() {
        let reader = HtmlTableReader::default();
        let consumed = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let mut reader = reader.clone();
                let consumed = &consumed;
                scope.spawn(move || {
                    let mut source = Source::stream(Counted(PAGE.as_bytes(), consumed));
                    let rows = reader.read(&Options::default(), &mut source).unwrap();
                    assert_eq!(rows, [vec!["Paris", "75"]]);
                });
            }
        });
        assert_eq!(consumed.load(Ordering::SeqCst), PAGE.len());
    }

    #[test]
    fn explicit_policy_reconciles_rows() -> Result<(), TabError> {
        let mut reader = HtmlTableReader::default();
        let options = Options::default().with_row_policy(crate::reconcile::RowPolicy::Drop);
        let rows = reader.read(&options, &mut Source::from_bytes("<table><tr><th>a</th><th>b</th></tr><tr><td>1</td><td>2</td></tr></table>"))?;
        assert_eq!(rows, [vec!["1", "2"]]);
        Ok(())
    }
}
