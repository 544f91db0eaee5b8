//! Table extraction from HTML pages
//!
//! A [`Page`] holds every `<table>` of a document in document order. Each table
//! keeps only its own rows (rows of nested tables belong to the nested table),
//! with `colspan` and `rowspan` cells repeated into every slot they cover.
use crate::encoding::to_utf8;
use crate::source::Source;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use scraper::ElementRef;
use scraper::Html;
use scraper::Selector;
use thiserror::Error;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("Hardcode selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("Hardcode selector"));

/// Upper bound for `colspan`/`rowspan` values taken from the document
const MAX_SPAN: usize = 1000;

/// Failure to load a page. Cloneable so a stored failure can be handed out again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("Read html page failed: {0}")]
    ReadError(String),
}

/// One extracted table: a header and rows of the same width
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// All tables of a document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub tables: Vec<HtmlTable>,
}

impl Page {
    /// Reads the whole source and extracts its tables.
    pub fn read(source: &mut Source<'_>, legacy: &'static Encoding) -> Result<Page, HtmlError> {
        let bytes = source.read_all().map_err(|error| HtmlError::ReadError(error.to_string()))?;
        let page = Page::parse(&to_utf8(&bytes, legacy));
        tracing::debug!(tables = page.len(), "html page loaded");
        Ok(page)
    }

    pub fn parse(html: &str) -> Page {
        let document = Html::parse_document(html);
        let tables = document.select(&TABLE).map(extract_table).collect();
        Page { tables }
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, index: usize) -> Option<&HtmlTable> {
        self.tables.get(index)
    }
}

/// The header is the first row inside `<thead>` or made only of `<th>` cells,
/// otherwise the first row. Rows before the header are ignored.
fn extract_table(table: ElementRef<'_>) -> HtmlTable {
    let owns = |row: &ElementRef<'_>| {
        row.ancestors()
            .find(|node| node.value().as_element().is_some_and(|element| element.name() == "table"))
            .map(|node| node.id())
            == Some(table.id())
    };

    let mut spans: Vec<(usize, String)> = Vec::new();
    let mut header_index = None;
    let mut rows = Vec::new();
    for (index, row) in table.select(&ROW).filter(|row| owns(row)).enumerate() {
        if header_index.is_none() && is_header_row(row) {
            header_index = Some(index);
        }
        rows.push(expand_row(row, &mut spans));
    }

    let mut rows = rows.into_iter().skip(header_index.unwrap_or(0));
    let header = rows.next().unwrap_or_default();
    let width = header.len();
    let rows = rows
        .filter(|row| !row.is_empty())
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();
    HtmlTable { header, rows }
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    let in_head = row.parent()
        .and_then(|parent| parent.value().as_element().map(|element| element.name() == "thead"))
        .unwrap_or(false);
    let mut cells = cells(row).peekable();
    in_head || (cells.peek().is_some() && cells.all(|cell| cell.value().name() == "th"))
}

fn cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

/// Lays out the cells of one row; `spans` carries the cells spanning down from earlier rows.
fn expand_row(row: ElementRef<'_>, spans: &mut Vec<(usize, String)>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    let mut cells = cells(row);
    loop {
        let col = values.len();
        if spans.get(col).is_some_and(|(remaining, _)| *remaining > 0) {
            let (remaining, text) = &mut spans[col];
            *remaining -= 1;
            values.push(text.clone());
            continue;
        }
        let Some(cell) = cells.next() else {
            if spans.iter().skip(col).any(|(remaining, _)| *remaining > 0) {
                values.push(String::new());
                continue;
            }
            break;
        };
        let text = cell.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ");
        let colspan = span(cell, "colspan");
        let rowspan = span(cell, "rowspan");
        for _ in 0..colspan {
            let col = values.len();
            if rowspan > 1 {
                if spans.len() <= col {
                    spans.resize(col + 1, (0, String::new()));
                }
                spans[col] = (rowspan - 1, text.clone());
            }
            values.push(text.clone());
        }
    }
    values
}

fn span(cell: ElementRef<'_>, name: &str) -> usize {
    cell.value()
        .attr(name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}
