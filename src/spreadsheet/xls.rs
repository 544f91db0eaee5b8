use crate::error::ResultOptionChain;
use crate::error::TabError;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use either::Either;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;
const EOF: u16 = 10;
const DATE1904: u16 = 34;
const FILE_PASS: u16 = 47;
const CODE_PAGE: u16 = 66;
const BOUND_SHEET8: u16 = 133;
const MUL_RK: u16 = 189;
const XF: u16 = 224;
const SST: u16 = 252;
const LABEL_SST: u16 = 253;
const NUMBER: u16 = 515;
const LABEL: u16 = 516;
const BOOL_ERR: u16 = 517;
const STRING: u16 = 519; // Cached string result following a FORMULA record
const RK: u16 = 638;
const FORMAT: u16 = 1054;
const BOF: u16 = 2057;

/// Errors specific to the BIFF8 workbook stream
#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid code page '{0}'")]
    CodePageError(u16),

    #[error("Invalid formula value '{0}'")]
    FormulaValueError(u64),
}

/// An Excel 97-2003 workbook, decoded from its in-memory workbook stream
pub(crate) struct XlsSpreadsheet {
    reader: Biff8Reader,
    shared_strings: Vec<String>,
    /// Cell type of every XF index
    number_formats: Vec<CellType>,
    /// Worksheets with the stream offset of their BOF record
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    /// Loads the compound file and the "Workbook" (or legacy "Book") stream inside it
    pub(crate) fn open<RS: Read + Seek>(reader: &mut RS) -> Result<XlsSpreadsheet, TabError> {
        let cfb = Cfb::new(reader)?;
        let stream = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .ok_or_else(|| SpreadsheetError::FileError("Workbook".to_owned()))?;
        Self::from_workbook_stream(stream)
    }

    /// Reads the workbook globals: sheets, shared strings, formats and the date system
    fn from_workbook_stream(stream: Vec<u8>) -> Result<XlsSpreadsheet, TabError> {
        let mut reader = Biff8Reader::new(stream);
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut custom_formats: HashMap<String, CellType> = HashMap::new();
        let mut format_indexes: Vec<String> = Vec::new();
        let mut sheets: Vec<(String, usize)> = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS if reader.read_u16()? != 0 => Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?,
            DATE1904 if reader.read_u16()? == 1 => is_1904 = true,
            CODE_PAGE => {
                let code_page = reader.read_u16()?;
                reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePageError(code_page))?;
            }
            FORMAT => {
                let id = reader.read_u16()?;
                let format = reader.read_xl_unicode_string()?;
                custom_formats.insert(
                    id.to_string(),
                    CellType::parse_custom_number_format(format.as_ref(), is_1904),
                );
            }
            XF => {
                reader.skip(2)?;
                let id = reader.read_u16()?;
                format_indexes.push(id.to_string());
            }
            SST => shared_strings = load_shared_strings(&mut reader)?,
            BOUND_SHEET8 => {
                let pointer = reader.read_usize()?;
                reader.skip(2)?;
                let sheet_name = reader.read_short_xl_unicode_string()?;
                sheets.push((sheet_name, pointer));
            }
        });
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError)?
        }
        tracing::debug!(sheets = sheets.len(), shared_strings = shared_strings.len(), "xls workbook opened");

        let number_formats = excel::load_number_formats(format_indexes, custom_formats, is_1904);
        Ok(XlsSpreadsheet {
            reader,
            shared_strings,
            number_formats,
            sheets,
        })
    }

    fn shared_string(&self, index: usize, row: usize, col: usize) -> Result<String, TabError> {
        Ok(self.shared_strings.get(index)
            .cloned()
            .ok_or_else(|| SpreadsheetError::IndexError {
                kind: "shared string",
                index,
                reference: index_to_reference(row, col),
            })?)
    }
}

impl Spreadsheet for XlsSpreadsheet {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Walks the records of one sheet substream, from its BOF to the next BOF or EOF.
    fn read_sheet(&mut self, index: usize) -> Result<Sheet, TabError> {
        let (sheet_name, pointer) = self.sheets.get(index)
            .cloned()
            .ok_or(SpreadsheetError::SpreadsheetEmptyError)?;
        let mut sheet = Sheet::new(&sheet_name);
        self.reader.goto(pointer);
        self.reader.next()?;
        while let Some(tag) = self.reader.next()? {
            match tag {
                BOF | EOF => break,
                MUL_RK => {
                    let row = self.reader.read_u16()? as usize;
                    let col_lower_bound = self.reader.read_u16()? as usize;
                    let col_upper_bound = self.reader.get_u16_back(2)? as usize;
                    for col in col_lower_bound..=col_upper_bound {
                        let index = self.reader.read_u16()? as usize;
                        let kind = excel::number_format(&self.number_formats, index);
                        let value = self.reader.read_rk_number()?;
                        sheet.push(Cell { row, col, kind, value });
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = self.reader.read_u16()? as usize;
                    let col = self.reader.read_u16()? as usize;
                    let (either, value) = match tag {
                        BOOL_ERR => read_bool_or_error_cell(&mut self.reader)?,
                        NUMBER => read_number_cell(&mut self.reader)?,
                        RK => read_rk_cell(&mut self.reader)?,
                        LABEL_SST => read_label_sst_cell(&mut self.reader)?,
                        LABEL => read_label_cell(&mut self.reader)?,
                        _ => read_formula_cell(&mut self.reader)?,
                    };
                    let (kind, value) = match either {
                        Either::Left(CellType::SharedString) => {
                            let index = value.parse::<usize>()?;
                            (CellType::InlineString, self.shared_string(index, row, col)?)
                        }
                        Either::Left(kind) => (kind, value),
                        Either::Right(index) => (excel::number_format(&self.number_formats, index), value),
                    };
                    sheet.push(Cell { row, col, kind, value });
                }
                _ => (),
            }
        }
        tracing::debug!(sheet = %sheet.name, cells = sheet.cells.len(), "xls sheet decoded");
        Ok(sheet)
    }
}

fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, TabError> {
    let mut shared_strings: Vec<String> = Vec::new();
    // cstTotal is followed by cstUnique, the number of entries
    reader.skip(4)?;
    let count = reader.read_usize()?;
    for _ in 0..count {
        let string = reader.read_xl_unicode_rich_extended_string()?;
        shared_strings.push(string);
    }
    Ok(shared_strings)
}

/// BOOL_ERR holds a boolean or an error code, told apart by a flag byte
fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let flag = reader.read_u8()?;
    Ok(if flag == 0 {
        (Either::Left(CellType::Boolean), value.to_string())
    } else {
        (Either::Left(CellType::Error), to_error_value(value).to_owned())
    })
}

fn read_number_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(index), value.to_string()))
}

fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(index), value))
}

fn read_label_sst_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    reader.skip(2)?;
    let value = reader.read_usize()?;
    Ok((Either::Left(CellType::SharedString), value.to_string()))
}

fn read_label_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    reader.skip(2)?;
    let value = reader.read_xl_unicode_string()?;
    Ok((Either::Left(CellType::InlineString), value))
}

/// Decodes the cached result of a FORMULA record.
///
/// Numbers are stored as a plain f64. Any other result marks the top two bytes
/// with 0xFFFF and keeps its kind in the low byte; string results follow in a STRING record.
fn read_formula_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), TabError> {
    let index = reader.read_u16()? as usize;
    let formula = reader.read_u64()?;
    let is_number = (formula & 0xFFFF000000000000) != 0xFFFF000000000000;
    let flag = formula & 0xFF;
    if is_number {
        Ok((Either::Right(index), f64::from_bits(formula).to_string()))
    } else if flag == 0 {
        match reader.next()? {
            Some(STRING) => {
                let value = reader.read_xl_unicode_string()?;
                Ok((Either::Left(CellType::InlineString), value))
            }
            _ => Err(XlsError::FormulaValueError(formula))?,
        }
    } else if flag == 1 {
        let value = if (formula & 0xFF0000) > 0 { "1" } else { "0" };
        Ok((Either::Left(CellType::Boolean), value.to_owned()))
    } else if flag == 2 {
        let code = ((formula >> 16) & 0xFF) as u8;
        Ok((Either::Left(CellType::Error), to_error_value(code).to_owned()))
    } else if flag == 3 {
        Ok((Either::Left(CellType::InlineString), String::new()))
    } else {
        Err(XlsError::FormulaValueError(formula))?
    }
}

/// Hand-built BIFF8 records and compound files
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub(crate) fn record(kind: u16, data: &[u8]) -> Vec<u8> {
        let mut bytes = kind.to_le_bytes().to_vec();
        bytes.extend((data.len() as u16).to_le_bytes());
        bytes.extend(data);
        bytes
    }

    pub(crate) fn cell_prefix(row: u16, col: u16) -> Vec<u8> {
        let mut bytes = row.to_le_bytes().to_vec();
        bytes.extend(col.to_le_bytes());
        bytes.extend(0u16.to_le_bytes()); // ixfe
        bytes
    }

    pub(crate) fn label(row: u16, col: u16, text: &str) -> Vec<u8> {
        let mut data = cell_prefix(row, col);
        data.extend((text.len() as u16).to_le_bytes());
        data.push(0);
        data.extend(text.as_bytes());
        record(LABEL, &data)
    }

    /// One LABEL record per value, row by row from row 0
    pub(crate) fn label_rows(rows: &[&[&str]]) -> Vec<u8> {
        let mut records = Vec::new();
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                records.extend(label(row as u16, col as u16, value));
            }
        }
        records
    }

    pub(crate) fn shared_string_table(strings: &[&str]) -> Vec<u8> {
        let mut data = (strings.len() as u32).to_le_bytes().to_vec();
        data.extend((strings.len() as u32).to_le_bytes());
        for string in strings {
            data.extend((string.len() as u16).to_le_bytes());
            data.push(0);
            data.extend(string.as_bytes());
        }
        record(SST, &data)
    }

    /// A workbook stream with globals followed by one sheet substream named "Data"
    pub(crate) fn workbook_stream(shared_strings: &[&str], cells: &[u8]) -> Vec<u8> {
        let mut globals = record(BOF, &[0; 16]);
        globals.extend(record(CODE_PAGE, &1200u16.to_le_bytes()));
        globals.extend(shared_string_table(shared_strings));
        let name = "Data";
        let bound_sheet_size = 4 + 4 + 2 + 2 + name.len();
        let pointer = globals.len() + bound_sheet_size + 4;
        let mut data = (pointer as u32).to_le_bytes().to_vec();
        data.extend([0, 0, name.len() as u8, 0]);
        data.extend(name.as_bytes());
        globals.extend(record(BOUND_SHEET8, &data));
        globals.extend(record(EOF, &[]));
        assert_eq!(globals.len(), pointer);

        globals.extend(record(BOF, &[0; 16]));
        globals.extend(cells);
        globals.extend(record(EOF, &[]));
        globals
    }

    /// Wraps a workbook stream into a version 3 compound file.
    ///
    /// Sector 0 holds the allocation table, sector 1 the directory and the
    /// stream follows from sector 2. The stream is padded to the mini stream
    /// cutoff so it lives in regular sectors.
    pub(crate) fn compound_file(workbook: &[u8]) -> Vec<u8> {
        const SECTOR: usize = 512;
        const FREE: u32 = 0xFFFF_FFFF;
        const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
        const FAT_SECTOR: u32 = 0xFFFF_FFFD;

        let mut stream = workbook.to_vec();
        stream.resize(stream.len().max(4096), 0);
        let size = stream.len();
        let sectors = size.div_ceil(SECTOR);
        stream.resize(sectors * SECTOR, 0);

        let mut header = vec![0u8; SECTOR];
        header[..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
        header[24..26].copy_from_slice(&0x3Eu16.to_le_bytes());
        header[26..28].copy_from_slice(&3u16.to_le_bytes());
        header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
        header[30..32].copy_from_slice(&9u16.to_le_bytes());
        header[32..34].copy_from_slice(&6u16.to_le_bytes());
        header[44..48].copy_from_slice(&1u32.to_le_bytes());
        header[48..52].copy_from_slice(&1u32.to_le_bytes());
        header[56..60].copy_from_slice(&4096u32.to_le_bytes());
        header[60..64].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
        header[68..72].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
        for entry in header[76..].chunks_exact_mut(4) {
            entry.copy_from_slice(&FREE.to_le_bytes());
        }
        header[76..80].copy_from_slice(&0u32.to_le_bytes());

        let mut allocation_table = vec![FREE; SECTOR / 4];
        allocation_table[0] = FAT_SECTOR;
        allocation_table[1] = END_OF_CHAIN;
        for sector in 0..sectors {
            allocation_table[2 + sector] = if sector + 1 == sectors { END_OF_CHAIN } else { (3 + sector) as u32 };
        }

        let mut directory = directory_entry("Root Entry", END_OF_CHAIN, 0);
        directory.extend(directory_entry("Workbook", 2, size as u64));
        directory.resize(SECTOR, 0);

        let mut file = header;
        file.extend(allocation_table.iter().flat_map(|entry| entry.to_le_bytes()));
        file.extend(directory);
        file.extend(stream);
        file
    }

    fn directory_entry(name: &str, start: u32, size: u64) -> Vec<u8> {
        let mut entry = vec![0u8; 128];
        let name: Vec<u8> = name.encode_utf16().chain([0]).flat_map(u16::to_le_bytes).collect();
        entry[..name.len()].copy_from_slice(&name);
        entry[64..66].copy_from_slice(&(name.len() as u16).to_le_bytes());
        entry[116..120].copy_from_slice(&start.to_le_bytes());
        entry[120..128].copy_from_slice(&size.to_le_bytes());
        entry
    }
}
