//! Parts shared by the .xlsx and .xls decoders
use crate::error::TabError;
use crate::helpers::cfb::Cfb;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use zip::ZipArchive;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Opens a zipped workbook and loads its sheet list and number formats.
///
/// Returns the archive, the cell type of every style index and the
/// (sheet name, part path) pairs in workbook order.
pub(super) fn open<RS, W, F>(mut reader: RS, load_workbook: W, load_number_formats: F) -> Result<(
    ZipArchive<RS>,
    Vec<CellType>,
    Vec<(String, String)>
), TabError>
where
    RS: Read + Seek,
    W: Fn(&mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), TabError>,
    F: Fn(&mut ZipArchive<RS>, bool) -> Result<Vec<CellType>, TabError>,
{
    // Encrypted workbooks are wrapped in a compound file instead of a zip
    if is_password_protected(&mut reader) {
        Err(SpreadsheetError::SpreadsheetPasswordProtectedError)?;
    }
    reader.seek(SeekFrom::Start(0))?;

    let mut zip = ZipArchive::new(reader)?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError)?
    }

    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Loads the worksheet relationships of a workbook: relationship id to part path.
pub(super) fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<HashMap<String, String>, TabError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves the cell type of each style, from custom formats first and built-in ids second.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Cell type of a style index; unknown styles are plain numbers.
pub(super) fn number_format(number_formats: &[CellType], index: usize) -> CellType {
    number_formats.get(index).copied().unwrap_or(CellType::Number)
}

/// Turns a relationship target into an archive path under `xl/`.
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

fn is_password_protected<RS: Read + Seek>(reader: &mut RS) -> bool {
    let mut signature = [0u8; 8];
    let is_compound_file = reader.seek(SeekFrom::Start(0)).is_ok()
        && reader.read_exact(&mut signature).is_ok()
        && signature == CFB_SIGNATURE;
    if !is_compound_file {
        return false;
    }
    match Cfb::new(reader) {
        Ok(cfb) => cfb.exists("EncryptedPackage"),
        Err(_) => false,
    }
}
