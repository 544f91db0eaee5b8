//! OLE Compound File Binary (CFB) container used by legacy Excel (.xls) workbooks
//! and by password protected OOXML packages

use crate::error::TabError;
use crate::helpers::string::to_u16;
use crate::helpers::string::to_u64;
use crate::helpers::string::to_usize;
use crate::helpers::string::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;

/// Sector ids above this value are markers (free, end of chain, FAT, DIFAT)
const MAX_REG_SECT: usize = 0xFFFFFFFB;
/// Streams smaller than this live in the mini stream
const MINI_STREAM_CUTOFF: usize = 4096;
const SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;

/// Errors specific to Compound File Binary format parsing
#[derive(Error, Debug)]
pub(crate) enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid Sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("The number of file allocation table sectors is wrong: expect '{0}', actual '{1}'")]
    FileAllocationTableError(usize, usize),

    #[error("Empty Root directory")]
    RootDirectoryError,
}

/// An in-memory compound file: directory entries plus the regular and mini sector chains
pub(crate) struct Cfb {
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    /// Loads the whole container from a seekable reader
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, TabError> {
        let size = reader.seek(SeekFrom::End(0))?;
        if size < 512 {
            Err(CfbError::FileFormatError)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data: Vec<u8> = vec![0u8; size as usize];
        reader.read_exact(&mut data)?;

        let header = Header::new(&data[..512])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let file_allocation_table = load_file_allocation_table(&sectors, &header)?;
        let directories = load_directories(&file_allocation_table, &sectors, header.directory_start)?;
        let mini_file_allocation_table = if header.mini_file_allocation_table_count > 0 {
            let bytes = read_chain(&file_allocation_table, &sectors, header.mini_file_allocation_table_start)?;
            to_usize_iter(&bytes).collect()
        } else {
            Vec::new()
        };
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => {
                let mut data = read_chain(&file_allocation_table, &sectors, root.start)?;
                data.truncate(root.size);
                // The mini stream has no header sector, shift by one sector so `Sectors::get` lines up
                let mut shifted = vec![0u8; 64];
                shifted.extend(data);
                Sectors { data: shifted, size: 64 }
            }
            None => Sectors { data: Vec::new(), size: 64 },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    /// Checks if a stream exists in the container
    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads the contents of a stream
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, TabError> {
        let Some(directory) = self.directories.get(name) else {
            return Ok(None);
        };
        let mut bytes = if directory.size < MINI_STREAM_CUTOFF {
            read_chain(&self.mini_file_allocation_table, &self.mini_sectors, directory.start)?
        } else {
            read_chain(&self.file_allocation_table, &self.sectors, directory.start)?
        };
        bytes.truncate(directory.size);
        Ok(Some(bytes))
    }
}

/// Collects the FAT sectors listed by the header DIFAT and the DIFAT chain
fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, TabError> {
    let mut difat: Vec<usize> = to_usize_iter(&sectors.data[76..512]).collect();
    let mut index = header.difat_start;
    let mut visited = 0usize;
    while index < MAX_REG_SECT {
        difat.extend(to_usize_iter(sectors.get(index)?));
        // The last entry of a DIFAT sector points at the next DIFAT sector
        index = difat.pop().ok_or(CfbError::FileFormatError)?;
        visited += 1;
        if visited > header.difat_count {
            Err(CfbError::FileFormatError)?;
        }
    }

    let mut file_allocation_table: Vec<usize> = Vec::new();
    let mut count = 0usize;
    for index in difat.into_iter().filter(|index| *index < MAX_REG_SECT) {
        file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
        count += 1;
    }
    if count != header.file_allocation_table_count {
        Err(CfbError::FileAllocationTableError(header.file_allocation_table_count, count))?
    }
    Ok(file_allocation_table)
}

fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, start: usize) -> Result<HashMap<String, Directory>, TabError> {
    let bytes = read_chain(file_allocation_table, sectors, start)?;
    let directories: HashMap<String, Directory> = bytes.chunks_exact(128).map(Directory::new).collect();
    if directories.is_empty() {
        Err(CfbError::RootDirectoryError)?
    }
    Ok(directories)
}

/// Follows a sector chain and concatenates its sectors
fn read_chain(file_allocation_table: &[usize], sectors: &Sectors, start: usize) -> Result<Vec<u8>, TabError> {
    let mut content: Vec<u8> = Vec::new();
    let mut index = start;
    let mut hops = 0usize;
    while index < MAX_REG_SECT {
        content.extend_from_slice(sectors.get(index)?);
        index = *file_allocation_table.get(index).ok_or(CfbError::FileFormatError)?;
        hops += 1;
        if hops > file_allocation_table.len() {
            // cyclic chain
            Err(CfbError::FileFormatError)?;
        }
    }
    Ok(content)
}

/// Sector storage; sector `n` starts after the header-sized sector 0
struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let source = (index + 1) * self.size;
        let target = self.data.len().min(source + self.size);
        if source < target {
            Ok(&self.data[source..target])
        } else {
            Err(CfbError::FileFormatError)
        }
    }
}

struct Header {
    major_version: u16,
    sector_shift: u16,
    file_allocation_table_count: usize,
    directory_start: usize,
    mini_file_allocation_table_start: usize,
    mini_file_allocation_table_count: usize,
    difat_start: usize,
    difat_count: usize,
}

impl Header {
    fn new(data: &[u8]) -> Result<Self, TabError> {
        if to_u64(&data[0..8]) != SIGNATURE {
            Err(CfbError::OleSignatureError)?;
        }
        Ok(Header {
            major_version: to_u16(&data[26..28]),
            sector_shift: to_u16(&data[30..32]),
            file_allocation_table_count: to_usize(&data[44..48]),
            directory_start: to_usize(&data[48..52]),
            mini_file_allocation_table_start: to_usize(&data[60..64]),
            mini_file_allocation_table_count: to_usize(&data[64..68]),
            difat_start: to_usize(&data[68..72]),
            difat_count: to_usize(&data[72..76]),
        })
    }

    fn sector_size(&self) -> Result<usize, CfbError> {
        match (self.major_version, self.sector_shift) {
            (3, 0x0009) => Ok(512),
            // Version 4 pads the 512 byte header with zeroes up to a full sector
            (4, 0x000C) => Ok(4096),
            (version, shift) => Err(CfbError::SectorSizeError(version, shift)),
        }
    }
}

struct Directory {
    start: usize,
    size: usize,
}

impl Directory {
    fn new(bytes: &[u8]) -> (String, Directory) {
        let length = (to_u16(&bytes[64..66]) as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..length]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };
        let start = to_usize(&bytes[116..120]);
        let size = to_u64(&bytes[120..128]) as usize;
        (name, Directory { start, size })
    }
}
