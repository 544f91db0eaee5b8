use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

/// Anything that can be both read and repositioned.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Input handed to a [`Reader`](crate::Reader).
///
/// Some decoders need random access (legacy `.xls` workbooks); the variant records
/// whether the underlying reader can seek.
pub enum Source<'a> {
    /// Forward-only stream, e.g. a socket or a pipe
    Stream(Box<dyn Read + Send + 'a>),
    /// Random access reader, e.g. a file or an in-memory buffer
    Seekable(Box<dyn ReadSeek + Send + 'a>),
}

impl<'a> Source<'a> {
    pub fn stream<R: Read + Send + 'a>(reader: R) -> Self {
        Source::Stream(Box::new(reader))
    }

    pub fn seekable<RS: Read + Seek + Send + 'a>(reader: RS) -> Self {
        Source::Seekable(Box::new(reader))
    }

    /// Opens a local file as a seekable source
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Source<'static>> {
        let file = File::open(path)?;
        Ok(Source::Seekable(Box::new(BufReader::new(file))))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Source<'static> {
        Source::Seekable(Box::new(Cursor::new(bytes.into())))
    }

    pub fn is_seekable(&self) -> bool {
        matches!(self, Source::Seekable(_))
    }

    /// Reads everything left in the source
    pub fn read_all(&mut self) -> std::io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Read for Source<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Source::Stream(reader) => reader.read(buf),
            Source::Seekable(reader) => reader.read(buf),
        }
    }
}

impl From<File> for Source<'static> {
    fn from(file: File) -> Self {
        Source::Seekable(Box::new(BufReader::new(file)))
    }
}

impl From<Vec<u8>> for Source<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Source::from_bytes(bytes)
    }
}
