use crate::error::SheetMergerError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UnifiedReaderError {
    #[error("Remote source is not supported: '{0}'")]
    RemoteSourceError(String),

    #[error("Invalid file url: '{0}'")]
    FileUrlError(String),
}

/// Where the bytes of a table come from.
#[derive(Clone, Debug)]
pub enum Source {
    /// A file on the local filesystem
    Path(PathBuf),
    /// An uploaded file held in memory, with its original file name
    Upload { name: String, bytes: Vec<u8> },
}

impl Source {
    pub fn path<P: Into<PathBuf>>(path: P) -> Source {
        Source::Path(path.into())
    }

    pub fn upload<S: Into<String>>(name: S, bytes: Vec<u8>) -> Source {
        Source::Upload {
            name: name.into(),
            bytes,
        }
    }

    /// Parses a location given either as a plain path or as a `file://` url.
    pub fn parse(location: &str) -> Result<Source, SheetMergerError> {
        match Url::parse(location) {
            // Single letter schemes are windows drive letters
            Ok(url) if url.scheme().len() == 1 => Ok(Source::path(location)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Source::Path)
                .map_err(|_| UnifiedReaderError::FileUrlError(location.to_owned()).into()),
            Ok(_) => Err(UnifiedReaderError::RemoteSourceError(location.to_owned()).into()),
            Err(_) => Ok(Source::path(location)),
        }
    }

    /// Name used for messages and format detection.
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.to_string_lossy().to_string(),
            Source::Upload { name, .. } => name.to_owned(),
        }
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        Path::new(&name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase())
    }

    /// Reads the full content of the source.
    pub fn read_all(&self) -> Result<Vec<u8>, SheetMergerError> {
        let mut bytes = Vec::new();
        UnifiedReader::new(self)?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

/// A unified reader that can handle both local files and uploaded bytes
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Uploaded file reader (in-memory buffer)
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a seekable reader over the given source
    pub(crate) fn new(source: &Source) -> Result<UnifiedReader, SheetMergerError> {
        match source {
            Source::Path(path) => {
                let file = File::open(path)?;
                Ok(UnifiedReader::Local(BufReader::new(file)))
            }
            Source::Upload { bytes, .. } => Ok(UnifiedReader::Memory(Cursor::new(bytes.to_owned()))),
        }
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}
