//! Fetched content handed to the parsers

use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, ErrorKind, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// UTF-8 byte order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Buffered, seekable view on fetched content
pub trait SourceRead: BufRead + Seek {}

impl<T: BufRead + Seek> SourceRead for T {}

#[derive(Debug)]
enum Content {
    Memory {
        bytes: Vec<u8>,
        spill: OnceCell<NamedTempFile>,
    },
    File {
        path: PathBuf,
        sanitized: OnceCell<()>,
    },
}

/// Result of a fetch: content in memory or a file on disk
///
/// Every accessor strips a leading UTF-8 BOM. A file that starts with one is
/// rewritten in place the first time it is accessed.
#[derive(Debug)]
pub struct FetcherResult {
    content: Content,
}

impl FetcherResult {
    /// Wrap content held in memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        if bytes.starts_with(BOM) {
            bytes.drain(..BOM.len());
        }
        Self {
            content: Content::Memory {
                bytes,
                spill: OnceCell::new(),
            },
        }
    }

    /// Wrap a file on disk
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            content: Content::File {
                path: path.into(),
                sanitized: OnceCell::new(),
            },
        }
    }

    /// The full content
    pub fn raw(&self) -> Result<Cow<'_, [u8]>> {
        match &self.content {
            Content::Memory { bytes, .. } => Ok(Cow::Borrowed(bytes)),
            Content::File { path, .. } => {
                check_file(path)?;
                let mut bytes = std::fs::read(path).map_err(|e| read_error(path, &e))?;
                if bytes.starts_with(BOM) {
                    bytes.drain(..BOM.len());
                }
                Ok(Cow::Owned(bytes))
            }
        }
    }

    /// Path to the content on disk
    ///
    /// In-memory content is written to a temporary file on first call.
    pub fn file_path(&self) -> Result<&Path> {
        match &self.content {
            Content::Memory { bytes, spill } => {
                let file = spill.get_or_try_init(|| -> Result<NamedTempFile> {
                    let mut file = NamedTempFile::new()?;
                    file.write_all(bytes)?;
                    file.flush()?;
                    Ok(file)
                })?;
                Ok(file.path())
            }
            Content::File { path, sanitized } => {
                check_file(path)?;
                sanitized.get_or_try_init(|| sanitize_file(path))?;
                Ok(path)
            }
        }
    }

    /// Size of the content in bytes
    pub fn size(&self) -> Result<u64> {
        match &self.content {
            Content::Memory { bytes, .. } => Ok(bytes.len() as u64),
            Content::File { .. } => {
                let path = self.file_path()?;
                let metadata = std::fs::metadata(path).map_err(|e| read_error(path, &e))?;
                Ok(metadata.len())
            }
        }
    }

    /// Open a seekable reader on the content
    pub fn reader(&self) -> Result<Box<dyn SourceRead + '_>> {
        match &self.content {
            Content::Memory { bytes, .. } => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            Content::File { .. } => {
                let path = self.file_path()?;
                let file = File::open(path).map_err(|e| read_error(path, &e))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Whether the content lives in memory
    pub fn is_in_memory(&self) -> bool {
        matches!(self.content, Content::Memory { .. })
    }

    /// Release temporary resources
    ///
    /// Files passed in with `from_path` are left alone.
    pub fn clean_up(self) {
        if let Content::Memory { spill, .. } = self.content {
            if let Some(file) = spill.into_inner() {
                debug!(path = %file.path().display(), "Removing temporary source file");
            }
        }
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

fn read_error(path: &Path, error: &std::io::Error) -> Error {
    match error.kind() {
        ErrorKind::NotFound => Error::FileNotFound {
            path: path_string(path),
        },
        _ => Error::FileNotReadable {
            path: path_string(path),
        },
    }
}

/// Fail when the file is missing or cannot be opened for reading
fn check_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path_string(path),
        });
    }
    File::open(path).map_err(|e| read_error(path, &e))?;
    Ok(())
}

/// Remove a leading BOM from the file, rewriting it only when one is found
fn sanitize_file(path: &Path) -> Result<()> {
    let mut head = Vec::with_capacity(BOM.len());
    File::open(path)
        .and_then(|file| file.take(BOM.len() as u64).read_to_end(&mut head))
        .map_err(|e| read_error(path, &e))?;

    if head != BOM {
        return Ok(());
    }

    let contents = std::fs::read(path).map_err(|e| read_error(path, &e))?;
    std::fs::write(path, &contents[BOM.len()..]).map_err(|_| Error::FileNotWritable {
        path: path_string(path),
    })?;
    debug!(path = %path.display(), "Removed byte order mark");
    Ok(())
}
