use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vrs_core::FormatError;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Record file is not open")]
    NotOpen,
    #[error("No stream with id {0}")]
    UnknownStream(u32),
    #[error("Failed to write record file '{}': {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Record format error: {0}")]
    Format(#[from] FormatError),
    #[error("Cannot load configuration '{}': {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

impl WriterError {
    pub(crate) fn write_failed(path: &std::path::Path, source: io::Error) -> Self {
        WriterError::WriteFailed {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;
