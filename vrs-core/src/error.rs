//! Error types for record file encoding and decoding

use std::io;

use thiserror::Error;

use crate::record::RecordType;

/// Errors that can occur when encoding or decoding a record file
#[derive(Error, Debug)]
pub enum FormatError {
    /// Underlying read or write failed
    #[error("I/O operation failed: {0}")]
    Io(#[from] io::Error),

    /// Header or footer magic doesn't match
    #[error("Invalid {section}: expected magic {expected:02X?}, got {actual:02X?}")]
    BadMagic {
        section: &'static str,
        expected: [u8; 4],
        actual: [u8; 4],
    },

    /// File was written by a newer format revision
    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    /// Record type tag not recognized
    #[error("Unknown record type: {0:#04X}")]
    UnknownRecordType(u8),

    /// Field type tag not recognized
    #[error("Unknown field type: {0:#04X}")]
    UnknownFieldType(u8),

    /// Record references a stream missing from the directory
    #[error("Unknown stream id {0}")]
    UnknownStream(u32),

    /// Stream declares no layout for this record type and version
    #[error("Stream {stream_id} has no {record_type} format version {format_version}")]
    MissingFormat {
        stream_id: u32,
        record_type: RecordType,
        format_version: u32,
    },

    /// Field values don't match the declared layout
    #[error("Layout mismatch: expected {expected}, got {actual}")]
    LayoutMismatch { expected: String, actual: String },

    /// Invalid UTF-8 in string field
    #[error("Invalid string encoding")]
    InvalidString,

    /// Structural inconsistency between sections
    #[error("Corrupt record file: {0}")]
    Corrupt(String),
}

impl From<std::string::FromUtf8Error> for FormatError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        FormatError::InvalidString
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
