//! Record file structures.
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Header (64 bytes)        │  magic "VRSL", version, flags, section offsets
//! ├──────────────────────────┤
//! │ Stream directory         │  id, name, record formats per stream
//! ├──────────────────────────┤
//! │ Record index             │  (stream, type, timestamp, offset, size) per record
//! ├──────────────────────────┤
//! │ Record 0                 │  stream id, type, version, timestamp, content
//! │ Record 1                 │
//! │ ...                      │
//! ├──────────────────────────┤
//! │ Footer (24 bytes)        │  magic "VRSE", record count, end of records
//! └──────────────────────────┘
//! ```
//!
//! The footer is written last; a file without a valid footer was never
//! finalized.

use std::io::{self, Read, Write};

use bitflags::bitflags;
use serde::Serialize;

use crate::codec;
use crate::error::{FormatError, Result};
use crate::record::{RecordFormat, RecordType};

/// Magic bytes for the file header
pub const FILE_MAGIC: [u8; 4] = *b"VRSL";

/// Magic bytes for the file footer
pub const FOOTER_MAGIC: [u8; 4] = *b"VRSE";

/// Current file version
pub const FILE_VERSION: u16 = 1;

/// Header size in bytes (fixed)
pub const HEADER_SIZE: usize = 64;

/// Footer size in bytes (fixed)
pub const FOOTER_SIZE: usize = 24;

/// Index entry size in bytes
pub const INDEX_ENTRY_SIZE: usize = 4 + 1 + 8 + 8 + 4;

bitflags! {
    /// Header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u16 {
        /// All sections were laid out in a single finalize pass
        const FINALIZED = 0x0001;
        /// A record index follows the stream directory
        const INDEXED = 0x0002;
    }
}

/// File header (64 bytes fixed size)
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub version: u16,
    pub flags: HeaderFlags,
    pub stream_count: u32,
    pub record_count: u32,
    /// Unix timestamp in milliseconds
    pub creation_time_ms: u64,
    pub directory_offset: u64,
    pub directory_len: u64,
    pub index_offset: u64,
    pub records_offset: u64,
    pub records_len: u64,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            version: FILE_VERSION,
            flags: HeaderFlags::empty(),
            stream_count: 0,
            record_count: 0,
            creation_time_ms: 0,
            directory_offset: HEADER_SIZE as u64,
            directory_len: 0,
            index_offset: HEADER_SIZE as u64,
            records_offset: HEADER_SIZE as u64,
            records_len: 0,
        }
    }
}

impl FileHeader {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; HEADER_SIZE];

        buf[0..4].copy_from_slice(&FILE_MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[8..12].copy_from_slice(&self.stream_count.to_le_bytes());
        buf[12..16].copy_from_slice(&self.record_count.to_le_bytes());
        buf[16..24].copy_from_slice(&self.creation_time_ms.to_le_bytes());
        buf[24..32].copy_from_slice(&self.directory_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&self.directory_len.to_le_bytes());
        buf[40..48].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[48..56].copy_from_slice(&self.records_offset.to_le_bytes());
        buf[56..64].copy_from_slice(&self.records_len.to_le_bytes());

        writer.write_all(&buf)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf)?;

        check_magic("header", &FILE_MAGIC, &buf[0..4])?;

        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version > FILE_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let mut fields = &buf[6..];
        Ok(Self {
            version,
            flags: HeaderFlags::from_bits_truncate(codec::read_u16(&mut fields)?),
            stream_count: codec::read_u32(&mut fields)?,
            record_count: codec::read_u32(&mut fields)?,
            creation_time_ms: codec::read_u64(&mut fields)?,
            directory_offset: codec::read_u64(&mut fields)?,
            directory_len: codec::read_u64(&mut fields)?,
            index_offset: codec::read_u64(&mut fields)?,
            records_offset: codec::read_u64(&mut fields)?,
            records_len: codec::read_u64(&mut fields)?,
        })
    }
}

/// File footer (24 bytes fixed size)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileFooter {
    pub record_count: u32,
    /// Offset one past the last record byte
    pub records_end: u64,
}

impl FileFooter {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; FOOTER_SIZE];

        buf[0..4].copy_from_slice(&FOOTER_MAGIC);
        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..16].copy_from_slice(&self.records_end.to_le_bytes());
        // Reserved (8 bytes, already zeroed)

        writer.write_all(&buf)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; FOOTER_SIZE];
        reader.read_exact(&mut buf)?;

        check_magic("footer", &FOOTER_MAGIC, &buf[0..4])?;

        let mut fields = &buf[4..];
        Ok(Self {
            record_count: codec::read_u32(&mut fields)?,
            records_end: codec::read_u64(&mut fields)?,
        })
    }
}

fn check_magic(section: &'static str, expected: &[u8; 4], actual: &[u8]) -> Result<()> {
    if actual != expected {
        let mut got = [0u8; 4];
        got.copy_from_slice(&actual[..4]);
        return Err(FormatError::BadMagic {
            section,
            expected: *expected,
            actual: got,
        });
    }
    Ok(())
}

/// One stream's entry in the stream directory
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub stream_id: u32,
    pub name: String,
    pub formats: Vec<RecordFormat>,
}

impl StreamDescriptor {
    /// The declared format for a record kind and version
    pub fn format(&self, record_type: RecordType, format_version: u32) -> Option<&RecordFormat> {
        self.formats
            .iter()
            .find(|f| f.record_type == record_type && f.format_version == format_version)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_u32(writer, self.stream_id)?;
        codec::write_block(writer, self.name.as_bytes())?;
        let count = u8::try_from(self.formats.len()).map_err(|_| {
            FormatError::Corrupt(format!(
                "stream {} declares {} formats",
                self.stream_id,
                self.formats.len()
            ))
        })?;
        codec::write_u8(writer, count)?;
        for format in &self.formats {
            format.write(writer)?;
        }
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let stream_id = codec::read_u32(reader)?;
        let name = codec::read_string(reader)?;
        let count = codec::read_u8(reader)?;
        let mut formats = Vec::with_capacity(count as usize);
        for _ in 0..count {
            formats.push(RecordFormat::read(reader)?);
        }
        Ok(Self {
            stream_id,
            name,
            formats,
        })
    }
}

/// Index entry locating one record (25 bytes)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub stream_id: u32,
    pub record_type: RecordType,
    pub timestamp: f64,
    /// Absolute file offset of the record body
    pub offset: u64,
    /// Record body size in bytes
    pub size: u32,
}

impl IndexEntry {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        codec::write_u32(writer, self.stream_id)?;
        codec::write_u8(writer, self.record_type.tag())?;
        codec::write_f64(writer, self.timestamp)?;
        codec::write_u64(writer, self.offset)?;
        codec::write_u32(writer, self.size)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            stream_id: codec::read_u32(reader)?,
            record_type: RecordType::from_tag(codec::read_u8(reader)?)?,
            timestamp: codec::read_f64(reader)?,
            offset: codec::read_u64(reader)?,
            size: codec::read_u32(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ContentLayout, FieldType};
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = FileHeader {
            version: FILE_VERSION,
            flags: HeaderFlags::FINALIZED | HeaderFlags::INDEXED,
            stream_count: 2,
            record_count: 10,
            creation_time_ms: 1_234_567_890_123,
            directory_offset: 64,
            directory_len: 120,
            index_offset: 184,
            records_offset: 434,
            records_len: 1000,
        };

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], b"VRSL");

        let read = FileHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn test_header_bad_magic() {
        let buf = vec![0u8; HEADER_SIZE];
        let err = FileHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { section: "header", .. }));
    }

    #[test]
    fn test_header_newer_version() {
        let mut buf = Vec::new();
        FileHeader::default().write(&mut buf).unwrap();
        buf[4..6].copy_from_slice(&(FILE_VERSION + 1).to_le_bytes());
        let err = FileHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_footer_roundtrip() {
        let footer = FileFooter {
            record_count: 3,
            records_end: 4096,
        };

        let mut buf = Vec::new();
        footer.write(&mut buf).unwrap();
        assert_eq!(buf.len(), FOOTER_SIZE);

        let read = FileFooter::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read, footer);
    }

    #[test]
    fn test_index_entry_size() {
        let entry = IndexEntry {
            stream_id: 1001,
            record_type: RecordType::Data,
            timestamp: 0.5,
            offset: 300,
            size: 40,
        };
        let mut buf = Vec::new();
        entry.write(&mut buf).unwrap();
        assert_eq!(buf.len(), INDEX_ENTRY_SIZE);
        assert_eq!(IndexEntry::read(&mut Cursor::new(buf)).unwrap(), entry);
    }

    #[test]
    fn test_stream_descriptor_lookup() {
        let descriptor = StreamDescriptor {
            stream_id: 1001,
            name: "RGB Camera".to_string(),
            formats: vec![
                RecordFormat::new(
                    RecordType::Configuration,
                    1,
                    ContentLayout::new().with_field("config_json", FieldType::String),
                ),
                RecordFormat::new(RecordType::State, 1, ContentLayout::new()),
            ],
        };

        let mut buf = Vec::new();
        descriptor.write(&mut buf).unwrap();
        let read = StreamDescriptor::read(&mut Cursor::new(buf)).unwrap();

        assert_eq!(read, descriptor);
        assert!(read.format(RecordType::Configuration, 1).is_some());
        assert!(read.format(RecordType::Configuration, 2).is_none());
        assert!(read.format(RecordType::Data, 1).is_none());
    }
}
