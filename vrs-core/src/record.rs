//! Record kinds, record formats and record framing.

use std::io::{Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use serde::Serialize;
use strum::{Display, EnumIter};

use crate::codec;
use crate::error::{FormatError, Result};
use crate::layout::{ContentLayout, FieldValue};

/// Fixed part of every record body: stream id, type, version, timestamp
pub const RECORD_HEADER_SIZE: usize = 4 + 1 + 4 + 8;

/// Record kind tag
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    FromPrimitive,
    ToPrimitive,
    Display,
    EnumIter,
    Serialize,
)]
#[repr(u8)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Configuration = 1,
    Data = 2,
    State = 3,
}

impl RecordType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        RecordType::from_u8(tag).ok_or(FormatError::UnknownRecordType(tag))
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A content layout bound to a record kind and format version.
///
/// Formats are fixed when a stream is created and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFormat {
    pub record_type: RecordType,
    pub format_version: u32,
    pub layout: ContentLayout,
}

impl RecordFormat {
    pub fn new(record_type: RecordType, format_version: u32, layout: ContentLayout) -> Self {
        Self {
            record_type,
            format_version,
            layout,
        }
    }

    /// Build a record of this format after checking values against the layout
    pub fn encode(
        &self,
        stream_id: u32,
        timestamp: f64,
        fields: Vec<FieldValue>,
        payload: Option<Vec<u8>>,
    ) -> Result<Record> {
        self.layout.check(&fields, payload.as_deref())?;
        Ok(Record {
            stream_id,
            record_type: self.record_type,
            format_version: self.format_version,
            timestamp,
            fields,
            payload,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        codec::write_u8(writer, self.record_type.tag())?;
        codec::write_u32(writer, self.format_version)?;
        self.layout.write_declaration(writer)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let record_type = RecordType::from_tag(codec::read_u8(reader)?)?;
        let format_version = codec::read_u32(reader)?;
        let layout = ContentLayout::read_declaration(reader)?;
        Ok(Self {
            record_type,
            format_version,
            layout,
        })
    }
}

/// One timestamped record belonging to one stream
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub stream_id: u32,
    pub record_type: RecordType,
    pub format_version: u32,
    /// Seconds, as given by the caller
    pub timestamp: f64,
    /// Values in layout order
    pub fields: Vec<FieldValue>,
    /// Trailing opaque block, present iff the layout declares one
    pub payload: Option<Vec<u8>>,
}

impl Record {
    /// Write the record body using its format's layout
    pub fn write<W: Write>(&self, writer: &mut W, layout: &ContentLayout) -> Result<()> {
        codec::write_u32(writer, self.stream_id)?;
        codec::write_u8(writer, self.record_type.tag())?;
        codec::write_u32(writer, self.format_version)?;
        codec::write_f64(writer, self.timestamp)?;
        layout.write_content(writer, &self.fields, self.payload.as_deref())
    }

    /// Read a record body, resolving its layout from the header fields
    pub fn read<'a, R, F>(reader: &mut R, resolve: F) -> Result<Self>
    where
        R: Read,
        F: FnOnce(u32, RecordType, u32) -> Result<&'a ContentLayout>,
    {
        let stream_id = codec::read_u32(reader)?;
        let record_type = RecordType::from_tag(codec::read_u8(reader)?)?;
        let format_version = codec::read_u32(reader)?;
        let timestamp = codec::read_f64(reader)?;
        let layout = resolve(stream_id, record_type, format_version)?;
        let (fields, payload) = layout.read_content(reader)?;

        Ok(Self {
            stream_id,
            record_type,
            format_version,
            timestamp,
            fields,
            payload,
        })
    }

    /// Encoded size of this record in bytes
    pub fn size(&self) -> usize {
        let fields: usize = self.fields.iter().map(FieldValue::size).sum();
        let payload = self.payload.as_ref().map_or(0, |p| 4 + p.len());
        RECORD_HEADER_SIZE + fields + payload
    }

    /// First string field, which is where configuration JSON lives
    pub fn text(&self) -> Option<&str> {
        self.fields.iter().find_map(FieldValue::as_str)
    }
}
