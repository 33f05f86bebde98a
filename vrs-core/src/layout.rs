//! Content layout descriptors.
//!
//! A [`ContentLayout`] is the schema of one record kind of one stream: the
//! ordered typed fields written before any raw payload, and whether a
//! length-prefixed opaque block trails them. Layouts are written into the
//! stream directory so a reader can decode records without outside knowledge.

use std::fmt;
use std::io::{Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use serde::Serialize;
use strum::Display;

use crate::codec;
use crate::error::{FormatError, Result};

/// Wire tag of a field's value type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive, Display, Serialize,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String = 1,
    F64 = 2,
    U32 = 3,
    U64 = 4,
}

impl FieldType {
    pub fn from_tag(tag: u8) -> Result<Self> {
        FieldType::from_u8(tag).ok_or(FormatError::UnknownFieldType(tag))
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// One named, typed field in a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
}

/// A field value as carried by a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    F64(f64),
    U32(u32),
    U64(u64),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::F64(_) => FieldType::F64,
            FieldValue::U32(_) => FieldType::U32,
            FieldValue::U64(_) => FieldType::U64,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            FieldValue::String(s) => codec::write_block(writer, s.as_bytes()),
            FieldValue::F64(v) => codec::write_f64(writer, *v),
            FieldValue::U32(v) => codec::write_u32(writer, *v),
            FieldValue::U64(v) => codec::write_u64(writer, *v),
        }
    }

    fn read<R: Read>(reader: &mut R, field_type: FieldType) -> Result<Self> {
        Ok(match field_type {
            FieldType::String => FieldValue::String(codec::read_string(reader)?),
            FieldType::F64 => FieldValue::F64(codec::read_f64(reader)?),
            FieldType::U32 => FieldValue::U32(codec::read_u32(reader)?),
            FieldType::U64 => FieldValue::U64(codec::read_u64(reader)?),
        })
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        match self {
            FieldValue::String(s) => 4 + s.len(),
            FieldValue::F64(_) | FieldValue::U64(_) => 8,
            FieldValue::U32(_) => 4,
        }
    }
}

/// Schema of one record kind: ordered fields plus optional trailing block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLayout {
    fields: Vec<FieldSpec>,
    trailing_block: bool,
}

impl ContentLayout {
    /// An empty layout: no fields, no trailing block
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            field_type,
        });
        self
    }

    pub fn with_trailing_block(mut self) -> Self {
        self.trailing_block = true;
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn has_trailing_block(&self) -> bool {
        self.trailing_block
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.trailing_block
    }

    /// Verify that `values` and `payload` fit this layout
    pub fn check(&self, values: &[FieldValue], payload: Option<&[u8]>) -> Result<()> {
        let expected: Vec<FieldType> = self.fields.iter().map(|f| f.field_type).collect();
        let actual: Vec<FieldType> = values.iter().map(FieldValue::field_type).collect();
        if expected != actual {
            return Err(FormatError::LayoutMismatch {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            });
        }
        if self.trailing_block != payload.is_some() {
            return Err(FormatError::LayoutMismatch {
                expected: format!("trailing block: {}", self.trailing_block),
                actual: format!("trailing block: {}", payload.is_some()),
            });
        }
        Ok(())
    }

    /// Write the self-description that goes into the stream directory
    pub fn write_declaration<W: Write>(&self, writer: &mut W) -> Result<()> {
        let count = u16::try_from(self.fields.len())
            .map_err(|_| FormatError::Corrupt(format!("{} fields in layout", self.fields.len())))?;
        codec::write_u16(writer, count)?;
        for field in &self.fields {
            codec::write_u8(writer, field.field_type.tag())?;
            codec::write_short_str(writer, &field.name)?;
        }
        codec::write_u8(writer, self.trailing_block as u8)?;
        Ok(())
    }

    pub fn read_declaration<R: Read>(reader: &mut R) -> Result<Self> {
        let count = codec::read_u16(reader)?;
        let mut fields = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let field_type = FieldType::from_tag(codec::read_u8(reader)?)?;
            let name = codec::read_short_str(reader)?;
            fields.push(FieldSpec { name, field_type });
        }
        let trailing_block = match codec::read_u8(reader)? {
            0 => false,
            1 => true,
            other => {
                return Err(FormatError::Corrupt(format!(
                    "trailing block flag {}",
                    other
                )))
            }
        };
        Ok(Self {
            fields,
            trailing_block,
        })
    }

    /// Encode field values in declared order, then the trailing block
    pub fn write_content<W: Write>(
        &self,
        writer: &mut W,
        values: &[FieldValue],
        payload: Option<&[u8]>,
    ) -> Result<()> {
        self.check(values, payload)?;
        for value in values {
            value.write(writer)?;
        }
        if let Some(payload) = payload {
            codec::write_block(writer, payload)?;
        }
        Ok(())
    }

    pub fn read_content<R: Read>(
        &self,
        reader: &mut R,
    ) -> Result<(Vec<FieldValue>, Option<Vec<u8>>)> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(FieldValue::read(reader, field.field_type)?);
        }
        let payload = if self.trailing_block {
            Some(codec::read_block(reader)?)
        } else {
            None
        };
        Ok((values, payload))
    }
}

impl fmt::Display for ContentLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|s| format!("{}:{}", s.name, s.field_type))
            .collect();
        write!(f, "[{}]", fields.join(", "))?;
        if self.trailing_block {
            write!(f, " + block")?;
        }
        Ok(())
    }
}
