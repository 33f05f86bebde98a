//! Little-endian primitives shared by every section of the file.
//!
//! Variable length values are length-prefixed: strings and blocks with a
//! `u32`, names inside layout declarations with a `u16`.

use std::io::{self, Read, Write};

use crate::error::{FormatError, Result};

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn write_f64<W: Write>(writer: &mut W, value: f64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write a `u32` length prefix followed by the bytes
pub fn write_block<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block of {} bytes exceeds u32 length prefix", bytes.len()),
        )
    })?;
    write_u32(writer, len)?;
    writer.write_all(bytes)
}

/// Write a `u16` length prefix followed by the UTF-8 bytes
pub fn write_short_str<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("name of {} bytes exceeds u16 length prefix", value.len()),
        )
    })?;
    write_u16(writer, len)?;
    writer.write_all(value.as_bytes())
}

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_f64<R: Read>(reader: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a `u32` length-prefixed block
pub fn read_block<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    Ok(data)
}

/// Read a `u32` length-prefixed UTF-8 string
pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    Ok(String::from_utf8(read_block(reader)?)?)
}

/// Read a `u16` length-prefixed UTF-8 string
pub fn read_short_str<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_u16(reader)? as usize;
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;
    String::from_utf8(data).map_err(|_| FormatError::InvalidString)
}
