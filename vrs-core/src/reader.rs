//! Reader for finalized record files.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{FormatError, Result};
use crate::file_format::{
    FileFooter, FileHeader, HeaderFlags, IndexEntry, StreamDescriptor, FOOTER_SIZE,
    INDEX_ENTRY_SIZE,
};
use crate::layout::ContentLayout;
use crate::record::{Record, RecordType};

/// Reader for record files
pub struct RecordFileReader<R: Read + Seek> {
    reader: R,
    header: FileHeader,
    footer: FileFooter,
    /// Total stream length in bytes
    len: u64,
    streams: Vec<StreamDescriptor>,
    index: Vec<IndexEntry>,
}

impl<R: Read + Seek> RecordFileReader<R> {
    /// Open a record file, loading its stream directory and record index
    pub fn open(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = FileHeader::read(&mut reader)?;
        if !header.flags.contains(HeaderFlags::FINALIZED) {
            return Err(FormatError::Corrupt("file was not finalized".to_string()));
        }

        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let footer = FileFooter::read(&mut reader)?;
        if footer.record_count != header.record_count {
            return Err(FormatError::Corrupt(format!(
                "header counts {} records, footer counts {}",
                header.record_count, footer.record_count
            )));
        }
        let records_end = section_end(header.records_offset, header.records_len, len)?;
        if footer.records_end != records_end {
            return Err(FormatError::Corrupt(format!(
                "records end at {}, footer says {}",
                records_end, footer.records_end
            )));
        }

        let directory = read_section(
            &mut reader,
            header.directory_offset,
            header.directory_len,
            len,
        )?;
        let mut cursor = directory.as_slice();
        let mut streams = Vec::with_capacity((header.stream_count as usize).min(directory.len()));
        for _ in 0..header.stream_count {
            streams.push(StreamDescriptor::read(&mut cursor)?);
        }
        if !cursor.is_empty() {
            return Err(FormatError::Corrupt(format!(
                "{} trailing bytes in stream directory",
                cursor.len()
            )));
        }

        let mut index = Vec::new();
        if header.flags.contains(HeaderFlags::INDEXED) {
            let index_len = (header.record_count as u64)
                .checked_mul(INDEX_ENTRY_SIZE as u64)
                .ok_or_else(|| FormatError::Corrupt("index length overflows".to_string()))?;
            let section = read_section(&mut reader, header.index_offset, index_len, len)?;
            index.reserve_exact(header.record_count as usize);
            let mut cursor = section.as_slice();
            for _ in 0..header.record_count {
                index.push(IndexEntry::read(&mut cursor)?);
            }
        } else if header.record_count > 0 {
            return Err(FormatError::Corrupt("records without an index".to_string()));
        }

        Ok(Self {
            reader,
            header,
            footer,
            len,
            streams,
            index,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn footer(&self) -> &FileFooter {
        &self.footer
    }

    /// Stream directory, ordered by stream id
    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    pub fn stream(&self, stream_id: u32) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.stream_id == stream_id)
    }

    pub fn stream_ids(&self) -> Vec<u32> {
        self.streams.iter().map(|s| s.stream_id).collect()
    }

    /// Index entries in file order
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn record_count(&self) -> usize {
        self.index.len()
    }

    /// Read and decode the record an index entry points at
    pub fn read_record(&mut self, entry: &IndexEntry) -> Result<Record> {
        let body = read_section(&mut self.reader, entry.offset, entry.size as u64, self.len)?;
        let mut cursor = body.as_slice();
        let streams = &self.streams;
        let record = Record::read(&mut cursor, |stream_id, record_type, version| {
            resolve_layout(streams, stream_id, record_type, version)
        })?;

        if record.stream_id != entry.stream_id || record.record_type != entry.record_type {
            return Err(FormatError::Corrupt(format!(
                "index entry at offset {} names stream {} {}, record is stream {} {}",
                entry.offset,
                entry.stream_id,
                entry.record_type,
                record.stream_id,
                record.record_type
            )));
        }
        if !cursor.is_empty() {
            return Err(FormatError::Corrupt(format!(
                "record at offset {} has {} unread bytes",
                entry.offset,
                cursor.len()
            )));
        }
        Ok(record)
    }

    /// All records in file order
    pub fn records(&mut self) -> Result<Vec<Record>> {
        let entries = self.index.clone();
        entries.iter().map(|e| self.read_record(e)).collect()
    }

    /// Records of one kind for one stream, in file order
    pub fn stream_records(
        &mut self,
        stream_id: u32,
        record_type: RecordType,
    ) -> Result<Vec<Record>> {
        if self.stream(stream_id).is_none() {
            return Err(FormatError::UnknownStream(stream_id));
        }
        let entries: Vec<IndexEntry> = self
            .index
            .iter()
            .filter(|e| e.stream_id == stream_id && e.record_type == record_type)
            .cloned()
            .collect();
        entries.iter().map(|e| self.read_record(e)).collect()
    }

    /// The most recent configuration JSON of a stream
    pub fn configuration(&mut self, stream_id: u32) -> Result<Option<String>> {
        let configs = self.stream_records(stream_id, RecordType::Configuration)?;
        Ok(configs
            .last()
            .map(|r| r.text().unwrap_or_default().to_string()))
    }

    pub fn data_records(&mut self, stream_id: u32) -> Result<Vec<Record>> {
        self.stream_records(stream_id, RecordType::Data)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// End offset of a section, which must lie within a stream of `total` bytes
fn section_end(offset: u64, len: u64, total: u64) -> Result<u64> {
    match offset.checked_add(len) {
        Some(end) if end <= total => Ok(end),
        _ => Err(FormatError::Corrupt(format!(
            "section of {} bytes at offset {} exceeds file length {}",
            len, offset, total
        ))),
    }
}

fn read_section<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    len: u64,
    total: u64,
) -> Result<Vec<u8>> {
    section_end(offset, len, total)?;
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn resolve_layout<'a>(
    streams: &'a [StreamDescriptor],
    stream_id: u32,
    record_type: RecordType,
    format_version: u32,
) -> Result<&'a ContentLayout> {
    let stream = streams
        .iter()
        .find(|s| s.stream_id == stream_id)
        .ok_or(FormatError::UnknownStream(stream_id))?;
    stream
        .format(record_type, format_version)
        .map(|f| &f.layout)
        .ok_or(FormatError::MissingFormat {
            stream_id,
            record_type,
            format_version,
        })
}
