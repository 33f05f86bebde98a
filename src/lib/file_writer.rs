//! Record accumulation and the finalize pass.
//!
//! Records are held in memory in the order they were produced. Finalizing
//! lays out header, stream directory, record index and record bodies in one
//! buffer and writes it with a single write, through a temporary file that
//! is renamed over the target when the configuration asks for atomic output.

use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use vrs_core::{
    FileFooter, FileHeader, FormatError, HeaderFlags, IndexEntry, Record, FILE_VERSION,
    FOOTER_SIZE, HEADER_SIZE, INDEX_ENTRY_SIZE,
};

use crate::config::WriterConfig;
use crate::error::{Result, WriterError};
use crate::registry::StreamRegistry;

pub struct RecordFileWriter {
    config: WriterConfig,
    records: Vec<Record>,
    /// Encoded size of all accumulated records
    records_len: u64,
}

impl RecordFileWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            records_len: 0,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Append a produced record
    pub fn push(&mut self, record: Record) {
        self.records_len += record.size() as u64;
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Lay out the complete file in memory
    pub fn serialize(
        &self,
        registry: &StreamRegistry,
        creation_time_ms: u64,
    ) -> std::result::Result<Vec<u8>, FormatError> {
        let record_count = u32::try_from(self.records.len())
            .map_err(|_| FormatError::Corrupt(format!("{} records", self.records.len())))?;
        let stream_count = u32::try_from(registry.len())
            .map_err(|_| FormatError::Corrupt(format!("{} streams", registry.len())))?;

        let mut directory = Vec::new();
        for recordable in registry.iter() {
            recordable.descriptor().write(&mut directory)?;
        }

        let directory_offset = HEADER_SIZE as u64;
        let index_offset = directory_offset + directory.len() as u64;
        let records_offset = index_offset + (self.records.len() * INDEX_ENTRY_SIZE) as u64;

        let mut bodies = Vec::with_capacity(self.records_len as usize);
        let mut index = Vec::with_capacity(self.records.len() * INDEX_ENTRY_SIZE);
        for record in &self.records {
            let recordable = registry
                .lookup(record.stream_id)
                .ok_or(FormatError::UnknownStream(record.stream_id))?;
            let layout = &recordable
                .formats()
                .iter()
                .find(|f| {
                    f.record_type == record.record_type && f.format_version == record.format_version
                })
                .ok_or(FormatError::MissingFormat {
                    stream_id: record.stream_id,
                    record_type: record.record_type,
                    format_version: record.format_version,
                })?
                .layout;

            let start = bodies.len();
            record.write(&mut bodies, layout)?;
            let size = u32::try_from(bodies.len() - start).map_err(|_| {
                FormatError::Corrupt(format!(
                    "record of {} bytes on stream {}",
                    bodies.len() - start,
                    record.stream_id
                ))
            })?;

            IndexEntry {
                stream_id: record.stream_id,
                record_type: record.record_type,
                timestamp: record.timestamp,
                offset: records_offset + start as u64,
                size,
            }
            .write(&mut index)?;
        }

        let header = FileHeader {
            version: FILE_VERSION,
            flags: HeaderFlags::FINALIZED | HeaderFlags::INDEXED,
            stream_count,
            record_count,
            creation_time_ms,
            directory_offset,
            directory_len: directory.len() as u64,
            index_offset,
            records_offset,
            records_len: bodies.len() as u64,
        };
        let footer = FileFooter {
            record_count,
            records_end: records_offset + bodies.len() as u64,
        };

        let mut buf = Vec::with_capacity(
            HEADER_SIZE + directory.len() + index.len() + bodies.len() + FOOTER_SIZE,
        );
        header.write(&mut buf)?;
        buf.extend_from_slice(&directory);
        buf.extend_from_slice(&index);
        buf.extend_from_slice(&bodies);
        footer.write(&mut buf)?;

        debug!(
            "Laid out {} streams, {} records in {} bytes",
            stream_count,
            record_count,
            buf.len()
        );
        Ok(buf)
    }

    /// Serialize and write the file at `path`, returning the bytes written
    pub fn write_to_file(&self, registry: &StreamRegistry, path: &Path) -> Result<u64> {
        let bytes = self.serialize(registry, now_ms()).map_err(|e| {
            WriterError::write_failed(path, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        if self.config.atomic {
            let temp = self.config.temp_path(path);
            let result = write_file(&temp, &bytes, self.config.sync)
                .and_then(|()| fs::rename(&temp, path));
            if let Err(e) = result {
                if let Err(cleanup) = fs::remove_file(&temp) {
                    if cleanup.kind() != io::ErrorKind::NotFound {
                        warn!("Failed to remove {}: {}", temp.display(), cleanup);
                    }
                }
                return Err(WriterError::write_failed(path, e));
            }
        } else {
            write_file(path, &bytes, self.config.sync)
                .map_err(|e| WriterError::write_failed(path, e))?;
        }

        info!(
            "Wrote {}: {} streams, {} records, {} bytes",
            path.display(),
            registry.len(),
            self.records.len(),
            bytes.len()
        );
        Ok(bytes.len() as u64)
    }
}

fn write_file(path: &Path, bytes: &[u8], sync: bool) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recordable::StreamRecordable;
    use std::io::Cursor;
    use tempfile::tempdir;
    use vrs_core::{RecordFileReader, RecordType};

    fn camera_registry() -> StreamRegistry {
        let mut registry = StreamRegistry::new();
        registry.register(StreamRecordable::new(1001, "RGB Camera"));
        registry
    }

    #[test]
    fn test_serialize_empty_session() {
        let writer = RecordFileWriter::new(WriterConfig::default());
        let bytes = writer.serialize(&StreamRegistry::new(), 0).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + FOOTER_SIZE);

        let reader = RecordFileReader::open(Cursor::new(bytes)).unwrap();
        assert!(reader.streams().is_empty());
    }

    #[test]
    fn test_index_points_at_records() {
        let registry = camera_registry();
        let recordable = registry.lookup(1001).unwrap();
        let mut writer = RecordFileWriter::new(WriterConfig::default());
        writer.push(recordable.produce_data_record(1.0, &[1, 2]).unwrap());
        writer.push(recordable.produce_data_record(0.5, &[3]).unwrap());
        let timestamps: Vec<f64> = writer.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![1.0, 0.5]);

        let bytes = writer.serialize(&registry, 42).unwrap();
        let mut reader = RecordFileReader::open(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.header().creation_time_ms, 42);

        let index = reader.index().to_vec();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].timestamp, 1.0);
        assert_eq!(index[1].timestamp, 0.5);
        assert_eq!(index[1].offset, index[0].offset + index[0].size as u64);

        let second = reader.read_record(&index[1]).unwrap();
        assert_eq!(second.record_type, RecordType::Data);
        assert_eq!(second.payload, Some(vec![3]));
    }

    #[test]
    fn test_record_for_unregistered_stream_fails() {
        let mut writer = RecordFileWriter::new(WriterConfig::default());
        writer.push(
            StreamRecordable::new(9, "gone")
                .produce_data_record(0.0, &[])
                .unwrap(),
        );
        let err = writer.serialize(&camera_registry(), 0).unwrap_err();
        assert!(matches!(err, FormatError::UnknownStream(9)));
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.vrs");
        let writer = RecordFileWriter::new(WriterConfig::default());

        let written = writer.write_to_file(&camera_registry(), &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), written);
        assert!(!writer.config().temp_path(&path).exists());
    }

    #[test]
    fn test_direct_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("direct.vrs");
        let config = WriterConfig {
            atomic: false,
            sync: false,
            ..Default::default()
        };
        let writer = RecordFileWriter::new(config);
        writer.write_to_file(&camera_registry(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_is_write_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.vrs");
        let writer = RecordFileWriter::new(WriterConfig::default());

        let err = writer.write_to_file(&camera_registry(), &path).unwrap_err();
        assert!(matches!(err, WriterError::WriteFailed { .. }));
        assert!(!path.exists());
    }
}
