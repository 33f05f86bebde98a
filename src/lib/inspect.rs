//! Reading finished record files back for inspection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use vrs_core::{FormatError, RecordFileReader, RecordType};

use crate::error::Result;

/// Open a finalized record file
pub fn open_recording(path: &Path) -> Result<RecordFileReader<BufReader<File>>> {
    let file = File::open(path).map_err(FormatError::from)?;
    Ok(RecordFileReader::open(BufReader::new(file))?)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub stream_id: u32,
    pub name: String,
    /// Most recent configuration JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    pub configuration_records: usize,
    pub data_records: usize,
    pub state_records: usize,
    /// Smallest and largest data timestamp; timestamps need not be ordered
    pub min_timestamp: Option<f64>,
    pub max_timestamp: Option<f64>,
    pub payload_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub record_count: usize,
    pub streams: Vec<StreamSummary>,
}

/// Read every record of a file and summarize it per stream
pub fn summarize(path: &Path) -> Result<RecordingSummary> {
    let size = fs::metadata(path).map_err(FormatError::from)?.len();
    let mut reader = open_recording(path)?;
    let created = DateTime::<Utc>::from_timestamp_millis(reader.header().creation_time_ms as i64)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut streams: Vec<StreamSummary> = reader
        .streams()
        .iter()
        .map(|s| StreamSummary {
            stream_id: s.stream_id,
            name: s.name.clone(),
            configuration: None,
            configuration_records: 0,
            data_records: 0,
            state_records: 0,
            min_timestamp: None,
            max_timestamp: None,
            payload_bytes: 0,
        })
        .collect();

    for record in reader.records()? {
        let Some(summary) = streams.iter_mut().find(|s| s.stream_id == record.stream_id) else {
            return Err(FormatError::UnknownStream(record.stream_id).into());
        };
        match record.record_type {
            RecordType::Configuration => {
                summary.configuration_records += 1;
                summary.configuration = Some(record.text().unwrap_or_default().to_string());
            }
            RecordType::Data => {
                summary.data_records += 1;
                summary.payload_bytes += record.payload.as_ref().map_or(0, |p| p.len() as u64);
                let t = record.timestamp;
                summary.min_timestamp = Some(summary.min_timestamp.map_or(t, |m| m.min(t)));
                summary.max_timestamp = Some(summary.max_timestamp.map_or(t, |m| m.max(t)));
            }
            RecordType::State => summary.state_records += 1,
        }
    }

    Ok(RecordingSummary {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size,
        created,
        record_count: reader.record_count(),
        streams,
    })
}

impl fmt::Display for RecordingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} bytes, {} records, created {}",
            self.filename,
            self.size,
            self.record_count,
            self.created.to_rfc3339()
        )?;
        for s in &self.streams {
            write!(
                f,
                "  stream {} '{}': {} configuration, {} data ({} bytes)",
                s.stream_id, s.name, s.configuration_records, s.data_records, s.payload_bytes
            )?;
            if let (Some(min), Some(max)) = (s.min_timestamp, s.max_timestamp) {
                write!(f, ", t = {:.3}..{:.3}s", min, max)?;
            }
            writeln!(f)?;
            if let Some(config) = &s.configuration {
                writeln!(f, "    config: {}", config)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriterError;
    use crate::writer::VrsWriter;
    use tempfile::tempdir;

    #[test]
    fn test_summary_counts_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.vrs");
        {
            let mut writer = VrsWriter::open(&path);
            writer.add_stream(2, "depth").unwrap();
            writer.add_stream(1, "color").unwrap();
            writer.write_configuration(1, r#"{"fps":30}"#).unwrap();
            writer.write_data(1, 2.0, &[0; 10]).unwrap();
            writer.write_data(1, 1.0, &[0; 6]).unwrap();
            writer.close().unwrap();
        }

        let summary = summarize(&path).unwrap();
        assert_eq!(summary.filename, "summary.vrs");
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.streams.len(), 2);

        let color = &summary.streams[0];
        assert_eq!(color.stream_id, 1);
        assert_eq!(color.configuration.as_deref(), Some(r#"{"fps":30}"#));
        assert_eq!(color.data_records, 2);
        assert_eq!(color.payload_bytes, 16);
        assert_eq!(color.min_timestamp, Some(1.0));
        assert_eq!(color.max_timestamp, Some(2.0));

        let depth = &summary.streams[1];
        assert_eq!(depth.data_records, 0);
        assert!(depth.configuration.is_none());

        let text = summary.to_string();
        assert!(text.contains("stream 1 'color'"));
    }

    #[test]
    fn test_open_garbage_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.vrs");
        fs::write(&path, vec![0u8; 200]).unwrap();

        assert!(matches!(
            open_recording(&path),
            Err(WriterError::Format(FormatError::BadMagic { .. }))
        ));
    }
}
