//! Per-stream record production.
//!
//! A [`StreamRecordable`] owns one stream's identity, its record formats and
//! the configuration staged for the next configuration record. The formats
//! form a table keyed by record type; producing a record is a lookup in that
//! table followed by [`RecordFormat::encode`].

use vrs_core::{
    ContentLayout, FieldType, FieldValue, FormatError, Record, RecordFormat, RecordType,
    StreamDescriptor,
};

use crate::error::Result;

pub const CONFIGURATION_FORMAT_VERSION: u32 = 1;
pub const DATA_FORMAT_VERSION: u32 = 1;
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Configuration records carry a single JSON string
pub fn configuration_layout() -> ContentLayout {
    ContentLayout::new().with_field("config_json", FieldType::String)
}

/// Data records carry their timestamp followed by the raw payload
pub fn data_layout() -> ContentLayout {
    ContentLayout::new()
        .with_field("timestamp", FieldType::F64)
        .with_trailing_block()
}

/// State records are empty
pub fn state_layout() -> ContentLayout {
    ContentLayout::new()
}

/// Configuration waiting to be turned into a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedConfiguration {
    pub json: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct StreamRecordable {
    stream_id: u32,
    name: String,
    formats: Vec<RecordFormat>,
    staged: StagedConfiguration,
}

impl StreamRecordable {
    pub fn new(stream_id: u32, name: &str) -> Self {
        Self {
            stream_id,
            name: name.to_string(),
            formats: vec![
                RecordFormat::new(
                    RecordType::Configuration,
                    CONFIGURATION_FORMAT_VERSION,
                    configuration_layout(),
                ),
                RecordFormat::new(RecordType::Data, DATA_FORMAT_VERSION, data_layout()),
                RecordFormat::new(RecordType::State, STATE_FORMAT_VERSION, state_layout()),
            ],
            staged: StagedConfiguration::default(),
        }
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formats(&self) -> &[RecordFormat] {
        &self.formats
    }

    pub fn format(&self, record_type: RecordType) -> Result<&RecordFormat> {
        self.formats
            .iter()
            .find(|f| f.record_type == record_type)
            .ok_or_else(|| {
                FormatError::MissingFormat {
                    stream_id: self.stream_id,
                    record_type,
                    format_version: 0,
                }
                .into()
            })
    }

    /// Directory entry declaring this stream and its formats
    pub fn descriptor(&self) -> StreamDescriptor {
        StreamDescriptor {
            stream_id: self.stream_id,
            name: self.name.clone(),
            formats: self.formats.clone(),
        }
    }

    /// Replace the staged configuration; the previous one is discarded
    pub fn stage_configuration(&mut self, json: &str, timestamp: f64) {
        self.staged = StagedConfiguration {
            json: json.to_string(),
            timestamp,
        };
    }

    pub fn staged(&self) -> &StagedConfiguration {
        &self.staged
    }

    /// Build a configuration record from the staged configuration.
    ///
    /// With nothing staged the record is still produced: an empty
    /// `config_json` at timestamp 0.0. The staged value stays in place, so
    /// producing twice yields the same record.
    pub fn produce_configuration_record(&self) -> Result<Record> {
        let format = self.format(RecordType::Configuration)?;
        let (json, timestamp) = if self.staged.json.is_empty() {
            (String::new(), 0.0)
        } else {
            (self.staged.json.clone(), self.staged.timestamp)
        };
        Ok(format.encode(
            self.stream_id,
            timestamp,
            vec![FieldValue::String(json)],
            None,
        )?)
    }

    pub fn produce_data_record(&self, timestamp: f64, data: &[u8]) -> Result<Record> {
        let format = self.format(RecordType::Data)?;
        Ok(format.encode(
            self.stream_id,
            timestamp,
            vec![FieldValue::F64(timestamp)],
            Some(data.to_vec()),
        )?)
    }

    /// Always an empty state record at timestamp 0.0
    pub fn produce_state_record(&self) -> Result<Record> {
        let format = self.format(RecordType::State)?;
        Ok(format.encode(self.stream_id, 0.0, Vec::new(), None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_are_bound_at_construction() {
        let recordable = StreamRecordable::new(1001, "RGB Camera");
        let descriptor = recordable.descriptor();

        assert_eq!(descriptor.stream_id, 1001);
        assert_eq!(descriptor.name, "RGB Camera");
        assert_eq!(descriptor.formats.len(), 3);
        assert_eq!(
            descriptor.format(RecordType::Data, 1).unwrap().layout,
            data_layout()
        );
    }

    #[test]
    fn test_staging_is_last_write_wins() {
        let mut recordable = StreamRecordable::new(1, "cam");
        recordable.stage_configuration(r#"{"a":1}"#, 1.0);
        recordable.stage_configuration(r#"{"b":2}"#, 2.0);

        let record = recordable.produce_configuration_record().unwrap();
        assert_eq!(record.record_type, RecordType::Configuration);
        assert_eq!(record.text(), Some(r#"{"b":2}"#));
        assert_eq!(record.timestamp, 2.0);
        // production leaves the staged value in place
        assert_eq!(recordable.staged().json, r#"{"b":2}"#);
        assert_eq!(recordable.staged().timestamp, 2.0);
    }

    #[test]
    fn test_empty_configuration_still_produces_record() {
        let mut recordable = StreamRecordable::new(1, "cam");
        recordable.stage_configuration("", 5.0);

        let record = recordable.produce_configuration_record().unwrap();
        assert_eq!(record.fields, vec![FieldValue::String(String::new())]);
        assert_eq!(record.timestamp, 0.0);
        assert!(record.payload.is_none());
    }

    #[test]
    fn test_data_record_carries_timestamp_and_payload() {
        let recordable = StreamRecordable::new(7, "imu");
        let record = recordable.produce_data_record(3.25, &[1, 2, 3]).unwrap();

        assert_eq!(record.stream_id, 7);
        assert_eq!(record.record_type, RecordType::Data);
        assert_eq!(record.format_version, DATA_FORMAT_VERSION);
        assert_eq!(record.fields, vec![FieldValue::F64(3.25)]);
        assert_eq!(record.payload, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_zero_length_data() {
        let recordable = StreamRecordable::new(7, "imu");
        let record = recordable.produce_data_record(0.0, &[]).unwrap();
        assert_eq!(record.payload, Some(Vec::new()));
    }

    #[test]
    fn test_state_record_is_empty() {
        let recordable = StreamRecordable::new(7, "imu");
        let record = recordable.produce_state_record().unwrap();
        assert_eq!(record.record_type, RecordType::State);
        assert!(record.fields.is_empty());
        assert_eq!(record.timestamp, 0.0);
    }
}
