use std::fs;

use tempfile::tempdir;
use vrs_core::{FieldType, FieldValue, RecordType};
use vrs_writer::{inspect::open_recording, VrsWriter, WriterError};

#[test]
fn test_camera_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.vrs");

    let mut writer = VrsWriter::open(&path);
    assert!(!path.exists());
    writer.add_stream(1001, "RGB Camera").unwrap();
    writer
        .write_configuration(1001, r#"{"width":640,"height":480}"#)
        .unwrap();
    writer.write_data(1001, 0.0, &[0x01, 0x02, 0x03]).unwrap();
    writer.close().unwrap();
    assert!(path.exists());

    let mut reader = open_recording(&path).unwrap();
    assert_eq!(reader.stream_ids(), vec![1001]);
    assert_eq!(reader.stream(1001).unwrap().name, "RGB Camera");

    let records = reader.records().unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].record_type, RecordType::Configuration);
    assert_eq!(records[0].text(), Some(r#"{"width":640,"height":480}"#));

    assert_eq!(records[1].record_type, RecordType::Data);
    assert_eq!(records[1].timestamp, 0.0);
    assert_eq!(records[1].payload, Some(vec![0x01, 0x02, 0x03]));
}

#[test]
fn test_directory_declares_layouts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layouts.vrs");
    VrsWriter::scoped(&path, |w| w.add_stream(7, "imu")).unwrap();

    let reader = open_recording(&path).unwrap();
    let stream = reader.stream(7).unwrap();

    let config = stream.format(RecordType::Configuration, 1).unwrap();
    assert_eq!(config.layout.fields()[0].name, "config_json");
    assert_eq!(config.layout.fields()[0].field_type, FieldType::String);
    assert!(!config.layout.has_trailing_block());

    let data = stream.format(RecordType::Data, 1).unwrap();
    assert_eq!(data.layout.fields()[0].name, "timestamp");
    assert_eq!(data.layout.fields()[0].field_type, FieldType::F64);
    assert!(data.layout.has_trailing_block());
}

#[test]
fn test_records_keep_call_order_across_streams() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("order.vrs");

    let mut writer = VrsWriter::open(&path);
    writer.add_stream(1, "color").unwrap();
    writer.add_stream(2, "depth").unwrap();
    writer.write_data(2, 0.2, &[2]).unwrap();
    writer.write_data(1, 0.1, &[1]).unwrap();
    writer.write_configuration(2, "{}").unwrap();
    writer.write_data(1, 0.05, &[3]).unwrap();
    writer.close().unwrap();

    let mut reader = open_recording(&path).unwrap();
    let seen: Vec<(u32, RecordType, f64)> = reader
        .records()
        .unwrap()
        .iter()
        .map(|r| (r.stream_id, r.record_type, r.timestamp))
        .collect();
    assert_eq!(
        seen,
        vec![
            (2, RecordType::Data, 0.2),
            (1, RecordType::Data, 0.1),
            (2, RecordType::Configuration, 0.0),
            (1, RecordType::Data, 0.05),
        ]
    );
}

#[test]
fn test_zero_length_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty-data.vrs");
    VrsWriter::scoped(&path, |w| {
        w.add_stream(1, "s")?;
        w.write_data(1, 1.5, &[])
    })
    .unwrap();

    let mut reader = open_recording(&path).unwrap();
    let data = reader.data_records(1).unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].payload, Some(Vec::new()));
    assert_eq!(data[0].fields, vec![FieldValue::F64(1.5)]);
}

#[test]
fn test_empty_configuration_is_recorded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty-config.vrs");
    VrsWriter::scoped(&path, |w| {
        w.add_stream(1, "s")?;
        w.write_configuration(1, "")
    })
    .unwrap();

    let mut reader = open_recording(&path).unwrap();
    assert_eq!(reader.record_count(), 1);
    assert_eq!(reader.configuration(1).unwrap().as_deref(), Some(""));
}

#[test]
fn test_drop_finalizes_open_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dropped.vrs");
    {
        let mut writer = VrsWriter::open(&path);
        writer.add_stream(1001, "Test").unwrap();
        writer.write_data(1001, 0.0, &[9]).unwrap();
    }

    assert!(fs::metadata(&path).unwrap().len() > 0);
    let mut reader = open_recording(&path).unwrap();
    assert_eq!(reader.data_records(1001).unwrap().len(), 1);
}

#[test]
fn test_drop_swallows_write_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("dropped.vrs");

    let mut writer = VrsWriter::open(&path);
    writer.add_stream(1, "s").unwrap();
    // explicit close reports the failure
    assert!(matches!(
        writer.close(),
        Err(WriterError::WriteFailed { .. })
    ));
    // implicit close on drop does not
    drop(writer);
    assert!(!path.exists());
}

#[test]
fn test_scoped_reports_close_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("scoped.vrs");

    let result = VrsWriter::scoped(&path, |w| w.add_stream(1, "s"));
    assert!(matches!(result, Err(WriterError::WriteFailed { .. })));
}
