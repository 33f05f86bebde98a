//! Building a record file from a JSON manifest.
//!
//! ```json
//! {
//!   "streams": [
//!     {
//!       "id": 1001,
//!       "name": "RGB Camera",
//!       "configuration": {"width": 640, "height": 480},
//!       "data": [{"timestamp": 0.0, "file": "frames/000.jpg"}]
//!     }
//!   ]
//! }
//! ```
//!
//! Data file paths are relative to the manifest's directory. Records are
//! written stream by stream in manifest order.

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::config::WriterConfig;
use crate::error::{Result, WriterError};
use crate::writer::VrsWriter;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub streams: Vec<ManifestStream>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestStream {
    pub id: u32,
    pub name: String,
    /// Any JSON value; serialized compactly into the configuration record
    #[serde(default)]
    pub configuration: Option<Value>,
    #[serde(default)]
    pub data: Vec<ManifestData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestData {
    pub timestamp: f64,
    pub file: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| WriterError::Manifest(format!("{}: {}", path.display(), e)))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| WriterError::Manifest(format!("{}: {}", path.display(), e)))
    }
}

/// Write every stream of `manifest` to `output`, returning the record count
pub fn pack(
    manifest: &Manifest,
    base_dir: &Path,
    output: &Path,
    config: WriterConfig,
) -> Result<usize> {
    let mut writer = VrsWriter::open_with_config(output, config);

    for stream in &manifest.streams {
        writer.add_stream(stream.id, &stream.name)?;
        if let Some(configuration) = &stream.configuration {
            let json = match configuration {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer.write_configuration(stream.id, &json)?;
        }
        for data in &stream.data {
            let path = base_dir.join(&data.file);
            let bytes = fs::read(&path)
                .map_err(|e| WriterError::Manifest(format!("{}: {}", path.display(), e)))?;
            writer.write_data(stream.id, data.timestamp, &bytes)?;
        }
        debug!(
            "Packed stream {} '{}' with {} data records",
            stream.id,
            stream.name,
            stream.data.len()
        );
    }

    let count = writer.record_count();
    writer.close()?;
    info!("Packed {} records into {}", count, output.display());
    Ok(count)
}
