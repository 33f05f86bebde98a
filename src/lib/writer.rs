//! Writer session: open, add streams, write records, close.

use log::{debug, error, warn};
use std::path::{Path, PathBuf};

use crate::config::WriterConfig;
use crate::error::{Result, WriterError};
use crate::file_writer::RecordFileWriter;
use crate::recordable::StreamRecordable;
use crate::registry::StreamRegistry;

/// A single-shot writer session bound to one output path.
///
/// Nothing touches the filesystem until [`close`](VrsWriter::close): every
/// record is produced immediately and kept in memory, and closing writes the
/// whole file in one pass. Once closed, the session rejects every mutation
/// with [`WriterError::NotOpen`].
///
/// Dropping a session that is still open closes it. Errors from that
/// implicit close are logged and otherwise discarded; call `close` explicitly
/// to observe them.
///
/// ```rust,no_run
/// use vrs_writer::VrsWriter;
///
/// let mut writer = VrsWriter::open("/tmp/capture.vrs");
/// writer.add_stream(1001, "RGB Camera")?;
/// writer.write_configuration(1001, r#"{"width":640,"height":480}"#)?;
/// writer.write_data(1001, 0.0, &[0x01, 0x02, 0x03])?;
/// writer.close()?;
/// # Ok::<(), vrs_writer::WriterError>(())
/// ```
pub struct VrsWriter {
    path: PathBuf,
    registry: StreamRegistry,
    file_writer: RecordFileWriter,
    open: bool,
}

impl VrsWriter {
    /// Start a session with the default configuration. Performs no I/O.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::open_with_config(path, WriterConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(path: P, config: WriterConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        debug!("Opened writer session for {}", path.display());
        Self {
            path,
            registry: StreamRegistry::new(),
            file_writer: RecordFileWriter::new(config),
            open: true,
        }
    }

    /// Run `f` against a fresh session and close it afterwards, whether or
    /// not `f` succeeded. An error from `f` takes precedence over an error
    /// from closing.
    ///
    /// A failed close is reported once; the session is then abandoned and
    /// dropping it does not write again.
    pub fn scoped<P, T, E, F>(path: P, f: F) -> std::result::Result<T, E>
    where
        P: AsRef<Path>,
        E: From<WriterError>,
        F: FnOnce(&mut VrsWriter) -> std::result::Result<T, E>,
    {
        let mut writer = Self::open(path);
        let result = f(&mut writer);
        writer.end_scope(result)
    }

    fn end_scope<T, E>(&mut self, result: std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<WriterError>,
    {
        let closed = self.close();
        if closed.is_err() {
            self.abandon();
        }
        match (result, closed) {
            (Err(e), Err(close_error)) => {
                error!("Closing {} failed: {}", self.path.display(), close_error);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(close_error)) => Err(close_error.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Discard everything not yet written and leave the session closed
    fn abandon(&mut self) {
        if self.open {
            warn!(
                "Abandoning {} with {} unwritten records",
                self.path.display(),
                self.file_writer.record_count()
            );
            self.open = false;
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(WriterError::NotOpen)
        }
    }

    fn recordable_mut(&mut self, stream_id: u32) -> Result<&mut StreamRecordable> {
        self.registry
            .lookup_mut(stream_id)
            .ok_or(WriterError::UnknownStream(stream_id))
    }

    /// Register a stream. An existing stream with the same id is replaced.
    pub fn add_stream(&mut self, stream_id: u32, name: &str) -> Result<()> {
        self.ensure_open()?;
        self.registry.register(StreamRecordable::new(stream_id, name));
        Ok(())
    }

    /// Stage `json` at timestamp 0.0 and record it as a configuration record.
    ///
    /// The string is stored as given; it is not parsed.
    pub fn write_configuration(&mut self, stream_id: u32, json: &str) -> Result<()> {
        self.ensure_open()?;
        let recordable = self.recordable_mut(stream_id)?;
        recordable.stage_configuration(json, 0.0);
        let record = recordable.produce_configuration_record()?;
        self.file_writer.push(record);
        Ok(())
    }

    /// Record one data record. Timestamps are stored as given, in any order.
    pub fn write_data(&mut self, stream_id: u32, timestamp: f64, data: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let record = self
            .recordable_mut(stream_id)?
            .produce_data_record(timestamp, data)?;
        self.file_writer.push(record);
        Ok(())
    }

    /// Finalize and write the file. Closing a closed session does nothing.
    ///
    /// On failure the session stays open so the call can be retried.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.file_writer.write_to_file(&self.registry, &self.path)?;
        self.open = false;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stream_count(&self) -> usize {
        self.registry.len()
    }

    /// Records produced so far
    pub fn record_count(&self) -> usize {
        self.file_writer.record_count()
    }
}

impl Drop for VrsWriter {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.close() {
                error!("Implicit close of {} failed: {}", self.path.display(), e);
            }
        }
    }
}
