//! # VRS Writer
//!
//! Writes multi-stream, timestamped record files: each stream declares how
//! its configuration and data records are laid out, emits a configuration
//! blob, then any number of timestamped binary payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       vrs-writer                          │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │ VrsWriter (session: open → write → close)           │  │
//! │  └──────────────┬──────────────────────────┬───────────┘  │
//! │                 ▼                          ▼              │
//! │  ┌──────────────────────────┐  ┌────────────────────────┐ │
//! │  │ StreamRegistry           │  │ RecordFileWriter       │ │
//! │  │  id → StreamRecordable   │  │  records in call order │ │
//! │  │  (formats + staged cfg)  │  │  single finalize pass  │ │
//! │  └──────────────────────────┘  └────────────────────────┘ │
//! └───────────────────────────────────────────────────────────┘
//!                             │
//!                             ▼
//!                  vrs-core (file format, reader)
//! ```
//!
//! ## Key Components
//!
//! - [`VrsWriter`] - Session object and lifecycle
//! - [`registry::StreamRegistry`] - Streams by id, last registration wins
//! - [`recordable::StreamRecordable`] - Record formats and staged configuration
//! - [`file_writer::RecordFileWriter`] - Accumulation and atomic finalize
//! - [`inspect`] - Reading files back and summarizing them
//! - [`pack`] - Building files from a JSON manifest
//!
//! ## Example
//!
//! ```rust,no_run
//! use vrs_writer::{inspect, VrsWriter};
//!
//! VrsWriter::scoped("/tmp/capture.vrs", |writer| {
//!     writer.add_stream(1001, "RGB Camera")?;
//!     writer.write_configuration(1001, r#"{"width":640,"height":480}"#)?;
//!     writer.write_data(1001, 0.0, &[0x01, 0x02, 0x03])
//! })?;
//!
//! let mut reader = inspect::open_recording(std::path::Path::new("/tmp/capture.vrs"))?;
//! assert_eq!(reader.stream_ids(), vec![1001]);
//! # Ok::<(), vrs_writer::WriterError>(())
//! ```

pub mod config;
pub mod error;
pub mod file_writer;
pub mod inspect;
pub mod pack;
pub mod recordable;
pub mod registry;
pub mod writer;

pub use config::WriterConfig;
pub use error::WriterError;
pub use writer::VrsWriter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
