//! # VRS Core
//!
//! Record file format for multi-stream, timestamped sensor recordings.
//!
//! This crate contains the pure encoding and decoding logic with **no
//! filesystem access**: everything is generic over [`std::io::Read`],
//! [`std::io::Write`] and [`std::io::Seek`], so the same code serves the
//! writer, the inspection tools and in-memory tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  vrs-core (no filesystem, no async)                      │
//! │  ├── codec        (little-endian primitives)             │
//! │  ├── layout       (content layout descriptors)           │
//! │  ├── record       (record kinds, formats, framing)       │
//! │  ├── file_format  (header, directory, index, footer)     │
//! │  └── reader       (RecordFileReader)                     │
//! └──────────────────────────────────────────────────────────┘
//!                          ▲
//!             ┌────────────┴────────────┐
//!             │  vrs-writer             │
//!             │  (streams, finalize,    │
//!             │   atomic file output)   │
//!             └─────────────────────────┘
//! ```
//!
//! ## Example: Describing a Data Record
//!
//! ```rust
//! use vrs_core::{ContentLayout, FieldType, FieldValue, RecordFormat, RecordType};
//!
//! let format = RecordFormat::new(
//!     RecordType::Data,
//!     1,
//!     ContentLayout::new()
//!         .with_field("timestamp", FieldType::F64)
//!         .with_trailing_block(),
//! );
//!
//! let record = format
//!     .encode(1001, 0.5, vec![FieldValue::F64(0.5)], Some(vec![1, 2, 3]))
//!     .unwrap();
//! assert_eq!(record.payload.as_deref(), Some(&[1u8, 2, 3][..]));
//! ```

pub mod codec;
pub mod error;
pub mod file_format;
pub mod layout;
pub mod reader;
pub mod record;

pub use error::FormatError;
pub use file_format::{
    FileFooter, FileHeader, HeaderFlags, IndexEntry, StreamDescriptor, FILE_VERSION, FOOTER_SIZE,
    HEADER_SIZE, INDEX_ENTRY_SIZE,
};
pub use layout::{ContentLayout, FieldSpec, FieldType, FieldValue};
pub use reader::RecordFileReader;
pub use record::{Record, RecordFormat, RecordType, RECORD_HEADER_SIZE};
