//! ZIP archive writing.
//!
//! This module turns a stream of entries into a single ZIP archive without
//! seeking: local headers and payloads go out as they are produced, the
//! central directory is collected in memory and appended at the end.
//!
//! ## Architecture
//!
//! - [`structures`]: On-disk records (local header, central directory header, EOCD)
//! - [`compress`]: One-shot DEFLATE with the zlib framing stripped
//! - [`builder`]: The [`ArchiveBuilder`] that ties both together
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and data for each entry
//! 2. Central Directory with metadata for all entries
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 2.0 records)
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No ZIP64: sizes and offsets must fit in 32 bits, at most 65535 entries
//! - No multi-disk archive support
//! - No extra fields, UTF-8 flag or per-entry comments

pub mod builder;
pub mod compress;
pub mod structures;

pub use builder::{ArchiveBuilder, DIRECTORY_GROWTH, EntryOutcome};
pub use structures::*;
