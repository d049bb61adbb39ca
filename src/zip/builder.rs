//! Streaming ZIP archive builder.
//!
//! Entries are written to the output as soon as they are encoded; only the
//! central directory is kept in memory until [`ArchiveBuilder::finalize`].
//!
//! ## Layout
//!
//! ```text
//! [LFH + name + data] [LFH + name + data] ... [CDFH + name]... [EOCD + comment]
//! ```
//!
//! Every local header is immediately followed by its payload, so no data
//! descriptors are needed and sizes are known up front.

use std::io::Write;

use tracing::debug;

use crate::error::{EntryError, Result};
use crate::store::{ObjectId, ObjectStore};
use crate::tree::{EntryDescriptor, FileMode};

use super::compress;
use super::structures::*;

/// The central directory buffer grows in steps of this many bytes.
pub const DIRECTORY_GROWTH: usize = 1024 * 1024;

/// What the caller should do after an entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// A directory: walk into it next.
    Descend,
    /// A regular file: nothing more to do.
    Written,
}

/// Builds one ZIP archive on top of a byte sink.
///
/// The builder owns both cursors of the format: the byte offset into the
/// output stream and the in-memory central directory with its entry count.
/// A failed entry leaves both untouched.
pub struct ArchiveBuilder<W: Write> {
    /// Destination of local headers, payloads and finally the directory
    out: W,
    /// Compression level, 0 disables DEFLATE
    level: u32,
    /// Timestamp stamped on every entry
    modified: DosDateTime,
    /// Bytes written to `out` so far
    offset: u64,
    /// Central directory records, one per written entry
    directory: Vec<u8>,
    /// Number of records in `directory`
    entries: usize,
}

impl<W: Write> ArchiveBuilder<W> {
    pub fn new(out: W, level: u32, modified: DosDateTime) -> Self {
        Self {
            out,
            level,
            modified,
            offset: 0,
            directory: Vec::with_capacity(DIRECTORY_GROWTH),
            entries: 0,
        }
    }

    /// Bytes written to the output so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of entries recorded in the central directory.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn directory_len(&self) -> usize {
        self.directory.len()
    }

    pub fn directory_capacity(&self) -> usize {
        self.directory.capacity()
    }

    /// Encode one walked tree entry.
    pub fn encode<S: ObjectStore>(
        &mut self,
        store: &S,
        entry: &EntryDescriptor,
    ) -> Result<EntryOutcome> {
        self.add_entry(store, &entry.id, &entry.path(), entry.mode)
    }

    /// Encode an entry at `path`, fetching file content from `store`.
    ///
    /// Directories carry no data and report [`EntryOutcome::Descend`].
    /// Regular files are read, checksummed and, when a level is set and it
    /// pays off, deflated. Any other mode is rejected.
    pub fn add_entry<S: ObjectStore>(
        &mut self,
        store: &S,
        id: &ObjectId,
        path: &[u8],
        mode: FileMode,
    ) -> Result<EntryOutcome> {
        if path.len() > u16::MAX as usize {
            return Err(EntryError::PathTooLong {
                len: path.len(),
                id: *id,
                path: String::from_utf8_lossy(path).into_owned(),
            });
        }

        let (outcome, content) = if mode.is_dir() {
            (EntryOutcome::Descend, Vec::new())
        } else if mode.is_file() {
            let object = store
                .read_object(id)
                .map_err(|source| EntryError::MissingObject { id: *id, source })?;
            (EntryOutcome::Written, object.data)
        } else {
            return Err(EntryError::UnsupportedMode { mode, id: *id });
        };

        let uncompressed_size = u32::try_from(content.len())
            .map_err(|_| EntryError::Zip32Overflow { what: "entry size" })?;
        let local_header_offset = u32::try_from(self.offset)
            .map_err(|_| EntryError::Zip32Overflow { what: "local header offset" })?;

        let crc32 = crc32fast::hash(&content);
        let (method, payload) = if mode.is_dir() {
            (CompressionMethod::Stored, content)
        } else {
            self.compress(content)
        };

        let header = FileHeader {
            method,
            modified: self.modified,
            crc32,
            compressed_size: payload.len() as u32,
            uncompressed_size,
            file_name_length: path.len() as u16,
        };

        self.append_directory_record(&header, local_header_offset, path)?;

        let mut local = Vec::with_capacity(LFH_SIZE);
        header.write_local(&mut local)?;
        self.emit(&local)?;
        self.emit(path)?;
        if header.compressed_size > 0 {
            self.emit(&payload)?;
        }

        debug!(
            path = %String::from_utf8_lossy(path),
            method = ?method,
            size = uncompressed_size,
            compressed = header.compressed_size,
            "added entry"
        );

        Ok(outcome)
    }

    /// Write the central directory and trailer, returning the output.
    ///
    /// When `digest` is given its hex form becomes the archive comment.
    pub fn finalize(mut self, digest: Option<&ObjectId>) -> Result<W> {
        let entries = u16::try_from(self.entries)
            .map_err(|_| EntryError::Zip32Overflow { what: "entry count" })?;
        let cd_size = u32::try_from(self.directory.len())
            .map_err(|_| EntryError::Zip32Overflow { what: "central directory size" })?;
        let cd_offset = u32::try_from(self.offset)
            .map_err(|_| EntryError::Zip32Overflow { what: "central directory offset" })?;

        let comment = digest.map(|id| id.to_hex()).unwrap_or_default();
        let trailer =
            EndOfCentralDirectory::single_disk(entries, cd_size, cd_offset, comment.len() as u16);

        let directory = std::mem::take(&mut self.directory);
        self.emit(&directory)?;

        let mut eocd = Vec::with_capacity(EndOfCentralDirectory::SIZE);
        trailer.write_to(&mut eocd)?;
        self.emit(&eocd)?;
        if !comment.is_empty() {
            self.emit(comment.as_bytes())?;
        }

        self.out.flush()?;
        Ok(self.out)
    }

    /// Deflate `data` if enabled and worthwhile, otherwise store it.
    ///
    /// The raw deflate stream must come out strictly smaller than the
    /// input; the zlib framing is not counted against it.
    fn compress(&self, data: Vec<u8>) -> (CompressionMethod, Vec<u8>) {
        if self.level == 0 {
            return (CompressionMethod::Stored, data);
        }

        match compress::deflate(&data, self.level) {
            Some(deflated) if deflated.len() < data.len() => (CompressionMethod::Deflate, deflated),
            _ => (CompressionMethod::Stored, data),
        }
    }

    fn append_directory_record(
        &mut self,
        header: &FileHeader,
        local_header_offset: u32,
        path: &[u8],
    ) -> Result<()> {
        self.reserve_directory(CDFH_MIN_SIZE + path.len());

        header.write_central(&mut self.directory, local_header_offset)?;
        self.directory.extend_from_slice(path);
        self.entries += 1;
        Ok(())
    }

    /// Grow the directory buffer in whole [`DIRECTORY_GROWTH`] steps until
    /// `record_len` more bytes fit.
    fn reserve_directory(&mut self, record_len: usize) {
        let needed = self.directory.len() + record_len;
        let mut target = self.directory.capacity();
        if target >= needed {
            return;
        }
        while target < needed {
            target += DIRECTORY_GROWTH;
        }
        self.directory.reserve_exact(target - self.directory.len());
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }
}
