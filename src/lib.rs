//! # ziptree
//!
//! Stream a git tree into a ZIP archive.
//!
//! This library walks a tree object depth-first and writes one ZIP entry per
//! file and directory it meets, straight to the output. Only the central
//! directory is held in memory; it is appended together with the trailer
//! once the walk is over, so the archive can go to a pipe.
//!
//! ## Features
//!
//! - Read objects from a repository's loose object store, or from memory
//! - Resolve hex ids, branches, tags and `HEAD` (loose and packed refs)
//! - STORED or DEFLATE entries, with fallback to STORED when DEFLATE does not help
//! - One archive-wide timestamp taken from the commit, and the commit id as comment
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use ziptree::{ArchiveOptions, LooseObjectStore, build_archive, resolve_revision};
//!
//! fn main() -> anyhow::Result<()> {
//!     let git_dir = Path::new(".git");
//!     let store = LooseObjectStore::new(git_dir)?;
//!     let id = resolve_revision(git_dir, "HEAD")?;
//!
//!     let options = ArchiveOptions { level: 6, ..Default::default() };
//!     let summary = build_archive(&store, &id, &options, std::io::stdout().lock())?;
//!     eprintln!("{} entries", summary.entries);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod store;
pub mod tree;
pub mod zip;

pub use archive::{ArchiveOptions, BuildSummary, build_archive};
pub use cli::Cli;
pub use error::EntryError;
pub use store::{LooseObjectStore, MemoryStore, Object, ObjectId, ObjectKind, ObjectStore, resolve_revision};
pub use tree::{EntryDescriptor, FileMode, TreeWalker};
pub use self::zip::{ArchiveBuilder, DosDateTime, EntryOutcome};
