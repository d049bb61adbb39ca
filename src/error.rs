use thiserror::Error;

use crate::store::ObjectId;
use crate::tree::FileMode;

/// Why an entry could not be added to the archive.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("path too long ({len} chars, SHA1: {id}): {path}")]
    PathTooLong { len: usize, id: ObjectId, path: String },

    #[error("unsupported file mode: {mode} (SHA1: {id})")]
    UnsupportedMode { mode: FileMode, id: ObjectId },

    #[error("cannot read {id}")]
    MissingObject {
        id: ObjectId,
        #[source]
        source: anyhow::Error,
    },

    #[error("{what} does not fit in a ZIP32 archive")]
    Zip32Overflow { what: &'static str },

    #[error("IO exception: {0}")]
    Io(#[from] std::io::Error),
}

impl EntryError {
    /// Skippable errors drop the entry and let the build continue; all
    /// others abort the whole archive.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            EntryError::PathTooLong { .. } | EntryError::UnsupportedMode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EntryError>;
