//! Content-addressable object storage.
//!
//! Objects are looked up by their [`ObjectId`], the SHA-1 of a
//! `"<kind> <len>\0"` header followed by the raw object bytes. The archive
//! builder only needs [`ObjectStore::read_object`]; everything else here is
//! plumbing for the two implementations:
//!
//! - [`LooseObjectStore`]: zlib-compressed loose objects under `objects/`
//! - [`MemoryStore`]: an in-process map, handy for tests and embedding

mod loose;
mod memory;
mod refs;

pub use loose::LooseObjectStore;
pub use memory::MemoryStore;
pub use refs::resolve_revision;

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use sha1::{Digest, Sha1};

/// Length of a raw object id in bytes.
pub const OID_LEN: usize = 20;

/// Length of a hex-formatted object id.
pub const OID_HEX_LEN: usize = OID_LEN * 2;

/// A 20-byte SHA-1 object id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_LEN]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; OID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an id from a slice, which must be exactly [`OID_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; OID_LEN] = bytes
            .try_into()
            .map_err(|_| anyhow!("Invalid object id length: {}", bytes.len()))?;
        Ok(Self(raw))
    }

    /// Hash `data` the way git names objects of the given kind.
    pub fn hash_object(kind: ObjectKind, data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(data.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(data);

        let mut raw = [0u8; OID_LEN];
        raw.copy_from_slice(&hasher.finalize());
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Lowercase hex form, always [`OID_HEX_LEN`] characters.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self)
    }
}

impl FromStr for ObjectId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != OID_HEX_LEN || !s.is_ascii() {
            bail!("Invalid object id: {}", s);
        }

        let mut raw = [0u8; OID_LEN];
        for (i, byte) in raw.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| anyhow!("Invalid object id: {}", s))?;
        }
        Ok(Self(raw))
    }
}

/// The type tag stored in an object's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            "tag" => Ok(ObjectKind::Tag),
            _ => bail!("Unknown object type: {}", s),
        }
    }
}

/// A resolved object: its advisory type tag and raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

/// Lookup of object content by id.
///
/// A failed lookup means the store is missing data it was told about, so
/// callers treat every error from here as fatal.
pub trait ObjectStore {
    fn read_object(&self, id: &ObjectId) -> Result<Object>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn read_object(&self, id: &ObjectId) -> Result<Object> {
        (**self).read_object(id)
    }
}
