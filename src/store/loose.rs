use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use super::{Object, ObjectId, ObjectKind, ObjectStore};

/// Loose object store rooted at a git directory.
///
/// Each object lives in `objects/<first two hex digits>/<remaining 38>` as a
/// zlib stream of `"<kind> <len>\0"` followed by the content. Packfiles are
/// not read, so an object that only exists packed is reported as missing.
pub struct LooseObjectStore {
    git_dir: PathBuf,
}

impl LooseObjectStore {
    pub fn new(git_dir: &Path) -> Result<Self> {
        let objects = git_dir.join("objects");
        if !objects.is_dir() {
            bail!("Not a git repository: {}", git_dir.display());
        }
        Ok(Self {
            git_dir: git_dir.to_path_buf(),
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.git_dir
            .join("objects")
            .join(&hex[..2])
            .join(&hex[2..])
    }

    /// Write an object in loose format and return its id.
    ///
    /// Existing objects are left untouched.
    pub fn write_object(&self, kind: ObjectKind, data: &[u8]) -> Result<ObjectId> {
        let id = ObjectId::hash_object(kind, data);
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        write!(encoder, "{} {}\0", kind, data.len())?;
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        fs::write(&path, compressed)
            .with_context(|| format!("Failed to write object {}", path.display()))?;
        Ok(id)
    }
}

impl ObjectStore for LooseObjectStore {
    fn read_object(&self, id: &ObjectId) -> Result<Object> {
        let path = self.object_path(id);
        let file = fs::File::open(&path).with_context(|| format!("cannot read {}", id))?;

        let mut raw = Vec::new();
        ZlibDecoder::new(file)
            .read_to_end(&mut raw)
            .with_context(|| format!("Corrupt loose object {}", id))?;

        parse_loose(id, raw)
    }
}

/// Split a decompressed loose object into its header and content.
fn parse_loose(id: &ObjectId, mut raw: Vec<u8>) -> Result<Object> {
    let nul = raw
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| anyhow!("Corrupt loose object {}: missing header", id))?;

    let header = std::str::from_utf8(&raw[..nul])
        .map_err(|_| anyhow!("Corrupt loose object {}: bad header", id))?;
    let (kind, len) = header
        .split_once(' ')
        .ok_or_else(|| anyhow!("Corrupt loose object {}: bad header", id))?;

    let kind: ObjectKind = kind.parse()?;
    let len: usize = len
        .parse()
        .map_err(|_| anyhow!("Corrupt loose object {}: bad length", id))?;

    let data = raw.split_off(nul + 1);
    if data.len() != len {
        bail!(
            "Corrupt loose object {}: expected {} bytes, found {}",
            id,
            len,
            data.len()
        );
    }

    Ok(Object { kind, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty_repo() -> (TempDir, LooseObjectStore) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("objects")).unwrap();
        let store = LooseObjectStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, store) = empty_repo();
        let id = store.write_object(ObjectKind::Blob, b"hello\n").unwrap();
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

        let obj = store.read_object(&id).unwrap();
        assert_eq!(obj.kind, ObjectKind::Blob);
        assert_eq!(obj.data, b"hello\n");
    }

    #[test]
    fn test_object_layout() {
        let (dir, store) = empty_repo();
        let id = store.write_object(ObjectKind::Blob, b"").unwrap();
        assert!(
            dir.path()
                .join("objects/e6/9de29bb2d1d6434b8b29ae775ad8c2e48c5391")
                .is_file()
        );
        assert!(store.read_object(&id).unwrap().data.is_empty());
    }

    #[test]
    fn test_missing_object_is_error() {
        let (_dir, store) = empty_repo();
        let id = ObjectId::from_bytes([0xab; 20]);
        assert!(store.read_object(&id).is_err());
    }

    #[test]
    fn test_rejects_non_repository() {
        let dir = TempDir::new().unwrap();
        assert!(LooseObjectStore::new(dir.path()).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let id = ObjectId::from_bytes([1; 20]);
        let err = parse_loose(&id, b"blob 10\0short".to_vec()).unwrap_err();
        assert!(err.to_string().contains("expected 10 bytes"));
    }
}
