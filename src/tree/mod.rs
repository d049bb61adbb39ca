//! Tree objects and their depth-first enumeration.
//!
//! A tree object is a sequence of `"<octal mode> <name>\0<20-byte id>"`
//! records. [`TreeWalker`] turns a root tree into a lazy stream of
//! [`EntryDescriptor`]s; subtrees are only read when the consumer asks to
//! [`descend`](TreeWalker::descend) into them.

mod peel;

pub use peel::{Peeled, parse_commit_time, peel};

use std::fmt;

use anyhow::{Result, anyhow, bail};

use crate::store::{OID_LEN, ObjectId, ObjectKind, ObjectStore};

/// Unix-style file mode as stored in a tree entry.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl FileMode {
    const TYPE_MASK: u32 = 0o170000;
    const DIR: u32 = 0o040000;
    const REGULAR: u32 = 0o100000;

    /// Mode used for the synthetic directory entry of a base prefix.
    pub const BASE_DIR: FileMode = FileMode(0o040777);

    pub fn is_dir(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::DIR
    }

    pub fn is_file(&self) -> bool {
        self.0 & Self::TYPE_MASK == Self::REGULAR
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0{:o}", self.0)
    }
}

impl fmt::Debug for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileMode({})", self)
    }
}

/// One record of a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: Vec<u8>,
    pub id: ObjectId,
}

/// Parse the body of a tree object.
pub fn parse_tree(data: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        let space = rest
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| anyhow!("Corrupt tree: missing mode terminator"))?;
        let mode = std::str::from_utf8(&rest[..space])
            .ok()
            .and_then(|s| u32::from_str_radix(s, 8).ok())
            .ok_or_else(|| anyhow!("Corrupt tree: bad mode"))?;
        rest = &rest[space + 1..];

        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow!("Corrupt tree: missing name terminator"))?;
        let name = rest[..nul].to_vec();
        rest = &rest[nul + 1..];

        if name.is_empty() {
            bail!("Corrupt tree: empty entry name");
        }
        if rest.len() < OID_LEN {
            bail!("Corrupt tree: truncated object id");
        }
        let id = ObjectId::from_slice(&rest[..OID_LEN])?;
        rest = &rest[OID_LEN..];

        entries.push(TreeEntry {
            mode: FileMode(mode),
            name,
            id,
        });
    }

    Ok(entries)
}

/// Serialize entries into a tree object body, in the order given.
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(format!("{:o} ", entry.mode.0).as_bytes());
        out.extend_from_slice(&entry.name);
        out.push(0);
        out.extend_from_slice(entry.id.as_bytes());
    }
    out
}

/// One node discovered during a walk.
///
/// `base` is the path of the containing directory, including its trailing
/// separator (empty at the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub id: ObjectId,
    pub base: Vec<u8>,
    pub name: Vec<u8>,
    pub mode: FileMode,
}

impl EntryDescriptor {
    /// Full archive path: base + name, plus a trailing `/` for directories.
    pub fn path(&self) -> Vec<u8> {
        let mut path = Vec::with_capacity(self.base.len() + self.name.len() + 1);
        path.extend_from_slice(&self.base);
        path.extend_from_slice(&self.name);
        if self.mode.is_dir() {
            path.push(b'/');
        }
        path
    }
}

struct Frame {
    base: Vec<u8>,
    entries: std::vec::IntoIter<TreeEntry>,
}

/// Lazy depth-first walk over a tree.
///
/// Entries come out in stored order. After a directory entry is yielded,
/// calling [`descend`](Self::descend) makes its children come next, before
/// the directory's following siblings. Directories that are not descended
/// into are skipped wholesale.
pub struct TreeWalker<S: ObjectStore> {
    store: S,
    stack: Vec<Frame>,
}

impl<S: ObjectStore> TreeWalker<S> {
    /// Start a walk at `root`, prefixing every path with `base`.
    pub fn new(store: S, root: &ObjectId, base: Vec<u8>) -> Result<Self> {
        let mut walker = Self {
            store,
            stack: Vec::new(),
        };
        walker.push_tree(root, base)?;
        Ok(walker)
    }

    /// Queue the children of `dir` to be yielded next.
    pub fn descend(&mut self, dir: &EntryDescriptor) -> Result<()> {
        let mut base = dir.base.clone();
        base.extend_from_slice(&dir.name);
        base.push(b'/');
        self.push_tree(&dir.id, base)
    }

    /// Next entry in depth-first order, or `None` once the walk is done.
    pub fn next_entry(&mut self) -> Option<EntryDescriptor> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame.entries.next() {
                Some(entry) => {
                    return Some(EntryDescriptor {
                        id: entry.id,
                        base: frame.base.clone(),
                        name: entry.name,
                        mode: entry.mode,
                    });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn push_tree(&mut self, id: &ObjectId, base: Vec<u8>) -> Result<()> {
        let object = self.store.read_object(id)?;
        if object.kind != ObjectKind::Tree {
            bail!("not a tree object: {}", id);
        }

        let entries = parse_tree(&object.data)?;
        self.stack.push(Frame {
            base,
            entries: entries.into_iter(),
        });
        Ok(())
    }
}
