//! Building an archive from a tree-ish.

use std::io::Write;

use anyhow::Result;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::error::EntryError;
use crate::store::{ObjectId, ObjectStore};
use crate::tree::{EntryDescriptor, FileMode, Peeled, TreeWalker, peel};
use crate::zip::{ArchiveBuilder, DosDateTime, EntryOutcome};

/// Knobs for a single archive build.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// DEFLATE level 0..=9, where 0 stores every entry uncompressed.
    pub level: u32,
    /// Directory every entry is placed under, without trailing `/`.
    pub base: Option<String>,
    /// Overrides the commit time / wall clock timestamp.
    pub modified: Option<DosDateTime>,
}

/// Outcome of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    /// Entries written to the archive
    pub entries: usize,
    /// Entries dropped because of a skippable error
    pub skipped: usize,
    pub tree: ObjectId,
    pub commit: Option<ObjectId>,
}

/// Write a ZIP archive of the tree `id` refers to into `out`.
///
/// `id` may name a tree, a commit or a tag. For commits the archive is
/// stamped with the committer time and commented with the commit id;
/// bare trees get the current time and no comment.
pub fn build_archive<S, W>(
    store: &S,
    id: &ObjectId,
    options: &ArchiveOptions,
    out: W,
) -> Result<BuildSummary>
where
    S: ObjectStore,
    W: Write,
{
    let peeled = peel(store, id)?;
    let modified = options
        .modified
        .unwrap_or_else(|| archive_time(&peeled));

    let mut zip = ArchiveBuilder::new(out, options.level, modified);
    let mut skipped = 0;

    let mut base = Vec::new();
    if let Some(prefix) = options.base.as_deref().filter(|b| !b.is_empty()) {
        let root = EntryDescriptor {
            id: peeled.tree,
            base: Vec::new(),
            name: prefix.as_bytes().to_vec(),
            mode: FileMode::BASE_DIR,
        };
        if let Err(err) = zip.encode(store, &root) {
            skip_or_abort(err, &mut skipped)?;
        }

        base.extend_from_slice(prefix.as_bytes());
        base.push(b'/');
    }

    let mut walker = TreeWalker::new(store, &peeled.tree, base)?;
    while let Some(entry) = walker.next_entry() {
        match zip.encode(store, &entry) {
            Ok(EntryOutcome::Descend) => walker.descend(&entry)?,
            Ok(EntryOutcome::Written) => {}
            Err(err) => skip_or_abort(err, &mut skipped)?,
        }
    }

    let entries = zip.entries();
    zip.finalize(peeled.commit.as_ref())?;

    info!(entries, skipped, tree = %peeled.tree, "archive written");
    Ok(BuildSummary {
        entries,
        skipped,
        tree: peeled.tree,
        commit: peeled.commit,
    })
}

fn skip_or_abort(err: EntryError, skipped: &mut usize) -> Result<()> {
    if !err.is_skippable() {
        return Err(err.into());
    }
    error!("{}", err);
    *skipped += 1;
    Ok(())
}

fn archive_time(peeled: &Peeled) -> DosDateTime {
    let secs = peeled
        .commit_time
        .unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
    DosDateTime::from_timestamp_local(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ObjectKind};
    use crate::tree::{TreeEntry, encode_tree};

    fn entry(mode: u32, name: &str, id: ObjectId) -> TreeEntry {
        TreeEntry {
            mode: FileMode(mode),
            name: name.as_bytes().to_vec(),
            id,
        }
    }

    fn fixed() -> ArchiveOptions {
        ArchiveOptions {
            modified: Some(DosDateTime::EPOCH),
            ..Default::default()
        }
    }

    #[test]
    fn test_symlink_is_skipped() {
        let mut store = MemoryStore::new();
        let file = store.insert(ObjectKind::Blob, b"data".to_vec());
        let link = store.insert(ObjectKind::Blob, b"file".to_vec());
        let root = store.insert(
            ObjectKind::Tree,
            encode_tree(&[entry(0o100644, "file", file), entry(0o120000, "link", link)]),
        );

        let mut out = Vec::new();
        let summary = build_archive(&store, &root, &fixed(), &mut out).unwrap();
        assert_eq!(summary.entries, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.commit, None);
    }

    #[test]
    fn test_missing_blob_aborts() {
        let mut store = MemoryStore::new();
        let root = store.insert(
            ObjectKind::Tree,
            encode_tree(&[entry(0o100644, "gone", ObjectId::from_bytes([5; 20]))]),
        );

        let mut out = Vec::new();
        let err = build_archive(&store, &root, &fixed(), &mut out).unwrap_err();
        assert!(err.to_string().starts_with("cannot read"));
    }

    #[test]
    fn test_missing_subtree_aborts() {
        let mut store = MemoryStore::new();
        let root = store.insert(
            ObjectKind::Tree,
            encode_tree(&[entry(0o40000, "dir", ObjectId::from_bytes([6; 20]))]),
        );

        let mut out = Vec::new();
        assert!(build_archive(&store, &root, &fixed(), &mut out).is_err());
    }

    #[test]
    fn test_base_prefix() {
        let mut store = MemoryStore::new();
        let file = store.insert(ObjectKind::Blob, b"x".to_vec());
        let root = store.insert(ObjectKind::Tree, encode_tree(&[entry(0o100644, "f", file)]));

        let options = ArchiveOptions {
            base: Some("pkg".into()),
            ..fixed()
        };
        let mut out = Vec::new();
        let summary = build_archive(&store, &root, &options, &mut out).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(&out[30..34], b"pkg/");
    }

    #[test]
    fn test_commit_time_and_comment() {
        let mut store = MemoryStore::new();
        let tree = store.insert(ObjectKind::Tree, Vec::new());
        let commit = store.insert(
            ObjectKind::Commit,
            format!(
                "tree {}\ncommitter C <c@example.com> 1234567890 +0000\n\nmsg\n",
                tree
            ),
        );

        let mut out = Vec::new();
        let options = ArchiveOptions::default();
        let summary = build_archive(&store, &commit, &options, &mut out).unwrap();
        assert_eq!(summary.commit, Some(commit));
        assert_eq!(summary.entries, 0);
        assert!(out.ends_with(commit.to_hex().as_bytes()));
    }
}
