use anyhow::{Result, anyhow, bail};

use crate::store::{ObjectId, ObjectKind, ObjectStore};

/// Tags nested deeper than this are rejected.
const MAX_TAG_DEPTH: usize = 16;

/// The tree an object name refers to, plus the commit it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peeled {
    pub tree: ObjectId,
    pub commit: Option<ObjectId>,
    /// Committer timestamp in seconds since the epoch.
    pub commit_time: Option<i64>,
}

/// Follow tags and commits from `id` down to a tree.
pub fn peel<S: ObjectStore>(store: &S, id: &ObjectId) -> Result<Peeled> {
    let mut current = *id;

    for _ in 0..MAX_TAG_DEPTH {
        let object = store.read_object(&current)?;
        match object.kind {
            ObjectKind::Tree => {
                return Ok(Peeled {
                    tree: current,
                    commit: None,
                    commit_time: None,
                });
            }
            ObjectKind::Commit => {
                let tree = header_id(&object.data, "tree")?
                    .ok_or_else(|| anyhow!("Corrupt commit {}: no tree", current))?;
                return Ok(Peeled {
                    tree,
                    commit: Some(current),
                    commit_time: parse_commit_time(&object.data),
                });
            }
            ObjectKind::Tag => {
                current = header_id(&object.data, "object")?
                    .ok_or_else(|| anyhow!("Corrupt tag {}: no target", current))?;
            }
            ObjectKind::Blob => bail!("not a tree object"),
        }
    }

    bail!("Tag chain too deep at {}", id)
}

/// Committer timestamp of a commit body.
pub fn parse_commit_time(data: &[u8]) -> Option<i64> {
    let line = headers(data).find_map(|line| line.strip_prefix(b"committer ".as_slice()))?;
    let after_email = line.iter().rposition(|&b| b == b'>')? + 1;

    let rest = std::str::from_utf8(&line[after_email..]).ok()?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Header lines of a commit or tag, up to the first blank line.
fn headers(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|&b| b == b'\n').take_while(|line| !line.is_empty())
}

fn header_id(data: &[u8], key: &str) -> Result<Option<ObjectId>> {
    for line in headers(data) {
        if let Some(value) = line
            .strip_prefix(key.as_bytes())
            .and_then(|rest| rest.strip_prefix(b" ".as_slice()))
        {
            let hex = std::str::from_utf8(value).map_err(|_| anyhow!("Corrupt {} header", key))?;
            return Ok(Some(hex.trim().parse()?));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn commit_body(tree: &ObjectId) -> String {
        format!(
            "tree {}\n\
             author A U Thor <author@example.com> 1100000000 +0000\n\
             committer C O Mitter <committer@example.com> 1234567890 -0700\n\
             \n\
             message\n",
            tree
        )
    }

    #[test]
    fn test_commit_time() {
        let tree = ObjectId::from_bytes([3; 20]);
        assert_eq!(parse_commit_time(commit_body(&tree).as_bytes()), Some(1234567890));
        assert_eq!(parse_commit_time(b"tree abc\n"), None);
    }

    #[test]
    fn test_commit_time_ignores_message() {
        let body = b"tree x\n\ncommitter fake <x> 42 +0000\n";
        assert_eq!(parse_commit_time(body), None);
    }

    #[test]
    fn test_peel_tree() {
        let mut store = MemoryStore::new();
        let tree = store.insert(ObjectKind::Tree, Vec::new());

        let peeled = peel(&store, &tree).unwrap();
        assert_eq!(peeled.tree, tree);
        assert_eq!(peeled.commit, None);
        assert_eq!(peeled.commit_time, None);
    }

    #[test]
    fn test_peel_tag_to_commit() {
        let mut store = MemoryStore::new();
        let tree = store.insert(ObjectKind::Tree, Vec::new());
        let commit = store.insert(ObjectKind::Commit, commit_body(&tree));
        let tag = store.insert(
            ObjectKind::Tag,
            format!("object {}\ntype commit\ntag v1\n\nrelease\n", commit),
        );

        let peeled = peel(&store, &tag).unwrap();
        assert_eq!(peeled.tree, tree);
        assert_eq!(peeled.commit, Some(commit));
        assert_eq!(peeled.commit_time, Some(1234567890));
    }

    #[test]
    fn test_peel_blob_fails() {
        let mut store = MemoryStore::new();
        let blob = store.insert(ObjectKind::Blob, b"data".to_vec());
        let err = peel(&store, &blob).unwrap_err();
        assert_eq!(err.to_string(), "not a tree object");
    }
}
