use std::fs;
use std::path::Path;

use anyhow::{Result, bail};

use super::{OID_HEX_LEN, ObjectId};

/// Symbolic refs deeper than this are treated as a loop.
const MAX_SYMREF_DEPTH: usize = 5;

/// Resolve a revision name to an object id.
///
/// Accepts a full 40-digit hex id or a ref name. Ref names are tried as
/// `<name>`, `refs/<name>`, `refs/tags/<name>` and `refs/heads/<name>`,
/// first as loose ref files and then in `packed-refs`.
pub fn resolve_revision(git_dir: &Path, name: &str) -> Result<ObjectId> {
    if name.len() == OID_HEX_LEN {
        if let Ok(id) = name.parse() {
            return Ok(id);
        }
    }

    let candidates = [
        name.to_string(),
        format!("refs/{}", name),
        format!("refs/tags/{}", name),
        format!("refs/heads/{}", name),
    ];

    for candidate in &candidates {
        if let Some(id) = read_ref(git_dir, candidate, 0)? {
            return Ok(id);
        }
    }

    bail!("Not a valid object name {}", name)
}

fn read_ref(git_dir: &Path, refname: &str, depth: usize) -> Result<Option<ObjectId>> {
    if depth > MAX_SYMREF_DEPTH {
        bail!("Symbolic ref loop at {}", refname);
    }
    // Never let a ref name escape the git directory.
    if refname.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Ok(None);
    }

    let path = git_dir.join(refname);
    if path.is_file() {
        let contents = fs::read_to_string(&path)?;
        let contents = contents.trim();

        if let Some(target) = contents.strip_prefix("ref:") {
            return read_ref(git_dir, target.trim(), depth + 1);
        }
        return Ok(contents.parse().ok());
    }

    lookup_packed_ref(git_dir, refname)
}

/// Look `refname` up in `packed-refs`, skipping comments and peeled lines.
fn lookup_packed_ref(git_dir: &Path, refname: &str) -> Result<Option<ObjectId>> {
    let path = git_dir.join("packed-refs");
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)?;
    for line in contents.lines() {
        if line.starts_with('#') || line.starts_with('^') {
            continue;
        }
        if let Some((hex, name)) = line.split_once(' ') {
            if name == refname {
                return Ok(hex.parse().ok());
            }
        }
    }

    Ok(None)
}
