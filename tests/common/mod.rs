#![allow(dead_code)]

use std::io::{Cursor, Read};

use ziptree::store::ObjectKind;
use ziptree::tree::{TreeEntry, encode_tree};
use ziptree::{FileMode, MemoryStore, ObjectId};

pub const FILE: u32 = 0o100644;
pub const EXEC: u32 = 0o100755;
pub const DIR: u32 = 0o040000;
pub const SYMLINK: u32 = 0o120000;

pub fn tree_entry(mode: u32, name: &[u8], id: ObjectId) -> TreeEntry {
    TreeEntry {
        mode: FileMode(mode),
        name: name.to_vec(),
        id,
    }
}

pub fn tree(store: &mut MemoryStore, entries: &[TreeEntry]) -> ObjectId {
    store.insert(ObjectKind::Tree, encode_tree(entries))
}

pub fn commit(store: &mut MemoryStore, tree: &ObjectId, time: i64) -> ObjectId {
    store.insert(
        ObjectKind::Commit,
        format!(
            "tree {}\nauthor A <a@example.com> {} +0000\ncommitter C <c@example.com> {} +0000\n\nsnapshot\n",
            tree, time, time
        ),
    )
}

/// Deterministic bytes that deflate cannot shrink.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 7) as u8
        })
        .collect()
}

/// One entry as read back by the `zip` crate.
#[derive(Debug)]
pub struct ReadEntry {
    pub name: String,
    pub method: zip::CompressionMethod,
    pub size: u64,
    pub compressed_size: u64,
    pub crc32: u32,
    pub is_dir: bool,
    pub data: Vec<u8>,
}

pub fn read_archive(bytes: &[u8]) -> (Vec<ReadEntry>, Vec<u8>) {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    let comment = archive.comment().to_vec();

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        entries.push(ReadEntry {
            name: file.name().to_string(),
            method: file.compression(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            crc32: file.crc32(),
            is_dir: file.is_dir(),
            data,
        });
    }

    (entries, comment)
}

pub fn le16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

pub fn le32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
