use std::collections::HashMap;

use anyhow::{Result, anyhow};

use super::{Object, ObjectId, ObjectKind, ObjectStore};

/// Object store backed by an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: HashMap<ObjectId, Object>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under its git object id and return that id.
    pub fn insert(&mut self, kind: ObjectKind, data: impl Into<Vec<u8>>) -> ObjectId {
        let data = data.into();
        let id = ObjectId::hash_object(kind, &data);
        self.objects.insert(id, Object { kind, data });
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn read_object(&self, id: &ObjectId) -> Result<Object> {
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("cannot read {}", id))
    }
}
