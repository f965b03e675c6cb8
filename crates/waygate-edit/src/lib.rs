//! In-memory block store with per-chunk change tracking.
#![forbid(unsafe_code)]

use std::collections::HashMap;

use waygate_blocks::{BlockStore, MaterialId};
use waygate_geom::BlockPos;

pub const CHUNK_SIZE: i32 = 16;

#[derive(Default, Debug, Clone, Copy)]
pub struct EditStoreStats {
    pub chunk_entries: usize,
    pub block_edits: usize,
    pub writes: u64,
}

/// Chunk-aware block store. Only writes that change a block's material bump
/// the revision of the chunk holding it.
pub struct EditStore {
    // Map per-chunk: key=(cx,cy,cz) -> map of world coords -> material
    inner: HashMap<(i32, i32, i32), HashMap<BlockPos, MaterialId>>,
    rev: HashMap<(i32, i32, i32), u64>,
    counter: u64,
}

impl Default for EditStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EditStore {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
            rev: HashMap::new(),
            counter: 0,
        }
    }

    pub fn stats(&self) -> EditStoreStats {
        EditStoreStats {
            chunk_entries: self.inner.len(),
            block_edits: self.inner.values().map(|m| m.len()).sum(),
            writes: self.counter,
        }
    }

    #[inline]
    fn chunk_key(pos: BlockPos) -> (i32, i32, i32) {
        (
            pos.x.div_euclid(CHUNK_SIZE),
            pos.y.div_euclid(CHUNK_SIZE),
            pos.z.div_euclid(CHUNK_SIZE),
        )
    }

    pub fn get(&self, pos: BlockPos) -> Option<MaterialId> {
        self.inner
            .get(&Self::chunk_key(pos))
            .and_then(|m| m.get(&pos).copied())
    }

    /// Store a material; returns false when the block already had it.
    pub fn set(&mut self, pos: BlockPos, material: MaterialId) -> bool {
        let k = Self::chunk_key(pos);
        let entry = self.inner.entry(k).or_default();
        if entry.insert(pos, material) == Some(material) {
            return false;
        }
        self.counter = self.counter.wrapping_add(1).max(1);
        self.rev.insert(k, self.counter);
        true
    }

    /// Snapshot of all stored blocks in one chunk
    pub fn snapshot_for_chunk(&self, cx: i32, cy: i32, cz: i32) -> Vec<(BlockPos, MaterialId)> {
        let mut out: Vec<(BlockPos, MaterialId)> = self
            .inner
            .get(&(cx, cy, cz))
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default();
        out.sort_by_key(|(p, _)| *p);
        out
    }

    /// Latest write stamp affecting the chunk containing `pos` (0 if never written).
    pub fn rev_at(&self, pos: BlockPos) -> u64 {
        self.rev.get(&Self::chunk_key(pos)).copied().unwrap_or(0)
    }

    /// Total number of material-changing writes so far.
    pub fn writes(&self) -> u64 {
        self.counter
    }
}

impl BlockStore for EditStore {
    fn get_material(&self, pos: BlockPos) -> MaterialId {
        self.get(pos).unwrap_or(MaterialId::NONE)
    }

    fn set_material(&mut self, pos: BlockPos, material: MaterialId) {
        self.set(pos, material);
    }
}
