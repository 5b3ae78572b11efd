//! Canonical in-memory block source loaded from JSONL.
//!
//! This is the block-source boundary for `compendium-store`:
//! - load/store JSONL
//! - expose deterministic lookups by identifier
//! - implement the kernel's `BlockSource` seam

use crate::jsonl::{JsonlError, read_records_from_path, write_records_to_path};
use compendium_kernel::{Block, BlockSource};
use std::collections::BTreeMap;
use std::path::Path;

/// Errors raised while loading or querying the block store.
#[derive(Debug, thiserror::Error)]
pub enum BlockStoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("block has an empty identifier (record {0})")]
    EmptyIdentifier(usize),
}

/// Blocks keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    blocks: BTreeMap<String, Block>,
}

impl BlockStore {
    /// Build a store from fully-materialized blocks.
    ///
    /// Duplicate identifiers resolve last-write-wins, matching append/overlay
    /// behavior when export files are concatenated.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, BlockStoreError> {
        let mut index = BTreeMap::new();
        for (i, block) in blocks.into_iter().enumerate() {
            if block.id.trim().is_empty() {
                return Err(BlockStoreError::EmptyIdentifier(i + 1));
            }
            if let Some(previous) = index.insert(block.id.clone(), block) {
                tracing::debug!(block = %previous.id, "duplicate block identifier, last write wins");
            }
        }
        Ok(Self { blocks: index })
    }

    /// Load store state from a JSONL file.
    pub fn load_jsonl(path: impl AsRef<Path>) -> Result<Self, BlockStoreError> {
        let blocks = read_records_from_path(path)?;
        Self::from_blocks(blocks)
    }

    /// Persist store state to a JSONL file.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<(), BlockStoreError> {
        let blocks: Vec<Block> = self.blocks.values().cloned().collect();
        write_records_to_path(path, &blocks)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Insert or replace a block by identifier.
    ///
    /// Returns the previous value if present.
    pub fn upsert_block(&mut self, block: Block) -> Option<Block> {
        self.blocks.insert(block.id.clone(), block)
    }

    /// Iterate all blocks in deterministic identifier order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }
}

impl BlockSource for BlockStore {
    fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }
}
