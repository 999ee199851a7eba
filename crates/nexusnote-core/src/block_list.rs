use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::block::Block;
use crate::error::NexusError;

/// A position write produced by a reorder or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChange {
    pub block_id: Uuid,
    pub position: i32,
}

/// The ordered blocks of one page.
///
/// Order in the vector is the render order. After every local mutation the
/// `position` field of each block equals its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockList {
    page_id: Uuid,
    blocks: Vec<Block>,
}

impl BlockList {
    pub fn new(page_id: Uuid) -> Self {
        Self {
            page_id,
            blocks: Vec::new(),
        }
    }

    /// Build from fetched blocks, ordered by stored position.
    ///
    /// Stored positions are kept as-is; use [`BlockList::is_contiguous`] to
    /// detect gaps or duplicates left by concurrent sessions.
    pub fn from_blocks(page_id: Uuid, mut blocks: Vec<Block>) -> Self {
        blocks.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Self { page_id, blocks }
    }

    pub fn page_id(&self) -> Uuid {
        self.page_id
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn get(&self, block_id: Uuid) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    pub fn index_of(&self, block_id: Uuid) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    /// Position a newly appended block takes
    pub fn next_position(&self) -> i32 {
        self.blocks.len() as i32
    }

    /// Whether positions are exactly `0..len` in order
    pub fn is_contiguous(&self) -> bool {
        self.blocks
            .iter()
            .enumerate()
            .all(|(index, block)| block.position == index as i32)
    }

    /// Append a block confirmed by the backend
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Move the block at `from` so it ends up at index `to`.
    ///
    /// Returns the position of every block, in the new order, for writing back.
    /// Moving a block onto its own index changes nothing and writes nothing.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<Vec<PositionChange>, NexusError> {
        let len = self.blocks.len();
        for index in [from, to] {
            if index >= len {
                return Err(NexusError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(Vec::new());
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        self.renumber();
        Ok(self.positions())
    }

    /// Indices for dropping `active` onto `over`, or `None` when nothing moves
    pub fn resolve_drop(&self, active: Uuid, over: Uuid) -> Option<(usize, usize)> {
        if active == over {
            return None;
        }
        Some((self.index_of(active)?, self.index_of(over)?))
    }

    /// Remove a block and close the gap.
    ///
    /// Returns the removed block and the position writes for the blocks that
    /// shifted up.
    pub fn remove(&mut self, block_id: Uuid) -> Result<(Block, Vec<PositionChange>), NexusError> {
        let index = self
            .index_of(block_id)
            .ok_or(NexusError::BlockNotFound(block_id))?;
        let removed = self.blocks.remove(index);
        let changes = self.renumber();
        Ok((removed, changes))
    }

    /// Replace a block's payload locally
    pub fn set_content(&mut self, block_id: Uuid, content: Value) -> Result<(), NexusError> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or(NexusError::BlockNotFound(block_id))?;
        block.content = content;
        Ok(())
    }

    /// Rewrite positions to match indices, returning only the ones that changed
    pub fn renumber(&mut self) -> Vec<PositionChange> {
        let mut changes = Vec::new();
        for (index, block) in self.blocks.iter_mut().enumerate() {
            let position = index as i32;
            if block.position != position {
                block.position = position;
                changes.push(PositionChange {
                    block_id: block.id,
                    position,
                });
            }
        }
        changes
    }

    pub fn positions(&self) -> Vec<PositionChange> {
        self.blocks
            .iter()
            .map(|b| PositionChange {
                block_id: b.id,
                position: b.position,
            })
            .collect()
    }

    /// Copy of the current order, for reverting an optimistic update
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn restore(&mut self, snapshot: Vec<Block>) {
        self.blocks = snapshot;
    }
}
