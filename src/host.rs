//! Interfaces to the host simulation
//!
//! The engine never owns terrain or message delivery. The host implements
//! these traits; `MemoryTerrain` and `MessageLog` are in-memory versions
//! used by the CLI and tests.

use crate::core::types::SubjectId;
use crate::permission::action::BlockType;
use crate::spatial::coord::BlockLocation;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Opaque captured terrain state for one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub block: BlockType,
    /// Host-specific extra state (tile data, orientation, ...)
    #[serde(default)]
    pub state: Vec<u8>,
}

impl TerrainSnapshot {
    pub fn of(block: BlockType) -> Self {
        Self {
            block,
            state: Vec::new(),
        }
    }
}

/// Terrain access provided by the host
pub trait TerrainHost {
    /// Material and variant currently at `location`
    fn type_and_data(&self, location: &BlockLocation) -> BlockType;

    fn set_block(&mut self, location: &BlockLocation, block: BlockType);

    /// Capture everything needed to put `location` back later
    fn capture(&self, location: &BlockLocation) -> TerrainSnapshot {
        TerrainSnapshot::of(self.type_and_data(location))
    }

    /// Put a captured state back unconditionally
    fn restore(&mut self, location: &BlockLocation, snapshot: &TerrainSnapshot) {
        self.set_block(location, snapshot.block.clone());
    }
}

/// One-way delivery of denial reasons to subjects
pub trait Notifier {
    fn notify(&mut self, subject: SubjectId, message: &str);
}

/// Notifier that writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, subject: SubjectId, message: &str) {
        tracing::info!("[{}] {}", subject, message);
    }
}

/// Notifier that records every message
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    pub messages: Vec<(SubjectId, String)>,
}

impl MessageLog {
    pub fn for_subject(&self, subject: SubjectId) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(s, _)| *s == subject)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

impl Notifier for MessageLog {
    fn notify(&mut self, subject: SubjectId, message: &str) {
        self.messages.push((subject, message.to_string()));
    }
}

/// Sparse in-memory terrain; unset blocks are air
#[derive(Debug, Default, Clone)]
pub struct MemoryTerrain {
    blocks: AHashMap<BlockLocation, BlockType>,
    restores: usize,
}

impl MemoryTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshot restorations applied so far
    pub fn restore_count(&self) -> usize {
        self.restores
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl TerrainHost for MemoryTerrain {
    fn type_and_data(&self, location: &BlockLocation) -> BlockType {
        self.blocks.get(location).cloned().unwrap_or_else(BlockType::air)
    }

    fn set_block(&mut self, location: &BlockLocation, block: BlockType) {
        if block.material.is_air() {
            self.blocks.remove(location);
        } else {
            self.blocks.insert(location.clone(), block);
        }
    }

    fn restore(&mut self, location: &BlockLocation, snapshot: &TerrainSnapshot) {
        self.set_block(location, snapshot.block.clone());
        self.restores += 1;
    }
}
