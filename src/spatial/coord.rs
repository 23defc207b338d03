//! Coordinate model: continuous positions to blocks, blocks to claim cells
//!
//! A world is partitioned into square columns of `cell_size` blocks on the
//! x/z plane. Claims, conflict zones and cached decisions are keyed by cell;
//! reversions are keyed by individual block.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default edge length of a claim cell in blocks
pub const DEFAULT_CELL_SIZE: i32 = 16;

/// Integer block position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing a continuous position
    pub fn from_position(pos: Vec3) -> Self {
        Self {
            x: pos.x.floor() as i32,
            y: pos.y.floor() as i32,
            z: pos.z.floor() as i32,
        }
    }

    /// Neighbouring block one step in `direction`, clamped at the `i32` edge
    pub fn relative(&self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Claim cell this block falls in
    #[inline]
    pub fn cell(&self, cell_size: i32) -> CellCoord {
        CellCoord {
            x: self.x.div_euclid(cell_size),
            z: self.z.div_euclid(cell_size),
        }
    }
}

/// Face direction used for mechanical motion and adjacency checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Claim cell on the x/z plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A claim cell scoped to a named world
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub world: String,
    pub cell: CellCoord,
}

impl Coordinate {
    pub fn new(world: impl Into<String>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            cell: CellCoord::new(x, z),
        }
    }

    /// Cell containing a continuous position in `world`
    pub fn from_position(world: impl Into<String>, pos: Vec3, cell_size: i32) -> Self {
        Self {
            world: world.into(),
            cell: BlockPos::from_position(pos).cell(cell_size),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.world, self.cell)
    }
}

/// A single block scoped to a named world
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    pub world: String,
    pub pos: BlockPos,
}

impl BlockLocation {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            pos: BlockPos::new(x, y, z),
        }
    }

    pub fn coordinate(&self, cell_size: i32) -> Coordinate {
        Coordinate {
            world: self.world.clone(),
            cell: self.pos.cell(cell_size),
        }
    }

    pub fn relative(&self, direction: Direction) -> Self {
        Self {
            world: self.world.clone(),
            pos: self.pos.relative(direction),
        }
    }
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.pos.x, self.pos.y, self.pos.z)
    }
}
