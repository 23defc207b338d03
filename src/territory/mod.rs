//! Claims, groups, worlds and the index that owns them

pub mod claim;
pub mod index;
pub mod world;

pub use claim::{Claim, Group, PermissionFlags, NOT_FOR_SALE};
pub use index::{CellView, TerritoryIndex};
pub use world::{WorldSettings, ZoneRules};
