//! Permission decisions: resolver, cache, hazard and boundary checks

pub mod action;
pub mod boundary;
pub mod cache;
pub mod hazard;
pub mod resolver;

pub use action::{ActionType, BlockType, CellStatus, Decision, Material};
pub use boundary::{evaluate_block_moves, evaluate_move};
pub use cache::{CacheKey, DecisionCache};
pub use hazard::HazardCheck;
pub use resolver::PermissionResolver;
