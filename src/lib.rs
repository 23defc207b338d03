//! Territory Guard - claim-based protection for grid-partitioned worlds

pub mod core;
pub mod engine;
pub mod host;
pub mod permission;
pub mod regen;
pub mod scenario;
pub mod spatial;
pub mod territory;
