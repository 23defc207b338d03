//! Deferred restoration of terrain

pub mod scheduler;

pub use scheduler::{PendingReversion, ReversionScheduler};
