pub mod config;
pub mod error;
pub mod messages;
pub mod types;

pub use config::ProtectionConfig;
pub use error::{ProtectionError, Result};
pub use messages::Messages;
