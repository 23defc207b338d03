//! Protection engine configuration
//!
//! Loaded from TOML. Every section is optional and falls back to the
//! defaults below. Delays are always in scheduler ticks.

use crate::core::error::Result;
use crate::permission::action::Material;
use crate::spatial::coord::DEFAULT_CELL_SIZE;
use crate::territory::world::WorldSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Decision cache tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached decision stays fresh
    ///
    /// 0 disables caching entirely.
    pub ttl_ticks: u64,
    /// Oldest entry is evicted past this many entries for one subject
    pub max_entries_per_subject: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ticks: 20,
            max_entries_per_subject: 64,
        }
    }
}

/// Deferred reversion policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenConfig {
    /// Delay before a denied destroy is put back
    ///
    /// When 0, denied destroys are cancelled outright instead of being
    /// allowed and reverted later.
    pub protection_delay_ticks: u64,
    /// Base delay before wilderness explosion damage reverts
    pub wild_revert_delay_ticks: u64,
    /// Extra delay per block position in an explosion, so blocks return in order
    pub wild_revert_stagger_ticks: u64,
    /// Materials never queued for wilderness reversion
    pub explosive_materials: Vec<Material>,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            protection_delay_ticks: 0,
            wild_revert_delay_ticks: 100,
            wild_revert_stagger_ticks: 20,
            explosive_materials: vec![Material::new("tnt")],
        }
    }
}

/// War mode and conflict zone behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarConfig {
    /// During war, claims of unaffiliated groups lose their normal protection path
    pub allow_block_griefing: bool,
    /// Enemies may start a cell attack by placing the flag base material
    pub allowing_attacks: bool,
    pub flag_base_material: Material,
}

impl Default for WarConfig {
    fn default() -> Self {
        Self {
            allow_block_griefing: false,
            allowing_attacks: false,
            flag_base_material: Material::new("oak_fence"),
        }
    }
}

/// Fire admissibility tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// A block of one of these directly beneath vetoes ignition
    pub fire_proof_base_materials: Vec<Material>,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Edge length of a claim cell in blocks
    pub cell_size: i32,
    pub cache: CacheConfig,
    pub regen: RegenConfig,
    pub war: WarConfig,
    pub fire: FireConfig,
    /// Worlds registered at startup
    pub worlds: BTreeMap<String, WorldSettings>,
    /// Message template overrides
    pub messages: BTreeMap<String, String>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cache: CacheConfig::default(),
            regen: RegenConfig::default(),
            war: WarConfig::default(),
            fire: FireConfig::default(),
            worlds: BTreeMap::new(),
            messages: BTreeMap::new(),
        }
    }
}

impl ProtectionConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded protection config from {:?} ({} worlds)",
            path,
            config.worlds.len()
        );
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.cell_size <= 0 {
            return Err(format!("cell_size ({}) must be positive", self.cell_size));
        }

        if self.cache.max_entries_per_subject == 0 {
            return Err("cache.max_entries_per_subject must be at least 1".into());
        }

        if self.war.allowing_attacks && self.war.flag_base_material.is_air() {
            return Err("war.flag_base_material cannot be air when attacks are allowed".into());
        }

        Ok(())
    }
}
