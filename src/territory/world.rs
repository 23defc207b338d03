//! Per-world global flags and conflict zone rules

use crate::permission::action::{ActionType, Material};
use serde::{Deserialize, Serialize};

/// Global flags for one world, read by every resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Protection system active in this world at all
    pub using_protection: bool,
    /// Fire allowed in every claim regardless of claim flags
    pub force_fire: bool,
    /// Explosions allowed in every claim regardless of claim flags
    pub force_explosions: bool,
    /// Fire allowed in the wilderness
    pub fire: bool,
    /// Explosions allowed in the wilderness
    pub explosions: bool,
    /// Unclaimed cells may be built on by anyone
    pub unclaimed_build: bool,
    /// Unclaimed cells may be broken by anyone
    pub unclaimed_destroy: bool,
    /// Materials editable in the wilderness regardless of the flags above
    pub wilderness_ignore_materials: Vec<Material>,
    /// Explosion damage in the wilderness reverts automatically
    pub wild_revert: bool,
    /// World is in conflict/war mode
    pub war_time: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            using_protection: true,
            force_fire: false,
            force_explosions: false,
            fire: false,
            explosions: false,
            unclaimed_build: false,
            unclaimed_destroy: false,
            wilderness_ignore_materials: Vec::new(),
            wild_revert: false,
            war_time: false,
        }
    }
}

impl WorldSettings {
    /// Global wilderness flag for an action class
    pub fn unclaimed_allows(&self, action: ActionType) -> bool {
        match action {
            ActionType::Build => self.unclaimed_build,
            ActionType::Destroy => self.unclaimed_destroy,
        }
    }

    pub fn wilderness_ignores(&self, material: &Material) -> bool {
        self.wilderness_ignore_materials.contains(material)
    }
}

/// Overrides in effect inside a conflict zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneRules {
    pub editable_materials: Vec<Material>,
    pub allow_fire: bool,
    pub allow_explosions: bool,
}

impl ZoneRules {
    pub fn is_editable(&self, material: &Material) -> bool {
        self.editable_materials.contains(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_world_uses_protection_and_denies_wilderness_edits() {
        let settings = WorldSettings::default();
        assert!(settings.using_protection);
        assert!(!settings.unclaimed_allows(ActionType::Build));
        assert!(!settings.unclaimed_allows(ActionType::Destroy));
    }

    #[test]
    fn test_world_settings_from_partial_toml() {
        let settings: WorldSettings = toml::from_str(
            r#"
            unclaimed_destroy = true
            wilderness_ignore_materials = ["wheat", "Carrots"]
            "#,
        )
        .unwrap();
        assert!(settings.using_protection);
        assert!(settings.unclaimed_allows(ActionType::Destroy));
        assert!(settings.wilderness_ignores(&Material::new("wheat")));
        assert!(settings.wilderness_ignores(&Material::new("carrots")));
    }

    #[test]
    fn test_zone_rules_editable() {
        let rules = ZoneRules {
            editable_materials: vec![Material::new("sand")],
            ..Default::default()
        };
        assert!(rules.is_editable(&Material::new("sand")));
        assert!(!rules.is_editable(&Material::new("stone")));
    }
}
