//! Action, material and decision types shared by every permission path

use serde::{Deserialize, Serialize};
use std::fmt;

/// Player-initiated terrain actions checked by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Build,
    Destroy,
}

impl ActionType {
    /// Verb used in messages
    pub fn verb(&self) -> &'static str {
        match self {
            ActionType::Build => "build",
            ActionType::Destroy => "destroy",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Terrain material identity (lowercase name, e.g. "stone")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Material(String);

impl Material {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_ascii_lowercase())
    }

    pub fn air() -> Self {
        Self("air".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_air(&self) -> bool {
        self.0 == "air"
    }
}

impl From<&str> for Material {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Material {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Material> for String {
    fn from(material: Material) -> Self {
        material.0
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Material plus variant data, as reported by the host for one block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockType {
    pub material: Material,
    #[serde(default)]
    pub data: u8,
}

impl BlockType {
    pub fn new(material: impl Into<Material>, data: u8) -> Self {
        Self {
            material: material.into(),
            data,
        }
    }

    pub fn of(material: impl Into<Material>) -> Self {
        Self::new(material, 0)
    }

    pub fn air() -> Self {
        Self::new(Material::air(), 0)
    }
}

/// How the subject relates to the cell a decision was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Unclaimed cell
    Wilderness,
    /// Subject holds this plot
    PlotOwner,
    /// Subject is on this plot's trusted list
    Trusted,
    /// Subject is a resident of the owning group
    GroupMember,
    /// Subject's group shares an alliance with the owning group
    Ally,
    /// Claimed by someone unrelated
    Outsider,
    /// Claimed by a group hostile to the subject during war mode
    Enemy,
    /// Inside a conflict zone
    ConflictZone,
    /// World is not registered with the protection system
    NotRegistered,
    /// Protection disabled for the world, or no subject context
    Unknown,
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub status: CellStatus,
}

impl Decision {
    pub fn allow(status: CellStatus) -> Self {
        Self {
            allowed: true,
            reason: None,
            status,
        }
    }

    pub fn deny(status: CellStatus, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_is_case_insensitive() {
        assert_eq!(Material::new("STONE"), Material::new("stone"));
        assert_eq!(Material::from("Sand").as_str(), "sand");
    }

    #[test]
    fn test_decision_constructors() {
        let allow = Decision::allow(CellStatus::GroupMember);
        assert!(allow.allowed);
        assert!(allow.reason.is_none());

        let deny = Decision::deny(CellStatus::Outsider, "no");
        assert!(!deny.allowed);
        assert_eq!(deny.reason.as_deref(), Some("no"));
    }
}
