//! Fire and explosion admissibility
//!
//! Narrower than full resolution: no subject, no cache. Unknown worlds are
//! outside the system and always admit; broken claim data never does.

use crate::core::config::{FireConfig, WarConfig};
use crate::core::error::ProtectionError;
use crate::permission::action::Material;
use crate::permission::resolver::{unaffiliated_in_war, unaffiliated_in_war_explosion};
use crate::spatial::coord::Coordinate;
use crate::territory::index::{CellView, TerritoryIndex};

enum Lookup<'b> {
    /// World not registered: outside the system
    Outside,
    /// Claim data is broken
    Broken,
    Cell(CellView<'b>),
}

fn lookup<'b>(index: &'b TerritoryIndex, coordinate: &'b Coordinate) -> Lookup<'b> {
    match index.view(coordinate) {
        Ok(view) => Lookup::Cell(view),
        Err(ProtectionError::WorldNotFound(_)) => Lookup::Outside,
        Err(err) => {
            tracing::debug!("Hazard check at {} failed: {}", coordinate, err);
            Lookup::Broken
        }
    }
}

pub struct HazardCheck<'a> {
    index: &'a TerritoryIndex,
    war: &'a WarConfig,
    fire: &'a FireConfig,
}

impl<'a> HazardCheck<'a> {
    pub fn new(index: &'a TerritoryIndex, war: &'a WarConfig, fire: &'a FireConfig) -> Self {
        Self { index, war, fire }
    }

    /// Whether fire may start or spread at `coordinate`
    ///
    /// `beneath` is the material directly under the burning block; a
    /// fire-proof base vetoes ignition.
    pub fn can_ignite(&self, coordinate: &Coordinate, beneath: Option<&Material>) -> bool {
        let view = match lookup(self.index, coordinate) {
            Lookup::Cell(view) => view,
            Lookup::Outside => return true,
            Lookup::Broken => return false,
        };
        if !view.settings.using_protection {
            return true;
        }

        if let Some(zone) = view.zone {
            if !zone.allow_fire {
                tracing::debug!("Cancelled ignition within conflict zone {}", coordinate);
            }
            return zone.allow_fire;
        }

        if let Some(base) = beneath {
            if self.fire.fire_proof_base_materials.contains(base) {
                tracing::debug!("Cancelled ignition above {} at {}", base, coordinate);
                return false;
            }
        }

        let allowed = match (view.claim, view.group) {
            (Some(claim), Some(group)) => {
                (claim.flags.fire || group.fire || view.settings.force_fire)
                    && !unaffiliated_in_war(view.settings, self.war, group)
            }
            _ => view.settings.fire,
        };
        if !allowed {
            tracing::debug!("Cancelled ignition within {}", coordinate);
        }
        allowed
    }

    /// Whether an explosion may destroy terrain at `coordinate`
    pub fn can_explode(&self, coordinate: &Coordinate) -> bool {
        let view = match lookup(self.index, coordinate) {
            Lookup::Cell(view) => view,
            Lookup::Outside => return true,
            Lookup::Broken => return false,
        };

        if let Some(zone) = view.zone {
            if !zone.allow_explosions {
                return false;
            }
        }

        match (view.claim, view.group) {
            (Some(claim), Some(group)) => {
                if view.settings.using_protection && !view.settings.force_explosions {
                    let carved_out =
                        unaffiliated_in_war_explosion(view.settings, self.war, group);
                    claim.flags.explosion && !carved_out
                } else {
                    true
                }
            }
            _ => view.settings.explosions,
        }
    }
}
