//! Permission resolution for build and destroy actions
//!
//! Rules, first match wins:
//! 1. fresh cached decision for (subject, cell, block, action)
//! 2. explicit grant (plot holder, trusted, group member, ally) allows
//! 3. conflict zone allows only its editable materials
//! 4. wilderness follows the world's unclaimed flags
//! 5. claimed cells need the claim flag, and must not be an unaffiliated
//!    group's claim while war griefing is on
//! 6. otherwise deny with the accumulated reason

use crate::core::config::WarConfig;
use crate::core::error::ProtectionError;
use crate::core::messages::{self, Messages};
use crate::core::types::{SubjectId, Tick};
use crate::permission::action::{ActionType, BlockType, CellStatus, Decision};
use crate::permission::cache::{CacheKey, DecisionCache};
use crate::spatial::coord::Coordinate;
use crate::territory::claim::Group;
use crate::territory::index::TerritoryIndex;
use crate::territory::world::WorldSettings;

/// War-mode carve-out for build, destroy and fire: an unaffiliated group's
/// claims lose their flag-based path while war griefing is enabled
pub fn unaffiliated_in_war(settings: &WorldSettings, war: &WarConfig, group: &Group) -> bool {
    settings.war_time && war.allow_block_griefing && !group.has_alliance()
}

/// War-mode carve-out for explosions; groups with explosions already on are exempt
pub fn unaffiliated_in_war_explosion(
    settings: &WorldSettings,
    war: &WarConfig,
    group: &Group,
) -> bool {
    unaffiliated_in_war(settings, war, group) && !group.explosions
}

/// Read-only resolver over the territory index
pub struct PermissionResolver<'a> {
    index: &'a TerritoryIndex,
    war: &'a WarConfig,
    messages: &'a Messages,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(index: &'a TerritoryIndex, war: &'a WarConfig, messages: &'a Messages) -> Self {
        Self { index, war, messages }
    }

    /// Resolve through the cache, populating it on a miss
    pub fn resolve(
        &self,
        cache: &mut DecisionCache,
        now: Tick,
        subject: SubjectId,
        coordinate: &Coordinate,
        block: &BlockType,
        action: ActionType,
    ) -> Decision {
        let key = CacheKey::new(coordinate.clone(), block.clone(), action);
        let generation = self.index.generation();
        if let Some(decision) = cache.get(subject, &key, now, generation) {
            return decision;
        }

        let decision = self.evaluate(subject, coordinate, block, action);
        cache.insert(subject, key, decision.clone(), now, generation);
        decision
    }

    /// Rules 2-6 without consulting the cache
    pub fn evaluate(
        &self,
        subject: SubjectId,
        coordinate: &Coordinate,
        block: &BlockType,
        action: ActionType,
    ) -> Decision {
        let view = match self.index.view(coordinate) {
            Ok(view) => view,
            Err(ProtectionError::WorldNotFound(world)) => {
                tracing::warn!("Resolve in unregistered world {}, deferring to host", world);
                return Decision::allow(CellStatus::NotRegistered);
            }
            Err(err) => {
                tracing::debug!("Denying {} at {}: {}", action, coordinate, err);
                let cell = coordinate.cell.to_string();
                return Decision::deny(
                    CellStatus::Unknown,
                    self.messages.get(messages::CLAIM_LOOKUP, &[action.verb(), &cell]),
                );
            }
        };

        if !view.settings.using_protection {
            return Decision::allow(CellStatus::Unknown);
        }

        let status = self.index.subject_status(subject, &view);
        if matches!(
            status,
            CellStatus::PlotOwner | CellStatus::Trusted | CellStatus::GroupMember | CellStatus::Ally
        ) {
            return Decision::allow(status);
        }

        if let Some(zone) = view.zone {
            if zone.is_editable(&block.material) {
                return Decision::allow(CellStatus::ConflictZone);
            }
            return Decision::deny(
                CellStatus::ConflictZone,
                self.messages.get(
                    messages::CONFLICT_ZONE_MATERIAL,
                    &[action.verb(), block.material.as_str()],
                ),
            );
        }

        let (Some(claim), Some(group)) = (view.claim, view.group) else {
            let settings = view.settings;
            if settings.wilderness_ignores(&block.material) || settings.unclaimed_allows(action) {
                return Decision::allow(CellStatus::Wilderness);
            }
            return Decision::deny(
                CellStatus::Wilderness,
                self.messages.get(messages::WILDERNESS, &[action.verb()]),
            );
        };

        let carved_out = unaffiliated_in_war(view.settings, self.war, group);
        if claim.flags.allows(action) && !carved_out {
            return Decision::allow(status);
        }

        let reason = if carved_out {
            self.messages.get(messages::WAR_UNAFFILIATED, &[action.verb(), &group.name])
        } else {
            self.messages.get(messages::PLOT, &[action.verb(), &group.name])
        };
        Decision::deny(status, reason)
    }
}
