//! Event interception facade
//!
//! The host calls one `on_*` method per raised event and applies the
//! returned verdict. Every handler checks the system error state first;
//! while it is set, every event is cancelled.

use crate::core::config::ProtectionConfig;
use crate::core::error::{ProtectionError, Result};
use crate::core::messages::{self, Messages};
use crate::core::types::{SubjectId, TaskHandle, Tick};
use crate::host::{Notifier, TerrainHost};
use crate::permission::action::{ActionType, BlockType, CellStatus, Decision};
use crate::permission::boundary::{evaluate_block_moves, evaluate_move};
use crate::permission::cache::DecisionCache;
use crate::permission::hazard::HazardCheck;
use crate::permission::resolver::PermissionResolver;
use crate::regen::scheduler::ReversionScheduler;
use crate::spatial::coord::{BlockLocation, BlockPos, Coordinate, Direction};
use crate::territory::index::TerritoryIndex;
use serde::Serialize;

/// Host event kinds routed through the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BlockBreak,
    BlockPlace,
    BlockBurn,
    BlockIgnite,
    PistonExtend,
    PistonRetract,
    Explosion,
}

/// Which reversion delay applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayPolicy {
    /// A denied destroy inside protected territory
    ProtectedDestroy,
    /// Wilderness explosion damage; `order` is the 1-based block position in the blast
    WildExplosion { order: u64 },
    Fixed(Tick),
}

/// What the host should do with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum Verdict {
    Proceed,
    Cancel { reason: Option<String> },
    /// Let the event happen; the block is put back later
    ProceedAndRevert { handle: Option<TaskHandle> },
    /// A placeholder block was removed instead of reverting
    PlaceholderCleared,
    /// Hand over to the host's war module to start a cell attack
    AttackCell,
}

impl Verdict {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Verdict::Cancel { .. })
    }

    fn cancel(reason: Option<String>) -> Self {
        Verdict::Cancel { reason }
    }
}

/// Per-block result of an explosion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitDecision {
    pub location: BlockLocation,
    pub allowed: bool,
    pub reversion: Option<TaskHandle>,
}

/// Result of a whole explosion event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExplosionOutcome {
    /// One block may not explode, so the whole blast is cancelled
    pub cancelled: bool,
    /// Blocks will be reverted; the host should drop no items
    pub suppress_drops: bool,
    pub units: Vec<UnitDecision>,
}

/// Protection engine bound to a host terrain and notifier
pub struct ProtectionEngine<T: TerrainHost, N: Notifier> {
    config: ProtectionConfig,
    messages: Messages,
    index: TerritoryIndex,
    cache: DecisionCache,
    scheduler: ReversionScheduler,
    terrain: T,
    notifier: N,
    system_error: Option<String>,
}

impl<T: TerrainHost, N: Notifier> ProtectionEngine<T, N> {
    pub fn new(config: ProtectionConfig, terrain: T, notifier: N) -> Self {
        let mut index = TerritoryIndex::new(config.cell_size);
        for (name, settings) in &config.worlds {
            index.register_world(name.clone(), settings.clone());
        }
        let messages = Messages::with_overrides(&config.messages);
        let cache = DecisionCache::new(
            config.cache.ttl_ticks,
            config.cache.max_entries_per_subject,
        );

        Self {
            config,
            messages,
            index,
            cache,
            scheduler: ReversionScheduler::new(),
            terrain,
            notifier,
            system_error: None,
        }
    }

    /// Validate the config first and enter the error state if it is broken
    pub fn from_config(config: ProtectionConfig, terrain: T, notifier: N) -> Self {
        let problem = config.validate().err();
        let mut engine = Self::new(config, terrain, notifier);
        if let Some(problem) = problem {
            engine.set_system_error(problem);
        }
        engine
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn index(&self) -> &TerritoryIndex {
        &self.index
    }

    /// Mutable access for administrative changes; cached decisions made
    /// before the change are never served afterwards
    pub fn index_mut(&mut self) -> &mut TerritoryIndex {
        &mut self.index
    }

    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DecisionCache {
        &mut self.cache
    }

    /// Shared handle to the reversion scheduler
    pub fn scheduler(&self) -> &ReversionScheduler {
        &self.scheduler
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // === SYSTEM ERROR STATE ===

    pub fn set_system_error(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Protection entering error state: {}", reason);
        self.system_error = Some(reason);
    }

    pub fn clear_system_error(&mut self) {
        self.system_error = None;
    }

    pub fn system_error(&self) -> Option<&str> {
        self.system_error.as_deref()
    }

    fn check_system(&self) -> Result<()> {
        match &self.system_error {
            Some(reason) => Err(ProtectionError::SystemError(reason.clone())),
            None => Ok(()),
        }
    }

    fn system_verdict(&self) -> Option<Verdict> {
        self.check_system()
            .err()
            .map(|_| Verdict::cancel(Some(self.messages.get(messages::SYSTEM_ERROR, &[]))))
    }

    fn coordinate(&self, location: &BlockLocation) -> Coordinate {
        location.coordinate(self.index.cell_size())
    }

    fn cancel_and_notify(&mut self, subject: SubjectId, reason: Option<String>) -> Verdict {
        if let Some(reason) = &reason {
            self.notifier.notify(subject, reason);
        }
        Verdict::cancel(reason)
    }

    // === DECISIONS ===

    /// Resolve a build/destroy permission, consulting the decision cache
    pub fn decide(
        &mut self,
        kind: EventKind,
        subject: SubjectId,
        coordinate: &Coordinate,
        block: &BlockType,
        action: ActionType,
    ) -> Decision {
        if self.check_system().is_err() {
            let reason = self.messages.get(messages::SYSTEM_ERROR, &[]);
            return Decision::deny(CellStatus::Unknown, reason);
        }
        let now = self.scheduler.now();
        let resolver = PermissionResolver::new(&self.index, &self.config.war, &self.messages);
        let decision = resolver.resolve(&mut self.cache, now, subject, coordinate, block, action);
        if !decision.allowed {
            tracing::debug!(
                "{:?}: denied {} of {} at {} ({:?})",
                kind,
                action,
                block.material,
                coordinate,
                decision.status
            );
        }
        decision
    }

    /// Whether moving terrain between two cells must be blocked
    pub fn decide_move(&self, kind: EventKind, from: &Coordinate, to: &Coordinate) -> bool {
        if self.check_system().is_err() {
            return true;
        }
        let blocked = evaluate_move(&self.index, from, to);
        if blocked {
            tracing::debug!("{:?}: blocked move {} -> {}", kind, from, to);
        }
        blocked
    }

    pub fn can_ignite_at(&self, location: &BlockLocation) -> bool {
        let coordinate = self.coordinate(location);
        let beneath = self.terrain.type_and_data(&location.relative(Direction::Down));
        HazardCheck::new(&self.index, &self.config.war, &self.config.fire)
            .can_ignite(&coordinate, Some(&beneath.material))
    }

    pub fn can_explode_at(&self, location: &BlockLocation) -> bool {
        let coordinate = self.coordinate(location);
        HazardCheck::new(&self.index, &self.config.war, &self.config.fire).can_explode(&coordinate)
    }

    fn delay_for(&self, policy: DelayPolicy) -> Tick {
        let regen = &self.config.regen;
        match policy {
            DelayPolicy::ProtectedDestroy => regen.protection_delay_ticks,
            DelayPolicy::WildExplosion { order } => regen
                .wild_revert_delay_ticks
                .saturating_add(order.saturating_mul(regen.wild_revert_stagger_ticks)),
            DelayPolicy::Fixed(ticks) => ticks,
        }
    }

    /// Capture the block at `location` now and schedule it to be put back
    ///
    /// Returns `None` when a reversion is already pending there.
    pub fn on_destructive_denial(
        &mut self,
        location: &BlockLocation,
        policy: DelayPolicy,
    ) -> Option<TaskHandle> {
        let snapshot = self.terrain.capture(location);
        let delay = self.delay_for(policy);
        match self.scheduler.schedule(location.clone(), snapshot, delay) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::debug!("Reversion request dropped: {}", err);
                None
            }
        }
    }

    // === HOST EVENTS ===

    /// A subject breaks the block at `location`
    pub fn on_block_break(&mut self, subject: SubjectId, location: &BlockLocation) -> Verdict {
        if let Some(verdict) = self.system_verdict() {
            return verdict;
        }
        let block = self.terrain.type_and_data(location);
        let coordinate = self.coordinate(location);
        let decision = self.decide(
            EventKind::BlockBreak,
            subject,
            &coordinate,
            &block,
            ActionType::Destroy,
        );

        if decision.allowed {
            self.scheduler.cancel(location);
            return Verdict::Proceed;
        }

        let in_zone = decision.status == CellStatus::ConflictZone;
        if in_zone || self.config.regen.protection_delay_ticks == 0 {
            return self.cancel_and_notify(subject, decision.reason);
        }

        if self.scheduler.remove_placeholder(location) {
            self.terrain.set_block(location, BlockType::air());
            return Verdict::PlaceholderCleared;
        }

        let handle = if self.scheduler.has_pending(location) {
            None
        } else {
            self.on_destructive_denial(location, DelayPolicy::ProtectedDestroy)
        };
        Verdict::ProceedAndRevert { handle }
    }

    /// A subject places `placed` at `location`
    pub fn on_block_place(
        &mut self,
        subject: SubjectId,
        location: &BlockLocation,
        placed: &BlockType,
    ) -> Verdict {
        if let Some(verdict) = self.system_verdict() {
            return verdict;
        }
        if !self.index.has_world(&location.world) {
            let reason = self.messages.get(messages::NOT_CONFIGURED, &[]);
            return self.cancel_and_notify(subject, Some(reason));
        }

        let coordinate = self.coordinate(location);
        let decision = self.decide(
            EventKind::BlockPlace,
            subject,
            &coordinate,
            placed,
            ActionType::Build,
        );
        if decision.allowed {
            self.scheduler.cancel(location);
            return Verdict::Proceed;
        }

        let war = &self.config.war;
        let flag_base = placed.material == war.flag_base_material;
        if decision.status == CellStatus::Enemy && war.allowing_attacks && flag_base {
            tracing::debug!("Attack cell requested at {}", coordinate);
            return Verdict::AttackCell;
        }

        self.cancel_and_notify(subject, decision.reason)
    }

    /// Fire spreading into the block at `location`
    pub fn on_block_burn(&mut self, location: &BlockLocation) -> Verdict {
        if let Some(verdict) = self.system_verdict() {
            return verdict;
        }
        if self.can_ignite_at(location) {
            Verdict::Proceed
        } else {
            Verdict::cancel(None)
        }
    }

    /// The block at `location` catching fire; an event another handler
    /// already cancelled stays cancelled
    pub fn on_block_ignite(
        &mut self,
        location: &BlockLocation,
        already_cancelled: bool,
    ) -> Verdict {
        if already_cancelled {
            return Verdict::cancel(None);
        }
        self.on_block_burn(location)
    }

    /// A piston pushes or pulls `blocks` one step in `direction`
    pub fn on_piston(
        &mut self,
        kind: EventKind,
        world: &str,
        blocks: &[BlockPos],
        direction: Direction,
    ) -> Verdict {
        if let Some(verdict) = self.system_verdict() {
            return verdict;
        }
        if evaluate_block_moves(&self.index, world, blocks, direction) {
            tracing::debug!(
                "{:?}: blocked {} blocks moving {:?} in {}",
                kind,
                blocks.len(),
                direction,
                world
            );
            Verdict::cancel(None)
        } else {
            Verdict::Proceed
        }
    }

    /// Decide one block of an explosion; `order` is its 1-based position in the blast
    pub fn on_explosion_at(&mut self, location: &BlockLocation, order: u64) -> UnitDecision {
        if self.check_system().is_err() || !self.can_explode_at(location) {
            return UnitDecision {
                location: location.clone(),
                allowed: false,
                reversion: None,
            };
        }

        let coordinate = self.coordinate(location);
        let claim = self.index.lookup(&coordinate);
        let settings = self.index.world_settings(&location.world);
        let wild_revert = match (claim, settings) {
            (Ok(None), Ok(settings)) => {
                settings.using_protection && settings.explosions && settings.wild_revert
            }
            _ => false,
        };

        let mut reversion = None;
        if wild_revert && !self.scheduler.has_pending(location) {
            let block = self.terrain.type_and_data(location);
            if !self.config.regen.explosive_materials.contains(&block.material) {
                let policy = DelayPolicy::WildExplosion { order };
                reversion = self.on_destructive_denial(location, policy);
            }
        }

        UnitDecision {
            location: location.clone(),
            allowed: true,
            reversion,
        }
    }

    /// An explosion about to destroy `blocks` in `world`
    ///
    /// If any block may not explode, the whole blast is cancelled and the
    /// reversions already queued for earlier blocks are withdrawn, since
    /// those blocks are never removed.
    pub fn on_explosion(&mut self, world: &str, blocks: &[BlockPos]) -> ExplosionOutcome {
        let mut outcome = ExplosionOutcome::default();
        if self.check_system().is_err() {
            outcome.cancelled = true;
            return outcome;
        }

        for (i, pos) in blocks.iter().enumerate() {
            let location = BlockLocation {
                world: world.to_string(),
                pos: *pos,
            };
            let unit = self.on_explosion_at(&location, i as u64 + 1);
            if !unit.allowed {
                tracing::debug!("Explosion cancelled, {} may not explode", location);
                for earlier in &mut outcome.units {
                    if let Some(handle) = earlier.reversion.take() {
                        self.scheduler.cancel_task(handle);
                    }
                }
                outcome.cancelled = true;
                outcome.suppress_drops = false;
                outcome.units.push(unit);
                return outcome;
            }
            outcome.suppress_drops |= unit.reversion.is_some();
            outcome.units.push(unit);
        }
        outcome
    }

    /// Advance host time, restoring due reversions
    pub fn tick(&mut self, ticks: Tick) -> Vec<BlockLocation> {
        let restored = self.scheduler.advance(ticks, &mut self.terrain);
        self.cache.purge_expired(self.scheduler.now());
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GroupId;
    use crate::host::{MemoryTerrain, MessageLog};
    use crate::spatial::coord::CellCoord;
    use crate::territory::claim::{Claim, Group};
    use crate::territory::world::WorldSettings;

    fn engine_with(config: ProtectionConfig) -> ProtectionEngine<MemoryTerrain, MessageLog> {
        let mut engine = ProtectionEngine::new(config, MemoryTerrain::new(), MessageLog::default());
        engine.index_mut().register_world("w", WorldSettings::default());
        engine.index_mut().register_group(Group::new(GroupId(1), "Ashford"));
        engine
            .index_mut()
            .insert_claim("w", Claim::new(CellCoord::new(0, 0), GroupId(1)))
            .unwrap();
        engine
    }

    #[test]
    fn test_system_error_cancels_everything() {
        let mut engine = engine_with(ProtectionConfig::default());
        engine.set_system_error("data source failed to load");
        let subject = SubjectId::new();
        let loc = BlockLocation::new("w", 100, 64, 100);

        assert!(engine.on_block_break(subject, &loc).is_cancelled());
        assert!(engine.on_block_place(subject, &loc, &BlockType::of("stone")).is_cancelled());
        assert!(engine.on_block_burn(&loc).is_cancelled());
        assert!(engine.on_piston(EventKind::PistonExtend, "w", &[], Direction::Up).is_cancelled());
        assert!(engine.on_explosion("w", &[]).cancelled);
        let decision = engine.decide(
            EventKind::BlockBreak,
            subject,
            &Coordinate::new("w", 9, 9),
            &BlockType::of("dirt"),
            ActionType::Destroy,
        );
        assert!(!decision.allowed);

        engine.clear_system_error();
        assert!(engine.system_error().is_none());
    }

    #[test]
    fn test_invalid_config_enters_error_state() {
        let config = ProtectionConfig {
            cell_size: -4,
            ..Default::default()
        };
        let engine =
            ProtectionEngine::from_config(config, MemoryTerrain::new(), MessageLog::default());
        assert!(engine.system_error().is_some());
    }

    #[test]
    fn test_denied_break_without_regen_is_cancelled_and_notified() {
        let mut engine = engine_with(ProtectionConfig::default());
        let subject = SubjectId::new();
        let loc = BlockLocation::new("w", 3, 64, 3);
        engine.terrain_mut().set_block(&loc, BlockType::of("stone"));

        let verdict = engine.on_block_break(subject, &loc);
        assert!(verdict.is_cancelled());
        assert_eq!(engine.notifier().for_subject(subject).len(), 1);
    }

    #[test]
    fn test_denied_break_with_regen_proceeds_and_reverts() {
        let mut config = ProtectionConfig::default();
        config.regen.protection_delay_ticks = 40;
        let mut engine = engine_with(config);
        let subject = SubjectId::new();
        let loc = BlockLocation::new("w", 3, 64, 3);
        engine.terrain_mut().set_block(&loc, BlockType::of("stone"));

        let verdict = engine.on_block_break(subject, &loc);
        assert!(matches!(verdict, Verdict::ProceedAndRevert { handle: Some(_) }));
        assert!(engine.notifier().messages.is_empty());

        engine.terrain_mut().set_block(&loc, BlockType::air());
        engine.tick(40);
        assert_eq!(engine.terrain().type_and_data(&loc), BlockType::of("stone"));
    }

    #[test]
    fn test_placeholder_is_cleared_instead_of_reverted() {
        let mut config = ProtectionConfig::default();
        config.regen.protection_delay_ticks = 40;
        let mut engine = engine_with(config);
        let loc = BlockLocation::new("w", 3, 64, 3);
        engine.terrain_mut().set_block(&loc, BlockType::of("dirt"));
        engine.scheduler().add_placeholder(loc.clone());

        let verdict = engine.on_block_break(SubjectId::new(), &loc);
        assert_eq!(verdict, Verdict::PlaceholderCleared);
        assert!(engine.terrain().type_and_data(&loc).material.is_air());
        assert!(!engine.scheduler().has_pending(&loc));
    }

    #[test]
    fn test_allowed_modification_cancels_pending_reversion() {
        let mut engine = engine_with(ProtectionConfig::default());
        let member = SubjectId::new();
        engine.index_mut().add_resident(member, GroupId(1));
        let loc = BlockLocation::new("w", 3, 64, 3);
        engine.on_destructive_denial(&loc, DelayPolicy::Fixed(50)).unwrap();

        let verdict = engine.on_block_place(member, &loc, &BlockType::of("stone"));
        assert_eq!(verdict, Verdict::Proceed);
        assert!(!engine.scheduler().has_pending(&loc));
    }

    #[test]
    fn test_place_in_unregistered_world_is_not_configured() {
        let mut engine = engine_with(ProtectionConfig::default());
        let subject = SubjectId::new();
        let nether = BlockLocation::new("nether", 0, 0, 0);
        let verdict = engine.on_block_place(subject, &nether, &BlockType::of("stone"));
        match verdict {
            Verdict::Cancel { reason: Some(reason) } => assert!(reason.contains("not configured")),
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_ignite_already_cancelled_stays_cancelled() {
        let mut engine = engine_with(ProtectionConfig::default());
        engine.index_mut().update_world("w", |w| w.fire = true).unwrap();
        let loc = BlockLocation::new("w", 100, 64, 100);
        assert_eq!(engine.on_block_ignite(&loc, false), Verdict::Proceed);
        assert!(engine.on_block_ignite(&loc, true).is_cancelled());
    }

    #[test]
    fn test_wild_explosion_delay_is_staggered() {
        let mut config = ProtectionConfig::default();
        config.regen.wild_revert_delay_ticks = 100;
        config.regen.wild_revert_stagger_ticks = 20;
        let engine = engine_with(config);
        assert_eq!(engine.delay_for(DelayPolicy::WildExplosion { order: 3 }), 160);
        assert_eq!(engine.delay_for(DelayPolicy::Fixed(7)), 7);
    }

    #[test]
    fn test_cancelled_blast_withdraws_earlier_reversions() {
        let mut engine = engine_with(ProtectionConfig::default());
        engine
            .index_mut()
            .update_world("w", |w| {
                w.explosions = true;
                w.wild_revert = true;
            })
            .unwrap();

        // (20, 64, 3) is wilderness cell (1, 0); (3, 64, 3) is the claim at (0, 0)
        let wild = BlockPos::new(20, 64, 3);
        let claimed = BlockPos::new(3, 64, 3);
        let outcome = engine.on_explosion("w", &[wild, claimed]);

        assert!(outcome.cancelled);
        assert!(!outcome.suppress_drops);
        assert!(outcome.units.iter().all(|u| u.reversion.is_none()));
        assert_eq!(engine.scheduler().pending_count(), 0);
    }
}
