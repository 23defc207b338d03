//! Territory index: the single source of truth for claims, groups and worlds
//!
//! Claims are cell-keyed hash lookups; conflict zones are stored as cell
//! rectangles. Unclaimed cells are reported as `None`, never as an error;
//! only unknown worlds and broken references fail.

use crate::core::error::{ProtectionError, Result};
use crate::core::types::{GroupId, SubjectId};
use crate::permission::action::CellStatus;
use crate::spatial::coord::{CellCoord, Coordinate, DEFAULT_CELL_SIZE};
use crate::territory::claim::{Claim, Group};
use crate::territory::world::{WorldSettings, ZoneRules};
use ahash::AHashMap;

/// Inclusive cell rectangle with its overrides
#[derive(Debug, Clone)]
struct ConflictZone {
    min: CellCoord,
    max: CellCoord,
    rules: ZoneRules,
}

impl ConflictZone {
    fn contains(&self, cell: CellCoord) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x) && (self.min.z..=self.max.z).contains(&cell.z)
    }
}

#[derive(Debug, Clone, Default)]
struct WorldEntry {
    settings: WorldSettings,
    claims: AHashMap<CellCoord, Claim>,
    zones: Vec<ConflictZone>,
}

impl WorldEntry {
    /// Most recently added zone covering `cell`
    fn zone_at(&self, cell: CellCoord) -> Option<&ZoneRules> {
        self.zones
            .iter()
            .rev()
            .find(|zone| zone.contains(cell))
            .map(|zone| &zone.rules)
    }
}

/// Read-only snapshot of everything a decision needs about one cell
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    pub coordinate: &'a Coordinate,
    pub settings: &'a WorldSettings,
    pub claim: Option<&'a Claim>,
    pub group: Option<&'a Group>,
    pub zone: Option<&'a ZoneRules>,
}

impl<'a> CellView<'a> {
    pub fn is_wilderness(&self) -> bool {
        self.claim.is_none()
    }

    pub fn in_conflict_zone(&self) -> bool {
        self.zone.is_some()
    }
}

/// Claim, group, resident and world registry
#[derive(Debug, Clone)]
pub struct TerritoryIndex {
    cell_size: i32,
    worlds: AHashMap<String, WorldEntry>,
    groups: AHashMap<GroupId, Group>,
    residents: AHashMap<SubjectId, GroupId>,
    generation: u64,
}

impl Default for TerritoryIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl TerritoryIndex {
    pub fn new(cell_size: i32) -> Self {
        Self {
            cell_size: cell_size.max(1),
            worlds: AHashMap::new(),
            groups: AHashMap::new(),
            residents: AHashMap::new(),
            generation: 0,
        }
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Incremented on every mutation; cached decisions compare against it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn world(&self, name: &str) -> Result<&WorldEntry> {
        self.worlds
            .get(name)
            .ok_or_else(|| ProtectionError::WorldNotFound(name.to_string()))
    }

    fn world_mut(&mut self, name: &str) -> Result<&mut WorldEntry> {
        self.worlds
            .get_mut(name)
            .ok_or_else(|| ProtectionError::WorldNotFound(name.to_string()))
    }

    // === WORLDS ===

    /// Register a world, replacing its settings if already known
    pub fn register_world(&mut self, name: impl Into<String>, settings: WorldSettings) {
        let name = name.into();
        self.worlds.entry(name).or_default().settings = settings;
        self.bump();
    }

    pub fn has_world(&self, name: &str) -> bool {
        self.worlds.contains_key(name)
    }

    pub fn world_settings(&self, name: &str) -> Result<&WorldSettings> {
        Ok(&self.world(name)?.settings)
    }

    /// Apply an administrative change to a world's settings
    pub fn update_world(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut WorldSettings),
    ) -> Result<()> {
        update(&mut self.world_mut(name)?.settings);
        self.bump();
        Ok(())
    }

    // === GROUPS & RESIDENTS ===

    pub fn register_group(&mut self, group: Group) {
        self.groups.insert(group.id, group);
        self.bump();
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn update_group(&mut self, id: GroupId, update: impl FnOnce(&mut Group)) -> bool {
        let Some(group) = self.groups.get_mut(&id) else {
            return false;
        };
        update(group);
        self.bump();
        true
    }

    /// Make `subject` a resident of `group`
    pub fn add_resident(&mut self, subject: SubjectId, group: GroupId) {
        self.residents.insert(subject, group);
        self.bump();
    }

    pub fn remove_resident(&mut self, subject: SubjectId) -> Option<GroupId> {
        let removed = self.residents.remove(&subject);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub fn resident_group(&self, subject: SubjectId) -> Option<GroupId> {
        self.residents.get(&subject).copied()
    }

    // === CLAIMS ===

    /// Insert a claim into a world, returning any claim it replaced
    pub fn insert_claim(&mut self, world: &str, claim: Claim) -> Result<Option<Claim>> {
        let entry = self.world_mut(world)?;
        let previous = entry.claims.insert(claim.cell, claim);
        self.bump();
        Ok(previous)
    }

    pub fn remove_claim(&mut self, world: &str, cell: CellCoord) -> Result<Option<Claim>> {
        let removed = self.world_mut(world)?.claims.remove(&cell);
        if removed.is_some() {
            self.bump();
        }
        Ok(removed)
    }

    /// Claim occupying a cell; `Ok(None)` is wilderness
    pub fn lookup(&self, coordinate: &Coordinate) -> Result<Option<&Claim>> {
        Ok(self.world(&coordinate.world)?.claims.get(&coordinate.cell))
    }

    pub fn update_claim(
        &mut self,
        coordinate: &Coordinate,
        update: impl FnOnce(&mut Claim),
    ) -> Result<bool> {
        let entry = self.world_mut(&coordinate.world)?;
        let Some(claim) = entry.claims.get_mut(&coordinate.cell) else {
            return Ok(false);
        };
        update(claim);
        self.bump();
        Ok(true)
    }

    pub fn claim_count(&self, world: &str) -> Result<usize> {
        Ok(self.world(world)?.claims.len())
    }

    /// Individual holder of the claim at `coordinate`
    ///
    /// Fails with `ClaimLookupFailure` when the holder is not a registered
    /// resident (a broken back-reference).
    pub fn claim_holder(&self, coordinate: &Coordinate) -> Result<Option<SubjectId>> {
        let Some(claim) = self.lookup(coordinate)? else {
            return Ok(None);
        };
        match claim.holder {
            None => Ok(None),
            Some(holder) if self.residents.contains_key(&holder) => Ok(Some(holder)),
            Some(holder) => Err(ProtectionError::ClaimLookupFailure {
                coordinate: coordinate.clone(),
                detail: format!("holder {} is not a registered resident", holder),
            }),
        }
    }

    // === CONFLICT ZONES ===

    /// Mark the inclusive cell rectangle spanned by `a` and `b` as a conflict zone
    ///
    /// Where zones overlap, the one added last applies.
    pub fn add_conflict_zone(
        &mut self,
        world: &str,
        a: CellCoord,
        b: CellCoord,
        rules: ZoneRules,
    ) -> Result<()> {
        let entry = self.world_mut(world)?;
        entry.zones.push(ConflictZone {
            min: CellCoord::new(a.x.min(b.x), a.z.min(b.z)),
            max: CellCoord::new(a.x.max(b.x), a.z.max(b.z)),
            rules,
        });
        self.bump();
        Ok(())
    }

    pub fn clear_conflict_zones(&mut self, world: &str) -> Result<()> {
        self.world_mut(world)?.zones.clear();
        self.bump();
        Ok(())
    }

    pub fn is_conflict_zone(&self, coordinate: &Coordinate) -> Result<bool> {
        Ok(self.zone_rules(coordinate)?.is_some())
    }

    pub fn zone_rules(&self, coordinate: &Coordinate) -> Result<Option<&ZoneRules>> {
        Ok(self.world(&coordinate.world)?.zone_at(coordinate.cell))
    }

    // === SNAPSHOTS ===

    /// Read-only view of a cell for the decision paths
    ///
    /// A claim whose owning group is not registered yields `ClaimLookupFailure`.
    pub fn view<'a>(&'a self, coordinate: &'a Coordinate) -> Result<CellView<'a>> {
        let entry = self.world(&coordinate.world)?;
        let claim = entry.claims.get(&coordinate.cell);
        let group = match claim {
            Some(claim) => Some(self.groups.get(&claim.group).ok_or_else(|| {
                ProtectionError::ClaimLookupFailure {
                    coordinate: coordinate.clone(),
                    detail: format!("owning group {:?} is not registered", claim.group),
                }
            })?),
            None => None,
        };
        let zone = entry.zone_at(coordinate.cell);

        Ok(CellView {
            coordinate,
            settings: &entry.settings,
            claim,
            group,
            zone,
        })
    }

    /// How `subject` relates to the cell in `view`
    pub fn subject_status(&self, subject: SubjectId, view: &CellView<'_>) -> CellStatus {
        let (Some(claim), Some(owner)) = (view.claim, view.group) else {
            return CellStatus::Wilderness;
        };
        if claim.holder == Some(subject) {
            return CellStatus::PlotOwner;
        }
        if claim.trusted.contains(&subject) {
            return CellStatus::Trusted;
        }

        let subject_group = self.resident_group(subject).and_then(|id| self.groups.get(&id));
        let Some(subject_group) = subject_group else {
            return CellStatus::Outsider;
        };
        if subject_group.id == owner.id {
            return CellStatus::GroupMember;
        }
        match (subject_group.alliance, owner.alliance) {
            (Some(a), Some(b)) if a == b => CellStatus::Ally,
            (Some(_), Some(_)) if view.settings.war_time => CellStatus::Enemy,
            _ => CellStatus::Outsider,
        }
    }
}
