//! Load and replay event scenarios from TOML
//!
//! A scenario seeds groups, residents, claims, conflict zones and terrain,
//! then lists host events to push through a `ProtectionEngine`. Subjects are
//! referred to by name and get a fresh `SubjectId` on load.

use crate::core::error::Result;
use crate::core::types::{AllianceId, GroupId, SubjectId, Tick};
use crate::engine::{EventKind, ExplosionOutcome, ProtectionEngine, Verdict};
use crate::host::{Notifier, TerrainHost};
use crate::permission::action::{BlockType, Material};
use crate::spatial::coord::{BlockLocation, BlockPos, CellCoord, Direction};
use crate::territory::claim::{Claim, Group, PermissionFlags, NOT_FOR_SALE};
use crate::territory::world::ZoneRules;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GroupSpec {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub alliance: Option<u32>,
    #[serde(default)]
    pub fire: bool,
    #[serde(default)]
    pub explosions: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResidentSpec {
    pub name: String,
    pub group: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSpec {
    pub world: String,
    pub x: i32,
    pub z: i32,
    pub group: u32,
    #[serde(default)]
    pub holder: Option<String>,
    #[serde(default)]
    pub trusted: Vec<String>,
    #[serde(default)]
    pub flags: PermissionFlags,
    #[serde(default = "not_for_sale")]
    pub price: i64,
}

fn not_for_sale() -> i64 {
    NOT_FOR_SALE
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSpec {
    pub world: String,
    pub min: [i32; 2],
    pub max: [i32; 2],
    #[serde(default)]
    pub rules: ZoneRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockSpec {
    pub world: String,
    pub at: [i32; 3],
    pub material: Material,
    #[serde(default)]
    pub data: u8,
}

/// One host event to replay
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioEvent {
    Break {
        subject: String,
        world: String,
        at: [i32; 3],
    },
    Place {
        subject: String,
        world: String,
        at: [i32; 3],
        material: Material,
    },
    Burn {
        world: String,
        at: [i32; 3],
    },
    Ignite {
        world: String,
        at: [i32; 3],
        #[serde(default)]
        cancelled: bool,
    },
    Piston {
        world: String,
        blocks: Vec<[i32; 3]>,
        direction: Direction,
        #[serde(default)]
        retract: bool,
    },
    Explode {
        world: String,
        blocks: Vec<[i32; 3]>,
    },
    Tick {
        ticks: Tick,
    },
}

/// Parsed scenario file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub groups: Vec<GroupSpec>,
    pub residents: Vec<ResidentSpec>,
    pub claims: Vec<ClaimSpec>,
    pub zones: Vec<ZoneSpec>,
    pub blocks: Vec<BlockSpec>,
    pub events: Vec<ScenarioEvent>,
}

/// Result of replaying one event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EventReport {
    Verdict { index: usize, event: EventKind, verdict: Verdict },
    Explosion { index: usize, outcome: ExplosionOutcome },
    Tick { index: usize, now: Tick, restored: Vec<BlockLocation> },
}

fn pos(at: [i32; 3]) -> BlockPos {
    BlockPos::new(at[0], at[1], at[2])
}

fn subject_id(subjects: &mut AHashMap<String, SubjectId>, name: &str) -> SubjectId {
    *subjects
        .entry(name.to_string())
        .or_insert_with(SubjectId::new)
}

fn location(world: &str, at: [i32; 3]) -> BlockLocation {
    BlockLocation {
        world: world.to_string(),
        pos: pos(at),
    }
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Seed the engine and return the name -> subject mapping
    pub fn seed<T: TerrainHost, N: Notifier>(
        &self,
        engine: &mut ProtectionEngine<T, N>,
    ) -> Result<AHashMap<String, SubjectId>> {
        let mut subjects: AHashMap<String, SubjectId> = AHashMap::new();
        let mut subject = |name: &str| subject_id(&mut subjects, name);

        for entry in &self.groups {
            let mut group = Group::new(GroupId(entry.id), entry.name.clone());
            group.alliance = entry.alliance.map(AllianceId);
            group.fire = entry.fire;
            group.explosions = entry.explosions;
            engine.index_mut().register_group(group);
        }

        for entry in &self.residents {
            let id = subject(&entry.name);
            engine.index_mut().add_resident(id, GroupId(entry.group));
        }

        for entry in &self.claims {
            let mut claim = Claim::new(CellCoord::new(entry.x, entry.z), GroupId(entry.group))
                .with_flags(entry.flags)
                .with_price(entry.price);
            if let Some(holder) = &entry.holder {
                claim = claim.with_holder(subject(holder));
            }
            for name in &entry.trusted {
                claim = claim.trust(subject(name));
            }
            engine.index_mut().insert_claim(&entry.world, claim)?;
        }

        for entry in &self.zones {
            engine.index_mut().add_conflict_zone(
                &entry.world,
                CellCoord::new(entry.min[0], entry.min[1]),
                CellCoord::new(entry.max[0], entry.max[1]),
                entry.rules.clone(),
            )?;
        }

        for entry in &self.blocks {
            let block = BlockType::new(entry.material.clone(), entry.data);
            engine
                .terrain_mut()
                .set_block(&location(&entry.world, entry.at), block);
        }

        Ok(subjects)
    }

    /// Push every event through the engine in order
    pub fn replay<T: TerrainHost, N: Notifier>(
        &self,
        engine: &mut ProtectionEngine<T, N>,
        subjects: &mut AHashMap<String, SubjectId>,
    ) -> Vec<EventReport> {
        let mut reports = Vec::with_capacity(self.events.len());
        for (index, event) in self.events.iter().enumerate() {
            let mut subject = |name: &str| subject_id(subjects, name);
            let report = match event {
                ScenarioEvent::Break { subject: name, world, at } => {
                    let verdict = engine.on_block_break(subject(name), &location(world, *at));
                    if !verdict.is_cancelled() {
                        engine.terrain_mut().set_block(&location(world, *at), BlockType::air());
                    }
                    EventReport::Verdict { index, event: EventKind::BlockBreak, verdict }
                }
                ScenarioEvent::Place { subject: name, world, at, material } => {
                    let placed = BlockType::of(material.clone());
                    let target = location(world, *at);
                    let verdict = engine.on_block_place(subject(name), &target, &placed);
                    if !verdict.is_cancelled() {
                        engine.terrain_mut().set_block(&target, placed);
                    }
                    EventReport::Verdict { index, event: EventKind::BlockPlace, verdict }
                }
                ScenarioEvent::Burn { world, at } => {
                    let verdict = engine.on_block_burn(&location(world, *at));
                    EventReport::Verdict { index, event: EventKind::BlockBurn, verdict }
                }
                ScenarioEvent::Ignite { world, at, cancelled } => {
                    let verdict = engine.on_block_ignite(&location(world, *at), *cancelled);
                    EventReport::Verdict { index, event: EventKind::BlockIgnite, verdict }
                }
                ScenarioEvent::Piston { world, blocks, direction, retract } => {
                    let kind = if *retract {
                        EventKind::PistonRetract
                    } else {
                        EventKind::PistonExtend
                    };
                    let blocks: Vec<BlockPos> = blocks.iter().copied().map(pos).collect();
                    let verdict = engine.on_piston(kind, world, &blocks, *direction);
                    EventReport::Verdict { index, event: kind, verdict }
                }
                ScenarioEvent::Explode { world, blocks } => {
                    let blocks: Vec<BlockPos> = blocks.iter().copied().map(pos).collect();
                    let outcome = engine.on_explosion(world, &blocks);
                    if !outcome.cancelled {
                        for unit in &outcome.units {
                            engine.terrain_mut().set_block(&unit.location, BlockType::air());
                        }
                    }
                    EventReport::Explosion { index, outcome }
                }
                ScenarioEvent::Tick { ticks } => {
                    let restored = engine.tick(*ticks);
                    EventReport::Tick { index, now: engine.scheduler().now(), restored }
                }
            };
            reports.push(report);
        }
        reports
    }
}
