//! Short-lived memo of resolver outcomes per subject
//!
//! An entry is served only while it is younger than the TTL and the
//! territory index generation it was computed under has not moved.

use crate::core::types::{SubjectId, Tick};
use crate::permission::action::{ActionType, BlockType, Decision};
use crate::spatial::coord::Coordinate;
use ahash::AHashMap;

/// What a cached decision was computed for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub coordinate: Coordinate,
    pub block: BlockType,
    pub action: ActionType,
}

impl CacheKey {
    pub fn new(coordinate: Coordinate, block: BlockType, action: ActionType) -> Self {
        Self {
            coordinate,
            block,
            action,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedDecision {
    decision: Decision,
    computed_at: Tick,
    generation: u64,
}

/// Per-subject decision cache
#[derive(Debug, Clone)]
pub struct DecisionCache {
    ttl_ticks: u64,
    max_per_subject: usize,
    entries: AHashMap<SubjectId, AHashMap<CacheKey, CachedDecision>>,
}

impl DecisionCache {
    pub fn new(ttl_ticks: u64, max_per_subject: usize) -> Self {
        Self {
            ttl_ticks,
            max_per_subject: max_per_subject.max(1),
            entries: AHashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_ticks > 0
    }

    /// Fresh cached decision, if any
    pub fn get(
        &self,
        subject: SubjectId,
        key: &CacheKey,
        now: Tick,
        generation: u64,
    ) -> Option<Decision> {
        let entry = self.entries.get(&subject)?.get(key)?;
        let age = now.saturating_sub(entry.computed_at);
        let fresh = age < self.ttl_ticks && entry.generation == generation;
        fresh.then(|| entry.decision.clone())
    }

    pub fn insert(
        &mut self,
        subject: SubjectId,
        key: CacheKey,
        decision: Decision,
        now: Tick,
        generation: u64,
    ) {
        if !self.is_enabled() {
            return;
        }
        let subject_entries = self.entries.entry(subject).or_default();
        if subject_entries.len() >= self.max_per_subject && !subject_entries.contains_key(&key) {
            let oldest = subject_entries
                .iter()
                .min_by_key(|(_, cached)| cached.computed_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                subject_entries.remove(&oldest);
            }
        }
        subject_entries.insert(
            key,
            CachedDecision {
                decision,
                computed_at: now,
                generation,
            },
        );
    }

    pub fn invalidate_subject(&mut self, subject: SubjectId) {
        self.entries.remove(&subject);
    }

    /// Drop every subject's entries for one cell
    pub fn invalidate_coordinate(&mut self, coordinate: &Coordinate) {
        for subject_entries in self.entries.values_mut() {
            subject_entries.retain(|key, _| &key.coordinate != coordinate);
        }
        self.entries.retain(|_, e| !e.is_empty());
    }

    pub fn purge_expired(&mut self, now: Tick) {
        let ttl = self.ttl_ticks;
        for subject_entries in self.entries.values_mut() {
            subject_entries.retain(|_, cached| now.saturating_sub(cached.computed_at) < ttl);
        }
        self.entries.retain(|_, e| !e.is_empty());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|e| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
