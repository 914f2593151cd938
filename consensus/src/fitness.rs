//! Fitness registry and evolution
//!
//! Tracks per-species spawn/win counters across queries. `fitness` is the
//! win rate, defaulting to neutral for species never spawned. A periodic
//! [`FitnessRegistry::evolve`] pass prunes species that have had a fair
//! sample and still rarely win, then writes updated fitness back into the
//! catalog so the next scoring pass sees the new priors.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{SpecialistCatalog, NEUTRAL_FITNESS};

/// Prune criteria applied by `evolve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionPolicy {
    /// Species need strictly more spawns than this before they can be pruned
    pub min_sample: u64,
    /// Win rate below which a sampled species is pruned
    pub prune_floor: f64,
}

impl Default for EvolutionPolicy {
    fn default() -> Self {
        Self {
            min_sample: 10,
            prune_floor: 0.1,
        }
    }
}

impl EvolutionPolicy {
    pub fn should_prune(&self, record: &SpeciesRecord) -> bool {
        record.spawns > self.min_sample && record.win_rate() < self.prune_floor
    }
}

/// Spawn/win counters for one species
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub spawns: u64,
    pub wins: u64,
}

impl SpeciesRecord {
    /// wins / spawns, neutral when never spawned
    pub fn win_rate(&self) -> f64 {
        if self.spawns == 0 {
            return NEUTRAL_FITNESS;
        }
        (self.wins as f64 / self.spawns as f64).clamp(0.0, 1.0)
    }
}

/// Summary of one evolution pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub generation: u64,
    pub pruned: Vec<String>,
    pub survivors: usize,
}

/// Serializable registry state, for carrying priors across restarts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSnapshot {
    pub generation: u64,
    pub records: BTreeMap<String, SpeciesRecord>,
}

/// Per-species performance counters
#[derive(Debug, Clone, Default)]
pub struct FitnessRegistry {
    records: HashMap<String, SpeciesRecord>,
    generation: u64,
    policy: EvolutionPolicy,
}

impl FitnessRegistry {
    pub fn new(policy: EvolutionPolicy) -> Self {
        Self {
            records: HashMap::new(),
            generation: 0,
            policy,
        }
    }

    pub fn policy(&self) -> &EvolutionPolicy {
        &self.policy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current fitness for a species; neutral when unseen
    pub fn fitness(&self, species: &str) -> f64 {
        self.records
            .get(species)
            .map_or(NEUTRAL_FITNESS, SpeciesRecord::win_rate)
    }

    pub fn record(&self, species: &str) -> SpeciesRecord {
        self.records.get(species).copied().unwrap_or_default()
    }

    /// Count a candidate that survived the discard threshold
    pub fn record_spawn(&mut self, species: &str) {
        self.records.entry(species.to_string()).or_default().spawns += 1;
    }

    /// Count a declared winner
    pub fn record_success(&mut self, species: &str) {
        let record = self.records.entry(species.to_string()).or_default();
        record.wins += 1;
        record.spawns = record.spawns.max(record.wins);
    }

    /// Run one evolution pass over `catalog`.
    ///
    /// Removes species meeting the prune criteria (from both the catalog and
    /// the registry) and writes fitness and counters back into survivors.
    pub fn evolve(&mut self, catalog: &mut SpecialistCatalog) -> EvolutionReport {
        self.generation += 1;

        let mut pruned: Vec<String> = self
            .records
            .iter()
            .filter(|(_, record)| self.policy.should_prune(record))
            .map(|(species, _)| species.clone())
            .collect();
        pruned.sort();

        for species in &pruned {
            self.records.remove(species);
            debug!(species = %species, "Pruned species");
        }
        catalog.retain(|t| !pruned.contains(&t.species));
        self.write_back(catalog);

        let report = EvolutionReport {
            generation: self.generation,
            pruned,
            survivors: catalog.count(),
        };
        info!(
            generation = report.generation,
            pruned = report.pruned.len(),
            survivors = report.survivors,
            "Evolution pass complete"
        );
        report
    }

    /// Copy fitness and counters into every template of `catalog`
    pub fn write_back(&self, catalog: &mut SpecialistCatalog) {
        for template in catalog.templates_mut() {
            let record = self.record(&template.species);
            template.fitness_score = record.win_rate();
            template.spawn_count = record.spawns;
            template.success_count = record.wins;
        }
    }

    pub fn snapshot(&self) -> FitnessSnapshot {
        FitnessSnapshot {
            generation: self.generation,
            records: self
                .records
                .iter()
                .map(|(species, record)| (species.clone(), *record))
                .collect(),
        }
    }

    /// Replace counters with a previously exported snapshot
    pub fn restore(&mut self, snapshot: FitnessSnapshot) {
        self.generation = snapshot.generation;
        self.records = snapshot
            .records
            .into_iter()
            .map(|(species, mut record)| {
                record.spawns = record.spawns.max(record.wins);
                (species, record)
            })
            .collect();
    }
}
