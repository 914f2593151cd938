//! Query engine
//!
//! Runs one query end to end:
//!
//! ```text
//! snapshot ─▶ session.ingest ─▶ score + synthesize (fan-out) ─▶ rank
//!          ─▶ resolve ─▶ fitness + session record ─▶ log + events
//! ```
//!
//! One logical query runs at a time, serialized by a query gate.
//! [`Engine::try_process`] rejects overlap instead of waiting. Scoring reads
//! one stable [`SessionView`] and one `Arc` catalog captured at query start
//! and fans out across `spawn_blocking` chunks bounded by a semaphore.
//! Resolution and every write happen after both the fitness and session
//! locks are held, with no await in between, so a query cancelled by
//! [`Engine::process_with_timeout`] records nothing in the fitness registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, SharedCatalog, SpecialistCatalog};
use crate::config::{ConfigError, EngineConfig};
use crate::events::{EngineEvent, SharedEventBus};
use crate::fitness::{EvolutionReport, FitnessRegistry, FitnessSnapshot};
use crate::log::{ConversationEntry, ConversationLog};
use crate::resolver::{rank_order, Candidate, ConsensusProtocol, ConsensusResolver, ConsensusResult};
use crate::scoring::{PreparedQuery, ScoringEngine};
use crate::session::{SessionView, SharedSession};
use crate::snapshot::{ContextSnapshot, SnapshotProvider};
use crate::synthesis;
use crate::text::preview;

/// Characters of the query kept in log and event previews
const PREVIEW_CHARS: usize = 80;

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Another query is already in flight")]
    Busy,

    #[error("Query timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Shared reference to an Engine
pub type SharedEngine = Arc<Engine>;

/// Read-only inputs shared by every scoring chunk of one query
struct ScoringPass {
    catalog: SharedCatalog,
    scorer: Arc<ScoringEngine>,
    prepared: PreparedQuery,
    snapshot: ContextSnapshot,
    view: SessionView,
}

/// Candidates from one chunk, plus how many templates it scored
struct ChunkOutcome {
    scored: usize,
    candidates: Vec<Candidate>,
}

impl ScoringPass {
    fn run_chunk(&self, start: usize, end: usize) -> ChunkOutcome {
        let templates = &self.catalog.all()[start..end];
        let mut candidates = Vec::new();
        for template in templates {
            let began = Instant::now();
            let breakdown = self
                .scorer
                .evaluate(template, &self.prepared, &self.snapshot, &self.view);
            let confidence = breakdown.confidence();
            if !self.scorer.survives(confidence) {
                continue;
            }
            let text = synthesis::compose(
                template,
                &breakdown.matched_keywords,
                &self.prepared.raw,
                &self.snapshot,
                &self.view,
            );
            candidates.push(Candidate {
                species: template.species.clone(),
                label: template.label.clone(),
                domain: template.domain.clone(),
                confidence,
                text,
                latency: began.elapsed(),
            });
        }
        ChunkOutcome {
            scored: templates.len(),
            candidates,
        }
    }
}

/// Multi-specialist query engine
pub struct Engine {
    config: EngineConfig,
    catalog: RwLock<SharedCatalog>,
    fitness: Mutex<FitnessRegistry>,
    query_gate: Mutex<()>,
    scorer: Arc<ScoringEngine>,
    resolver: ConsensusResolver,
    log: Option<Arc<dyn ConversationLog>>,
    events: Option<SharedEventBus>,
}

impl Engine {
    /// Build an engine over `catalog`, validating both inputs
    pub fn new(catalog: SpecialistCatalog, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        catalog.validate()?;
        info!(
            specialists = catalog.count(),
            workers = config.workers,
            protocol = %config.default_protocol,
            "Consensus engine ready"
        );
        Ok(Self {
            scorer: Arc::new(ScoringEngine::new(config.scoring.clone())),
            resolver: ConsensusResolver::new(config.resolver.clone()),
            fitness: Mutex::new(FitnessRegistry::new(config.evolution.clone())),
            catalog: RwLock::new(catalog.shared()),
            query_gate: Mutex::new(()),
            log: None,
            events: None,
            config,
        })
    }

    /// Attach a conversation log; one entry is appended per resolved query
    pub fn with_log(mut self, log: Arc<dyn ConversationLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Seed the fitness registry from a previous run and write the restored
    /// priors into the catalog the next query scores against
    pub fn with_fitness(mut self, snapshot: FitnessSnapshot) -> Self {
        let fitness = self.fitness.get_mut();
        fitness.restore(snapshot);

        let catalog = self.catalog.get_mut();
        let mut next = SpecialistCatalog::clone(&**catalog);
        fitness.write_back(&mut next);
        *catalog = next.shared();
        self
    }

    pub fn shared(self) -> SharedEngine {
        Arc::new(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The catalog the next query will score against
    pub async fn catalog(&self) -> SharedCatalog {
        self.catalog.read().await.clone()
    }

    pub async fn fitness_snapshot(&self) -> FitnessSnapshot {
        self.fitness.lock().await.snapshot()
    }

    pub async fn fitness(&self, species: &str) -> f64 {
        self.fitness.lock().await.fitness(species)
    }

    // ── Query entry points ────────────────────────────────────────────────

    /// Process a query with the configured default protocol, waiting for
    /// any in-flight query to finish first
    pub async fn process(
        &self,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SharedSession,
    ) -> ConsensusResult {
        self.process_with(query, snapshot, session, self.config.default_protocol)
            .await
    }

    /// Process a query under an explicit protocol
    pub async fn process_with(
        &self,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SharedSession,
        protocol: ConsensusProtocol,
    ) -> ConsensusResult {
        let _gate = self.query_gate.lock().await;
        self.run(query, snapshot, session, protocol).await
    }

    /// Process a query unless another one is in flight
    pub async fn try_process(
        &self,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SharedSession,
    ) -> EngineResult<ConsensusResult> {
        let Ok(_gate) = self.query_gate.try_lock() else {
            warn!(query = %preview(query, PREVIEW_CHARS), "Rejected overlapping query");
            self.abort_event(query, "busy");
            return Err(EngineError::Busy);
        };
        Ok(self
            .run(query, snapshot, session, self.config.default_protocol)
            .await)
    }

    /// Process a query, abandoning it if it has not resolved within `timeout`.
    ///
    /// A timed-out query records nothing in the fitness registry.
    pub async fn process_with_timeout(
        &self,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SharedSession,
        timeout: Duration,
    ) -> EngineResult<ConsensusResult> {
        match tokio::time::timeout(timeout, self.process(query, snapshot, session)).await {
            Ok(result) => Ok(result),
            Err(_) => {
                let timeout_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
                warn!(
                    query = %preview(query, PREVIEW_CHARS),
                    timeout_ms,
                    "Query timed out before resolution"
                );
                self.abort_event(query, "timeout");
                Err(EngineError::TimedOut { timeout_ms })
            }
        }
    }

    /// Capture a snapshot from `provider`, then process
    pub async fn process_captured(
        &self,
        query: &str,
        provider: &dyn SnapshotProvider,
        session: &SharedSession,
    ) -> ConsensusResult {
        let snapshot = provider.capture();
        self.process(query, &snapshot, session).await
    }

    // ── Evolution ─────────────────────────────────────────────────────────

    /// Prune weak species and write fitness back into a fresh catalog.
    ///
    /// Holds the query gate, so it never overlaps a scoring pass.
    pub async fn evolve(&self) -> EvolutionReport {
        let _gate = self.query_gate.lock().await;
        let mut fitness = self.fitness.lock().await;
        let mut catalog = self.catalog.write().await;

        let mut next = SpecialistCatalog::clone(&**catalog);
        let report = fitness.evolve(&mut next);
        *catalog = next.shared();

        self.publish(EngineEvent::EvolutionCompleted {
            generation: report.generation,
            pruned: report.pruned.clone(),
            survivors: report.survivors,
            timestamp: Utc::now(),
        });
        report
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    async fn run(
        &self,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SharedSession,
        protocol: ConsensusProtocol,
    ) -> ConsensusResult {
        let started = Instant::now();

        let view = {
            let mut session = session.lock().await;
            session.ingest(query, snapshot);
            session.view()
        };

        let pass = Arc::new(ScoringPass {
            catalog: self.catalog().await,
            scorer: Arc::clone(&self.scorer),
            prepared: PreparedQuery::new(query, snapshot),
            snapshot: snapshot.clone(),
            view,
        });
        let (scored, mut candidates) = self.fan_out(&pass).await;
        candidates.sort_by(rank_order);

        debug!(
            query = %preview(query, PREVIEW_CHARS),
            scored,
            survivors = candidates.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scoring pass complete"
        );
        self.publish(EngineEvent::QueryScored {
            query_preview: preview(query, PREVIEW_CHARS),
            scored,
            survivors: candidates.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        let result = {
            let mut fitness = self.fitness.lock().await;
            let mut session = session.lock().await;

            for candidate in &candidates {
                fitness.record_spawn(&candidate.species);
            }
            let result = self.resolver.resolve(&candidates, protocol);
            if !result.is_no_consensus() {
                fitness.record_success(&result.winning_species);
                session.record_winner(&result.winning_species, snapshot.time_bucket);
            }
            result
        };

        if let Some(log) = &self.log {
            log.append(ConversationEntry::new(
                query,
                result.final_response.as_str(),
                result.winning_species.as_str(),
            ));
        }

        if result.is_no_consensus() {
            info!(query = %preview(query, PREVIEW_CHARS), "No consensus reached");
            self.publish(EngineEvent::NoConsensus {
                query_preview: preview(query, PREVIEW_CHARS),
                protocol: protocol.to_string(),
                timestamp: Utc::now(),
            });
        } else {
            info!(
                species = %result.winning_species,
                protocol = %protocol,
                participants = result.participant_count,
                strength = result.consensus_strength,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Consensus reached"
            );
            self.publish(EngineEvent::ConsensusReached {
                winning_species: result.winning_species.clone(),
                protocol: protocol.to_string(),
                participant_count: result.participant_count,
                consensus_strength: result.consensus_strength,
                timestamp: Utc::now(),
            });
        }
        result
    }

    /// Score every template across at most `workers` blocking chunks
    async fn fan_out(&self, pass: &Arc<ScoringPass>) -> (usize, Vec<Candidate>) {
        let total = pass.catalog.count();
        if total == 0 {
            return (0, Vec::new());
        }
        let workers = self.config.workers.max(1);
        let chunk_size = total.div_ceil(workers);
        let sem = Arc::new(Semaphore::new(workers));
        let mut join_set: JoinSet<ChunkOutcome> = JoinSet::new();

        for start in (0..total).step_by(chunk_size) {
            let end = (start + chunk_size).min(total);
            let pass = Arc::clone(pass);
            let sem = Arc::clone(&sem);
            join_set.spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return ChunkOutcome {
                        scored: 0,
                        candidates: Vec::new(),
                    };
                };
                match tokio::task::spawn_blocking(move || pass.run_chunk(start, end)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(error = %e, start, end, "Scoring chunk panicked");
                        ChunkOutcome {
                            scored: 0,
                            candidates: Vec::new(),
                        }
                    }
                }
            });
        }

        let mut scored = 0;
        let mut candidates = Vec::new();
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(outcome) => {
                    scored += outcome.scored;
                    candidates.extend(outcome.candidates);
                }
                Err(e) => warn!(error = %e, "Scoring worker panicked"),
            }
        }
        (scored, candidates)
    }

    fn abort_event(&self, query: &str, reason: &str) {
        self.publish(EngineEvent::QueryAborted {
            query_preview: preview(query, PREVIEW_CHARS),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: EngineEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpecialistTemplate;
    use crate::events::EventBus;
    use crate::log::MemoryConversationLog;
    use crate::session::SessionContext;
    use crate::snapshot::TimeBucket;

    fn small_catalog() -> SpecialistCatalog {
        SpecialistCatalog::from_templates(vec![
            SpecialistTemplate::new("code.rust.debug", "Rust Debugging", "rust", &["rust", "bug", "panic"]),
            SpecialistTemplate::new("code.go", "Go", "go", &["go", "goroutine"]),
            SpecialistTemplate::new("wellbeing.sleep", "Sleep", "sleep", &["sleep", "tired"]),
        ])
    }

    fn snapshot() -> ContextSnapshot {
        ContextSnapshot::new("com.example.editor", "Editor").with_time_bucket(TimeBucket::Afternoon)
    }

    #[tokio::test]
    async fn test_process_records_winner_and_spawns() {
        let log = Arc::new(MemoryConversationLog::default());
        let engine = Engine::new(small_catalog(), EngineConfig::default())
            .unwrap()
            .with_log(log.clone());
        let session = SessionContext::default().shared();

        let result = engine
            .process("this rust panic looks like a bug", &snapshot(), &session)
            .await;
        assert_eq!(result.winning_species, "code.rust.debug");
        assert_eq!(engine.fitness("code.rust.debug").await, 1.0);
        assert_eq!(log.len(), 1);

        let session = session.lock().await;
        assert_eq!(session.wins("code.rust.debug"), 1);
        assert_eq!(session.bucket_wins(TimeBucket::Afternoon, "code.rust.debug"), 1);
    }

    #[tokio::test]
    async fn test_single_worker_matches_many_workers() {
        let config_one = EngineConfig {
            workers: 1,
            ..EngineConfig::default()
        };
        let config_many = EngineConfig {
            workers: 7,
            ..EngineConfig::default()
        };
        let one = Engine::new(SpecialistCatalog::standard(), config_one).unwrap();
        let many = Engine::new(SpecialistCatalog::standard(), config_many).unwrap();
        let query = "how do I fix a goroutine leak in go";

        let a = one
            .process(query, &snapshot(), &SessionContext::default().shared())
            .await;
        let b = many
            .process(query, &snapshot(), &SessionContext::default().shared())
            .await;
        assert_eq!(a.winning_species, b.winning_species);
        assert_eq!(a.breakdown.len(), b.breakdown.len());
        for (x, y) in a.breakdown.iter().zip(&b.breakdown) {
            assert_eq!(x.species, y.species);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[tokio::test]
    async fn test_events_follow_the_query() {
        let bus = EventBus::new().shared();
        let mut rx = bus.subscribe();
        let engine = Engine::new(small_catalog(), EngineConfig::default())
            .unwrap()
            .with_event_bus(bus);
        let session = SessionContext::default().shared();

        engine.process("rust bug", &snapshot(), &session).await;
        assert_eq!(rx.recv().await.unwrap().event_type(), "query_scored");
        assert_eq!(rx.recv().await.unwrap().event_type(), "consensus_reached");

        let fresh = SessionContext::default().shared();
        engine.process("zzz qqq", &snapshot(), &fresh).await;
        assert_eq!(rx.recv().await.unwrap().event_type(), "query_scored");
        assert_eq!(rx.recv().await.unwrap().event_type(), "no_consensus");
    }

    #[tokio::test]
    async fn test_evolve_swaps_catalog() {
        let config = EngineConfig {
            default_protocol: ConsensusProtocol::Majority,
            ..EngineConfig::default()
        };
        let engine = Engine::new(small_catalog(), config).unwrap();
        let session = SessionContext::default().shared();
        let before = engine.catalog().await;

        for _ in 0..3 {
            engine.process("rust bug", &snapshot(), &session).await;
        }
        let report = engine.evolve().await;
        assert_eq!(report.generation, 1);
        assert!(report.pruned.is_empty());

        let after = engine.catalog().await;
        assert!(!Arc::ptr_eq(&before, &after));
        let rust = after.get("code.rust.debug").unwrap();
        assert_eq!(rust.spawn_count, 3);
        assert_eq!(rust.success_count, 3);
        assert_eq!(before.get("code.rust.debug").unwrap().spawn_count, 0);
    }

    #[tokio::test]
    async fn test_restored_fitness_reaches_scoring() {
        use crate::fitness::SpeciesRecord;
        use crate::session::SessionView;

        let mut snapshot_in = FitnessSnapshot::default();
        snapshot_in
            .records
            .insert("code.rust.debug".into(), SpeciesRecord { spawns: 40, wins: 0 });
        snapshot_in
            .records
            .insert("code.go".into(), SpeciesRecord { spawns: 10, wins: 9 });

        let engine = Engine::new(small_catalog(), EngineConfig::default())
            .unwrap()
            .with_fitness(snapshot_in);
        let catalog = engine.catalog().await;

        let rust = catalog.get("code.rust.debug").unwrap();
        assert_eq!(rust.fitness_score, engine.fitness("code.rust.debug").await);
        assert_eq!(rust.fitness_score, 0.0);
        assert_eq!(rust.spawn_count, 40);
        assert_eq!(catalog.get("code.go").unwrap().fitness_score, 0.9);
        assert_eq!(catalog.get("wellbeing.sleep").unwrap().fitness_score, 0.5);

        let scorer = ScoringEngine::default();
        let query = PreparedQuery::new("rust panic", &snapshot());
        let rust_prior = scorer
            .evaluate(rust, &query, &snapshot(), &SessionView::default())
            .fitness_prior;
        let go_prior = scorer
            .evaluate(catalog.get("code.go").unwrap(), &query, &snapshot(), &SessionView::default())
            .fitness_prior;
        assert_eq!(rust_prior, 0.0);
        assert!(go_prior > 0.08);
    }

    #[test]
    fn test_new_rejects_invalid_inputs() {
        let config = EngineConfig {
            workers: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(small_catalog(), config),
            Err(EngineError::Config(_))
        ));

        let dup = SpecialistCatalog::from_templates(vec![
            SpecialistTemplate::new("a", "A", "a", &[]),
            SpecialistTemplate::new("a", "A", "a", &[]),
        ]);
        assert!(matches!(
            Engine::new(dup, EngineConfig::default()),
            Err(EngineError::Catalog(_))
        ));
    }
}
