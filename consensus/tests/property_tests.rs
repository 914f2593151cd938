//! Property tests: invariants checked across many generated inputs.
//!
//! - Scores stay within [0, 1] for every template and input mix
//! - Keyword presence strictly raises an unsaturated score
//! - Session buffers never exceed their limits
//! - Resolver protocols keep their Majority/Synthesis relationships
//! - Evolution never leaves a survivor that meets the prune criteria

use std::time::Duration;

use consensus_engine::{
    Candidate, ConsensusProtocol, ConsensusResolver, ContextSnapshot, EvolutionPolicy,
    FitnessRegistry, IntentSignal, OperatingMode, ScoringEngine, SessionContext, SessionLimits,
    SessionView, SpecialistCatalog, SpecialistTemplate, TimeBucket,
};

const QUERIES: &[&str] = &[
    "",
    "   ",
    "fix this bug in my swift code",
    "how do I deploy a docker container to kubernetes",
    "write a song about the ocean",
    "¿cómo puedo dormir mejor?",
    "compare postgres vs mysql for analytics workloads with heavy joins",
    "memory leak memory leak memory leak rust rust rust",
    "🚀🚀🚀",
];

fn snapshots() -> Vec<ContextSnapshot> {
    let mut out = Vec::new();
    for (i, bucket) in TimeBucket::all().iter().enumerate() {
        let mode = [
            OperatingMode::Normal,
            OperatingMode::Focus,
            OperatingMode::Creative,
            OperatingMode::Relax,
            OperatingMode::Ship,
        ][i % 5];
        let mut snap = ContextSnapshot::new("com.apple.dt.Xcode", "Xcode")
            .with_time_bucket(*bucket)
            .with_mode(mode);
        if i % 2 == 0 {
            snap = snap
                .with_clipboard("fn main() { let mut v = Vec::new(); }")
                .with_playback("Track", "Artist");
        }
        out.push(snap);
    }
    out
}

fn saturated_view(catalog: &SpecialistCatalog) -> SessionView {
    SessionView {
        intent: IntentSignal::Debugging,
        momentum: catalog.all().iter().map(|t| t.species.clone()).collect(),
        detected_languages: ["swift", "rust", "python", "c"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        mode_bias: vec!["code".into(), "debug".into(), "creative".into()],
    }
}

// ── Property: scores are bounded ───────────────────────────────────

#[test]
fn prop_scores_bounded() {
    let catalog = SpecialistCatalog::standard();
    let engine = ScoringEngine::default();
    let views = [SessionView::default(), saturated_view(&catalog)];

    for snapshot in snapshots() {
        for view in &views {
            for query in QUERIES {
                for template in catalog.all() {
                    let score = engine.score(template, query, &snapshot, view);
                    assert!(
                        (0.0..=1.0).contains(&score),
                        "{} scored {score} for {query:?}",
                        template.species
                    );
                }
            }
        }
    }
}

#[test]
fn prop_out_of_range_fitness_still_bounded() {
    let engine = ScoringEngine::default();
    let snapshot = ContextSnapshot::default();
    let view = SessionView::default();
    for fitness in [f64::NAN, -3.0, 0.0, 1.0, 7.5, f64::INFINITY] {
        let mut t = SpecialistTemplate::new("code.rust", "Rust", "rust", &["rust"]);
        t.fitness_score = fitness;
        let score = engine.score(&t, "rust", &snapshot, &view);
        assert!((0.0..=1.0).contains(&score), "fitness {fitness} gave {score}");
    }
}

// ── Property: keyword presence raises unsaturated scores ───────────

#[test]
fn prop_keyword_presence_raises_score() {
    let catalog = SpecialistCatalog::standard();
    let engine = ScoringEngine::default();
    let snapshot = ContextSnapshot::new("com.example.none", "None").with_time_bucket(TimeBucket::Afternoon);
    let view = SessionView::default();

    for template in catalog.all() {
        let Some(keyword) = template.keywords.iter().find(|k| !k.contains(' ')) else {
            continue;
        };
        let base = "please help";
        let without = engine.score(template, base, &snapshot, &view);
        let with = engine.score(template, &format!("{base} {keyword}"), &snapshot, &view);
        if without < 1.0 {
            assert!(with > without, "{}: {with} <= {without}", template.species);
        }
    }
}

// ── Property: session buffers stay bounded ─────────────────────────

#[test]
fn prop_session_buffers_bounded() {
    for (queries, momentum) in [(1, 1), (3, 2), (50, 10), (7, 20)] {
        let limits = SessionLimits {
            query_capacity: queries,
            momentum_capacity: momentum,
            intent_window: 5,
        };
        let mut session = SessionContext::new(limits);
        let snapshot = ContextSnapshot::default();
        for i in 0..200 {
            session.ingest(&format!("query number {i}"), &snapshot);
            session.record_winner(&format!("species.{}", i % 13), TimeBucket::Morning);
            assert!(session.recent_queries().count() <= queries);
            assert!(session.momentum().count() <= momentum);
        }
        assert_eq!(session.queries_ingested(), 200);
        assert_eq!(session.momentum().last(), Some("species.4"));
    }
}

// ── Property: protocol relationships ───────────────────────────────

fn candidates(seed: u64, n: usize) -> Vec<Candidate> {
    // Small LCG keeps the sets varied without a rand dependency.
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let confidence = ((state >> 33) % 1000) as f64 / 1000.0;
            Candidate {
                species: format!("s.{i:03}"),
                label: format!("S{i}"),
                domain: "test".into(),
                confidence,
                text: format!("text {i}"),
                latency: Duration::from_micros(i as u64),
            }
        })
        .collect()
}

#[test]
fn prop_protocol_relationships_hold() {
    let resolver = ConsensusResolver::default();
    let floor = resolver.config().synthesis_floor;
    let threshold = resolver.config().unanimous_threshold;

    for seed in 0..200 {
        let cands = candidates(seed, (seed % 9) as usize);
        let majority = resolver.resolve(&cands, ConsensusProtocol::Majority);
        let tournament = resolver.resolve(&cands, ConsensusProtocol::Tournament);
        let synthesis = resolver.resolve(&cands, ConsensusProtocol::Synthesis { top_n: 3 });
        let unanimous = resolver.resolve(&cands, ConsensusProtocol::Unanimous);

        if cands.is_empty() {
            assert!(majority.is_no_consensus());
            assert!(synthesis.is_no_consensus());
            continue;
        }

        let best = cands
            .iter()
            .map(|c| c.confidence)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(majority.consensus_strength, best);
        assert_eq!(tournament.winning_species, majority.winning_species);
        assert_eq!(tournament.final_response, majority.final_response);

        let above_floor = cands.iter().filter(|c| c.confidence > floor).count();
        if above_floor <= 1 {
            assert_eq!(synthesis.final_response, majority.final_response);
        }

        let expected = if cands.iter().all(|c| c.confidence > threshold) {
            &majority
        } else {
            &synthesis
        };
        assert_eq!(unanimous.final_response, expected.final_response);
        assert_eq!(unanimous.winning_species, expected.winning_species);
    }
}

// ── Property: evolution respects prune criteria ────────────────────

#[test]
fn prop_evolution_leaves_no_prunable_survivor() {
    for (min_sample, prune_floor) in [(0, 0.5), (5, 0.1), (10, 0.1), (30, 0.9)] {
        let policy = EvolutionPolicy {
            min_sample,
            prune_floor,
        };
        let mut registry = FitnessRegistry::new(policy.clone());
        let mut catalog = SpecialistCatalog::standard();

        for (i, template) in catalog.all().iter().enumerate() {
            let spawns = (i * 7) % 40;
            for _ in 0..spawns {
                registry.record_spawn(&template.species);
            }
            for _ in 0..(spawns * (i % 5) / 10) {
                registry.record_success(&template.species);
            }
        }

        let report = registry.evolve(&mut catalog);
        assert_eq!(report.survivors, catalog.count());
        for template in catalog.all() {
            assert!(!policy.should_prune(&registry.record(&template.species)));
            assert!((0.0..=1.0).contains(&template.fitness_score));
        }
        catalog.validate().unwrap();
    }
}
