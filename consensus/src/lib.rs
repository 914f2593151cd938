//! Specialist Consensus Engine
//!
//! Routes a free-text query across a large pool of narrow-domain
//! specialists and picks (or merges) a response:
//!
//! - **Catalog**: static specialist templates grouped by domain family
//! - **Scoring**: eleven weighted, inspectable signals per template
//! - **Synthesis**: deterministic response text for surviving candidates
//! - **Resolver**: majority, synthesis, tournament and unanimous protocols
//! - **Session**: recent queries, intent, momentum and detected languages
//! - **Fitness**: per-species win rates with periodic pruning
//!
//! # Usage
//!
//! ```no_run
//! use consensus_engine::{ContextSnapshot, Engine, EngineConfig, SessionContext, SpecialistCatalog};
//!
//! # async fn run() -> Result<(), consensus_engine::EngineError> {
//! let engine = Engine::new(SpecialistCatalog::standard(), EngineConfig::default())?;
//! let session = SessionContext::default().shared();
//! let snapshot = ContextSnapshot::new("com.apple.dt.Xcode", "Xcode");
//!
//! let result = engine
//!     .process("fix this bug in my swift code", &snapshot, &session)
//!     .await;
//! println!("{}: {}", result.winning_species, result.final_response);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod events;
pub mod fitness;
pub mod log;
pub mod resolver;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod synthesis;
pub mod text;

// Re-export key catalog types
pub use catalog::{
    CatalogError, CatalogResult, DomainFamily, SharedCatalog, SpecialistCatalog,
    SpecialistTemplate, NEUTRAL_FITNESS,
};

// Re-export engine types
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use engine::{Engine, EngineError, EngineResult, SharedEngine};
pub use events::{EngineEvent, EventBus, SharedEventBus};

// Re-export scoring and resolution types
pub use resolver::{
    Candidate, ConsensusProtocol, ConsensusResolver, ConsensusResult, ParseProtocolError,
    RankedEntry, ResolverConfig,
};
pub use scoring::{PreparedQuery, ScoringEngine, ScoringWeights, SignalBreakdown};
pub use synthesis::QueryIntentClass;

// Re-export fitness types
pub use fitness::{EvolutionPolicy, EvolutionReport, FitnessRegistry, FitnessSnapshot, SpeciesRecord};

// Re-export session and collaborator types
pub use log::{ConversationEntry, ConversationLog, MemoryConversationLog};
pub use session::{IntentSignal, SessionContext, SessionLimits, SessionView, SharedSession};
pub use snapshot::{
    ContextSnapshot, FixedSnapshotProvider, OperatingMode, OperatingModeProvider, SnapshotProvider,
    TimeBucket,
};
pub use text::SyntaxKind;
