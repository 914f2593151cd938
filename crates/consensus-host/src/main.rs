//! Command-line host for the specialist consensus engine
//!
//! Routes each query through the standard specialist catalog and prints the
//! resolved response.
//!
//! # Usage
//!
//! ```bash
//! # One-shot
//! consensus-host --app-id com.apple.dt.Xcode --app-name Xcode "fix this bug in my swift code"
//!
//! # Interactive: one query per stdin line, with history and persisted priors
//! consensus-host --log-path ~/.consensus/log.jsonl --fitness-path ~/.consensus/fitness.json
//!
//! # Config file plus env overrides
//! CONSENSUS_PROTOCOL=majority consensus-host --config consensus.toml --format json "deploy"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use consensus_engine::{
    ConsensusProtocol, ConversationLog, Engine, EngineConfig, EngineEvent, EventBus,
    OperatingMode, SessionContext, SharedEngine, SharedSession, SnapshotProvider,
    SpecialistCatalog,
};
use consensus_host::snapshot::parse_playback;
use consensus_host::{
    fitness_store, render, EnvModeProvider, HostSnapshotProvider, JsonlConversationLog,
    OutputFormat,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Queries to route; reads one query per stdin line when omitted
    queries: Vec<String>,

    /// TOML engine config (env overrides still apply)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consensus protocol: majority, synthesis[:N], tournament, unanimous
    #[arg(long)]
    protocol: Option<ConsensusProtocol>,

    /// Bundle id of the frontmost application
    #[arg(long, default_value = "")]
    app_id: String,

    /// Display name of the frontmost application
    #[arg(long, default_value = "")]
    app_name: String,

    /// Clipboard text
    #[arg(long, conflicts_with = "clipboard_file")]
    clipboard: Option<String>,

    /// Read clipboard text from a file
    #[arg(long)]
    clipboard_file: Option<PathBuf>,

    /// Now playing, as "Track - Artist"
    #[arg(long)]
    playing: Option<String>,

    /// Free-form mood label
    #[arg(long)]
    mood: Option<String>,

    /// Operating mode when CONSENSUS_MODE is unset
    #[arg(long, default_value = "normal")]
    mode: OperatingMode,

    /// Pin the hour of day (0-23) instead of reading the clock
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    hour: Option<u32>,

    /// JSONL conversation log; existing entries seed the session
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Fitness priors loaded at start and saved on exit
    #[arg(long)]
    fitness_path: Option<PathBuf>,

    /// Run an evolution pass after every N queries
    #[arg(long)]
    evolve_every: Option<u64>,

    /// Abandon a query that has not resolved within this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let mut config = EngineConfig::default();
            config.apply_env().context("Invalid CONSENSUS_* environment")?;
            config
        }
    };
    if let Some(protocol) = args.protocol {
        config.default_protocol = protocol;
    }
    config.validate().context("Invalid engine config")?;
    Ok(config)
}

fn snapshot_provider(args: &Args) -> Result<HostSnapshotProvider<EnvModeProvider>> {
    let clipboard = match &args.clipboard_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read clipboard file {}", path.display()))?,
        ),
        None => args.clipboard.clone(),
    };
    let mut provider = HostSnapshotProvider::new(&args.app_id, &args.app_name)
        .with_mode_provider(EnvModeProvider::new(args.mode))
        .with_clipboard(clipboard)
        .with_mood(args.mood.clone())
        .with_hour(args.hour);
    if let Some(raw) = &args.playing {
        let (track, artist) = parse_playback(raw);
        provider = provider.with_playback(track, artist);
    }
    Ok(provider)
}

/// Log engine events at debug level until the bus closes
fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(EngineEvent::EvolutionCompleted {
                    generation,
                    pruned,
                    survivors,
                    ..
                }) => info!(generation, pruned = pruned.len(), survivors, "Evolution pass"),
                Ok(event) => debug!(event_type = event.event_type(), ?event, "Engine event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Event logger lagged")
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn route(
    engine: &SharedEngine,
    provider: &dyn SnapshotProvider,
    session: &SharedSession,
    query: &str,
    timeout: Option<Duration>,
    format: OutputFormat,
) -> Result<()> {
    let result = match timeout {
        Some(timeout) => {
            let snapshot = provider.capture();
            match engine
                .process_with_timeout(query, &snapshot, session, timeout)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(());
                }
            }
        }
        None => engine.process_captured(query, provider, session).await,
    };
    println!("{}", render(&result, format).context("Failed to render result")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "consensus_host=info,consensus_engine=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let session = SessionContext::new(config.session.clone()).shared();
    let bus = EventBus::new().shared();
    spawn_event_logger(&bus);

    let mut engine = Engine::new(SpecialistCatalog::standard(), config)
        .context("Failed to build engine")?
        .with_event_bus(Arc::clone(&bus));

    if let Some(path) = &args.fitness_path {
        if let Some(snapshot) = fitness_store::load(path)? {
            engine = engine.with_fitness(snapshot);
        }
    }

    if let Some(path) = &args.log_path {
        let log = Arc::new(JsonlConversationLog::open(path)?);
        let history = log.recent(engine.config().session.query_capacity);
        if !history.is_empty() {
            session.lock().await.seed_from_history(&history);
            info!(entries = history.len(), "Seeded session from conversation log");
        }
        engine = engine.with_log(log);
    }

    let engine = engine.shared();
    let provider = snapshot_provider(&args)?;
    let timeout = args.timeout_ms.map(Duration::from_millis);
    info!(
        specialists = engine.catalog().await.count(),
        protocol = %engine.config().default_protocol,
        "Consensus host ready"
    );

    let mut routed = 0u64;
    let should_evolve = |routed: u64| args.evolve_every.is_some_and(|n| n > 0 && routed % n == 0);

    if args.queries.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            route(&engine, &provider, &session, query, timeout, args.format).await?;
            routed += 1;
            if should_evolve(routed) {
                engine.evolve().await;
            }
        }
    } else {
        for query in &args.queries {
            route(&engine, &provider, &session, query, timeout, args.format).await?;
            routed += 1;
            if should_evolve(routed) {
                engine.evolve().await;
            }
        }
    }

    if let Some(path) = &args.fitness_path {
        fitness_store::save(path, &engine.fitness_snapshot().await)?;
        info!(path = %path.display(), "Saved fitness priors");
    }
    Ok(())
}
