//! Session context tracker
//!
//! Holds the mutable, session-lifetime state that biases scoring: the
//! recent-query ring buffer, the inferred [`IntentSignal`], the momentum
//! list of recent winners, win counts (cumulative and per time bucket),
//! detected language tags and the current mode-bias set.
//!
//! Scoring never reads a live `SessionContext`; it reads the immutable
//! [`SessionView`] captured at query start.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::log::ConversationEntry;
use crate::snapshot::{ContextSnapshot, OperatingMode, TimeBucket};
use crate::text::{SyntaxKind, TokenizedText};

/// Shared, serialized handle to a session
pub type SharedSession = Arc<Mutex<SessionContext>>;

/// Inferred user intent, re-derived on every ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSignal {
    Coding,
    Debugging,
    Creating,
    Shipping,
    Learning,
    Resting,
    /// Neutral: no family matched
    #[default]
    Exploring,
}

/// Keyword families per intent, English and Spanish.
///
/// Order doubles as the tie-break priority.
const INTENT_FAMILIES: &[(IntentSignal, &[&str])] = &[
    (
        IntentSignal::Debugging,
        &[
            "bug", "error", "fix", "crash", "broken", "debug", "exception", "failing", "fallo",
            "arreglar", "depurar", "roto",
        ],
    ),
    (
        IntentSignal::Shipping,
        &[
            "deploy", "release", "ship", "publish", "launch", "merge", "desplegar", "publicar",
            "lanzar",
        ],
    ),
    (
        IntentSignal::Coding,
        &[
            "code", "function", "implement", "class", "api", "refactor", "compile", "código",
            "función", "programar", "implementar",
        ],
    ),
    (
        IntentSignal::Creating,
        &[
            "write", "story", "design", "song", "draw", "poem", "compose", "escribir", "historia",
            "diseñar", "canción",
        ],
    ),
    (
        IntentSignal::Learning,
        &[
            "learn", "explain", "understand", "what", "why", "tutorial", "aprender", "explicar",
            "entender", "qué", "por qué",
        ],
    ),
    (
        IntentSignal::Resting,
        &[
            "tired", "sleep", "relax", "break", "stress", "calm", "cansado", "dormir",
            "descansar", "estrés",
        ],
    ),
];

impl IntentSignal {
    /// Species segments and keywords that align a template with this intent
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            Self::Coding => &["code", "arch", "refactor"],
            Self::Debugging => &["debug", "error", "fix"],
            Self::Creating => &["creative", "writing", "design", "music"],
            Self::Shipping => &["deploy", "release", "ci", "infra"],
            Self::Learning => &["research", "learning", "explain", "tutorial"],
            Self::Resting => &["wellbeing", "relax", "sleep"],
            Self::Exploring => &[],
        }
    }

    /// Intent implied by an operating mode, used to coerce `Exploring`
    pub fn implied_by(mode: OperatingMode) -> Option<Self> {
        match mode {
            OperatingMode::Normal => None,
            OperatingMode::Focus => Some(Self::Coding),
            OperatingMode::Creative => Some(Self::Creating),
            OperatingMode::Research => Some(Self::Learning),
            OperatingMode::Relax => Some(Self::Resting),
            OperatingMode::Ship => Some(Self::Shipping),
        }
    }

    /// Classify a window of recent queries by keyword-family hit counts
    pub fn classify<'a>(queries: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = [0usize; INTENT_FAMILIES.len()];
        for query in queries {
            let text = TokenizedText::new(query);
            for (idx, (_, keywords)) in INTENT_FAMILIES.iter().enumerate() {
                counts[idx] += keywords.iter().filter(|k| text.contains(k)).count();
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (idx, &count) in counts.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((idx, count));
            }
        }
        best.map(|(idx, _)| INTENT_FAMILIES[idx].0)
            .unwrap_or(Self::Exploring)
    }
}

impl std::fmt::Display for IntentSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Coding => "coding",
            Self::Debugging => "debugging",
            Self::Creating => "creating",
            Self::Shipping => "shipping",
            Self::Learning => "learning",
            Self::Resting => "resting",
            Self::Exploring => "exploring",
        };
        f.write_str(name)
    }
}

/// Capacity limits for the session buffers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Recent queries kept in the ring buffer
    pub query_capacity: usize,
    /// Recent winners kept in the momentum list
    pub momentum_capacity: usize,
    /// Queries considered when classifying intent
    pub intent_window: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            query_capacity: 50,
            momentum_capacity: 10,
            intent_window: 5,
        }
    }
}

/// Application identifiers that imply a language
const APP_LANGUAGES: &[(&str, &str)] = &[
    ("com.apple.dt.xcode", "swift"),
    ("com.jetbrains.rustrover", "rust"),
    ("com.jetbrains.pycharm", "python"),
    ("com.jetbrains.goland", "go"),
    ("com.jetbrains.webstorm", "javascript"),
    ("com.jetbrains.rubymine", "ruby"),
    ("com.jetbrains.phpstorm", "php"),
    ("com.jetbrains.clion", "cpp"),
    ("com.google.android.studio", "kotlin"),
    ("com.rstudio.desktop", "r"),
];

/// Immutable session state read by one scoring pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionView {
    pub intent: IntentSignal,
    /// Recent winners, oldest first
    pub momentum: Vec<String>,
    pub detected_languages: BTreeSet<String>,
    pub mode_bias: Vec<String>,
}

impl SessionView {
    pub fn in_momentum(&self, species: &str) -> bool {
        self.momentum.iter().any(|s| s == species)
    }
}

/// Mutable, session-lifetime context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: String,
    limits: SessionLimits,
    recent_queries: VecDeque<String>,
    intent: IntentSignal,
    momentum: VecDeque<String>,
    win_counts: HashMap<String, u64>,
    bucket_wins: HashMap<TimeBucket, HashMap<String, u64>>,
    detected_languages: BTreeSet<String>,
    mode_bias: Vec<String>,
    queries_ingested: u64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}

impl SessionContext {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recent_queries: VecDeque::with_capacity(limits.query_capacity),
            momentum: VecDeque::with_capacity(limits.momentum_capacity),
            limits,
            intent: IntentSignal::Exploring,
            win_counts: HashMap::new(),
            bucket_wins: HashMap::new(),
            detected_languages: BTreeSet::new(),
            mode_bias: Vec::new(),
            queries_ingested: 0,
        }
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Fold a new query and its snapshot into the session
    pub fn ingest(&mut self, query: &str, snapshot: &ContextSnapshot) {
        push_bounded(
            &mut self.recent_queries,
            query.to_string(),
            self.limits.query_capacity,
        );
        self.queries_ingested += 1;

        self.detect_languages(snapshot);
        self.mode_bias = snapshot
            .mode
            .bias_terms()
            .iter()
            .map(|t| t.to_string())
            .collect();
        self.reclassify(snapshot.mode);

        debug!(
            session_id = %self.id,
            intent = %self.intent,
            languages = ?self.detected_languages,
            "Session ingested query"
        );
    }

    /// Record the resolver's declared winner
    pub fn record_winner(&mut self, species: &str, bucket: TimeBucket) {
        if species.is_empty() {
            return;
        }
        push_bounded(
            &mut self.momentum,
            species.to_string(),
            self.limits.momentum_capacity,
        );
        *self.win_counts.entry(species.to_string()).or_insert(0) += 1;
        *self
            .bucket_wins
            .entry(bucket)
            .or_default()
            .entry(species.to_string())
            .or_insert(0) += 1;
    }

    /// Rebuild history from conversation-log entries, oldest first
    pub fn seed_from_history(&mut self, entries: &[ConversationEntry]) {
        for entry in entries {
            push_bounded(
                &mut self.recent_queries,
                entry.query.clone(),
                self.limits.query_capacity,
            );
            let bucket = TimeBucket::from_hour(entry.timestamp.with_timezone(&Local).hour());
            self.record_winner(&entry.species, bucket);
        }
        self.reclassify(OperatingMode::Normal);
        debug!(session_id = %self.id, seeded = entries.len(), "Session seeded from history");
    }

    /// Immutable copy of everything scoring reads
    pub fn view(&self) -> SessionView {
        SessionView {
            intent: self.intent,
            momentum: self.momentum.iter().cloned().collect(),
            detected_languages: self.detected_languages.clone(),
            mode_bias: self.mode_bias.clone(),
        }
    }

    pub fn intent(&self) -> IntentSignal {
        self.intent
    }

    pub fn recent_queries(&self) -> impl Iterator<Item = &str> {
        self.recent_queries.iter().map(String::as_str)
    }

    pub fn momentum(&self) -> impl Iterator<Item = &str> {
        self.momentum.iter().map(String::as_str)
    }

    pub fn detected_languages(&self) -> &BTreeSet<String> {
        &self.detected_languages
    }

    pub fn wins(&self, species: &str) -> u64 {
        self.win_counts.get(species).copied().unwrap_or(0)
    }

    pub fn bucket_wins(&self, bucket: TimeBucket, species: &str) -> u64 {
        self.bucket_wins
            .get(&bucket)
            .and_then(|m| m.get(species))
            .copied()
            .unwrap_or(0)
    }

    /// Most frequent winners in a time bucket, ties broken by species name
    pub fn top_winners(&self, bucket: TimeBucket, n: usize) -> Vec<(String, u64)> {
        let mut winners: Vec<(String, u64)> = self
            .bucket_wins
            .get(&bucket)
            .map(|m| m.iter().map(|(s, c)| (s.clone(), *c)).collect())
            .unwrap_or_default();
        winners.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        winners.truncate(n);
        winners
    }

    pub fn queries_ingested(&self) -> u64 {
        self.queries_ingested
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    fn reclassify(&mut self, mode: OperatingMode) {
        let window = self.limits.intent_window;
        let skip = self.recent_queries.len().saturating_sub(window);
        let mut intent =
            IntentSignal::classify(self.recent_queries.iter().skip(skip).map(String::as_str));
        if intent == IntentSignal::Exploring {
            if let Some(implied) = IntentSignal::implied_by(mode) {
                intent = implied;
            }
        }
        self.intent = intent;
    }

    fn detect_languages(&mut self, snapshot: &ContextSnapshot) {
        let app = snapshot.active_app_id.to_lowercase();
        if let Some((_, lang)) = APP_LANGUAGES.iter().find(|(id, _)| *id == app) {
            self.detected_languages.insert(lang.to_string());
        }
        if let Some(tag) = snapshot
            .clipboard_text()
            .and_then(SyntaxKind::detect)
            .and_then(|kind| kind.language_tag())
        {
            self.detected_languages.insert(tag.to_string());
        }
    }
}

fn push_bounded(buf: &mut VecDeque<String>, item: String, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(item);
}
