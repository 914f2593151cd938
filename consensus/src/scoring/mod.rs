//! Confidence scoring engine
//!
//! Scores one [`SpecialistTemplate`] against a query using eleven
//! independent, non-negative signals:
//!
//! | # | Signal | Default weight |
//! |---|--------|----------------|
//! | 1 | Keyword containment (per hit) | 0.15 |
//! | 2 | Bigram containment (per hit) | 0.25 |
//! | 3 | Active-application affinity | 0.20 |
//! | 4 | Fitness prior (× fitness) | 0.10 |
//! | 5 | Intent alignment | 0.10 |
//! | 6 | Session momentum | 0.08 |
//! | 7 | Detected-language momentum | 0.08 |
//! | 8 | Time-of-day / playback affinity | 0.07 |
//! | 9 | Clipboard relevance | 0.04/hit + 0.10 |
//! | 10 | Query complexity | 0.05 |
//! | 11 | Operating-mode bias (× overlap) | 0.10 |
//!
//! The sum is clamped to [0, 1]. It is a ceiling, not a probability:
//! strong matches saturate. Templates scoring at or below
//! `discard_threshold` never reach synthesis.

mod signals;

use serde::{Deserialize, Serialize};

use crate::catalog::SpecialistTemplate;
use crate::session::SessionView;
use crate::snapshot::ContextSnapshot;
use crate::text::{SyntaxKind, TokenizedText};

/// Signal weights and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub keyword_hit: f64,
    pub bigram_hit: f64,
    pub app_affinity: f64,
    pub fitness_prior: f64,
    pub intent_alignment: f64,
    pub session_momentum: f64,
    pub language_momentum: f64,
    pub time_of_day: f64,
    pub clipboard_keyword: f64,
    /// Maximum clipboard keyword hits credited
    pub clipboard_keyword_cap: usize,
    pub clipboard_language: f64,
    pub complexity: f64,
    /// Minimum query words for the complexity bonus
    pub complexity_min_words: usize,
    /// Minimum species depth for the complexity bonus
    pub complexity_min_depth: usize,
    pub mode_bias: f64,
    /// Candidates at or below this confidence are dropped before synthesis
    pub discard_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword_hit: 0.15,
            bigram_hit: 0.25,
            app_affinity: 0.20,
            fitness_prior: 0.10,
            intent_alignment: 0.10,
            session_momentum: 0.08,
            language_momentum: 0.08,
            time_of_day: 0.07,
            clipboard_keyword: 0.04,
            clipboard_keyword_cap: 3,
            clipboard_language: 0.10,
            complexity: 0.05,
            complexity_min_words: 5,
            complexity_min_depth: 3,
            mode_bias: 0.10,
            discard_threshold: 0.15,
        }
    }
}

impl ScoringWeights {
    /// Every weight, paired with its name, for validation
    pub(crate) fn weights(&self) -> [(&'static str, f64); 13] {
        [
            ("keyword_hit", self.keyword_hit),
            ("bigram_hit", self.bigram_hit),
            ("app_affinity", self.app_affinity),
            ("fitness_prior", self.fitness_prior),
            ("intent_alignment", self.intent_alignment),
            ("session_momentum", self.session_momentum),
            ("language_momentum", self.language_momentum),
            ("time_of_day", self.time_of_day),
            ("clipboard_keyword", self.clipboard_keyword),
            ("clipboard_language", self.clipboard_language),
            ("complexity", self.complexity),
            ("mode_bias", self.mode_bias),
            ("discard_threshold", self.discard_threshold),
        ]
    }
}

/// Query and clipboard tokenized once per query, shared by every template
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub raw: String,
    pub text: TokenizedText,
    pub clipboard: Option<TokenizedText>,
    pub clipboard_syntax: Option<SyntaxKind>,
}

impl PreparedQuery {
    pub fn new(query: &str, snapshot: &ContextSnapshot) -> Self {
        let clip = snapshot.clipboard_text();
        Self {
            raw: query.to_string(),
            text: TokenizedText::new(query),
            clipboard: clip.map(TokenizedText::new),
            clipboard_syntax: clip.and_then(SyntaxKind::detect),
        }
    }
}

/// Per-signal contributions for one template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub keyword: f64,
    pub bigram: f64,
    pub app_affinity: f64,
    pub fitness_prior: f64,
    pub intent_alignment: f64,
    pub session_momentum: f64,
    pub language_momentum: f64,
    pub time_of_day: f64,
    pub clipboard: f64,
    pub complexity: f64,
    pub mode_bias: f64,
    /// Keywords (single and bigram) found in the query
    pub matched_keywords: Vec<String>,
}

impl SignalBreakdown {
    /// Unclamped sum of every contribution
    pub fn raw_total(&self) -> f64 {
        self.keyword
            + self.bigram
            + self.app_affinity
            + self.fitness_prior
            + self.intent_alignment
            + self.session_momentum
            + self.language_momentum
            + self.time_of_day
            + self.clipboard
            + self.complexity
            + self.mode_bias
    }

    /// Clamped confidence in [0, 1]; non-finite sums collapse to 0
    pub fn confidence(&self) -> f64 {
        let raw = self.raw_total();
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Named contributions in signal order
    pub fn signals(&self) -> [(&'static str, f64); 11] {
        [
            ("keyword", self.keyword),
            ("bigram", self.bigram),
            ("app_affinity", self.app_affinity),
            ("fitness_prior", self.fitness_prior),
            ("intent_alignment", self.intent_alignment),
            ("session_momentum", self.session_momentum),
            ("language_momentum", self.language_momentum),
            ("time_of_day", self.time_of_day),
            ("clipboard", self.clipboard),
            ("complexity", self.complexity),
            ("mode_bias", self.mode_bias),
        ]
    }
}

/// Stateless scorer parameterized by [`ScoringWeights`]
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(config: ScoringWeights) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringWeights {
        &self.config
    }

    /// Full per-signal breakdown for a prepared query
    pub fn evaluate(
        &self,
        template: &SpecialistTemplate,
        query: &PreparedQuery,
        snapshot: &ContextSnapshot,
        session: &SessionView,
    ) -> SignalBreakdown {
        let cfg = &self.config;
        let hits = signals::keyword_hits(template, query);

        SignalBreakdown {
            keyword: hits.single as f64 * cfg.keyword_hit,
            bigram: hits.bigram as f64 * cfg.bigram_hit,
            app_affinity: signals::app_affinity(template, snapshot, cfg),
            fitness_prior: signals::fitness_prior(template, cfg),
            intent_alignment: signals::intent_alignment(template, session, cfg),
            session_momentum: signals::session_momentum(template, session, cfg),
            language_momentum: signals::language_momentum(template, session, cfg),
            time_of_day: signals::time_of_day(template, snapshot, cfg),
            clipboard: signals::clipboard_relevance(template, query, cfg),
            complexity: signals::query_complexity(template, query, &hits, cfg),
            mode_bias: signals::mode_bias(template, session, cfg),
            matched_keywords: hits.matched,
        }
    }

    /// Clamped confidence for a raw query string
    pub fn score(
        &self,
        template: &SpecialistTemplate,
        query: &str,
        snapshot: &ContextSnapshot,
        session: &SessionView,
    ) -> f64 {
        let prepared = PreparedQuery::new(query, snapshot);
        self.evaluate(template, &prepared, snapshot, session)
            .confidence()
    }

    /// Whether a confidence clears the discard threshold
    pub fn survives(&self, confidence: f64) -> bool {
        confidence > self.config.discard_threshold
    }
}
