//! Individual scoring signals.
//!
//! Each function returns a non-negative contribution. They read the
//! template, the prepared query, the snapshot and the session view and
//! write nothing.

use crate::catalog::{DomainFamily, SpecialistTemplate};
use crate::session::SessionView;
use crate::snapshot::ContextSnapshot;
use crate::text::is_bigram;

use super::{PreparedQuery, ScoringWeights};

/// Keyword and bigram hits of a template against the query
#[derive(Debug, Clone, Default)]
pub(crate) struct KeywordHits {
    pub single: usize,
    pub bigram: usize,
    pub matched: Vec<String>,
}

impl KeywordHits {
    pub fn any(&self) -> bool {
        self.single + self.bigram > 0
    }
}

pub(crate) fn keyword_hits(template: &SpecialistTemplate, query: &PreparedQuery) -> KeywordHits {
    let mut hits = KeywordHits::default();
    for kw in &template.keywords {
        if !query.text.contains(kw) {
            continue;
        }
        if is_bigram(kw) {
            hits.bigram += 1;
        } else {
            hits.single += 1;
        }
        hits.matched.push(kw.clone());
    }
    hits
}

pub(crate) fn app_affinity(
    template: &SpecialistTemplate,
    snapshot: &ContextSnapshot,
    config: &ScoringWeights,
) -> f64 {
    if !snapshot.active_app_id.is_empty() && template.has_affinity(&snapshot.active_app_id) {
        config.app_affinity
    } else {
        0.0
    }
}

pub(crate) fn fitness_prior(template: &SpecialistTemplate, config: &ScoringWeights) -> f64 {
    let fitness = if template.fitness_score.is_finite() {
        template.fitness_score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    config.fitness_prior * fitness
}

pub(crate) fn intent_alignment(
    template: &SpecialistTemplate,
    session: &SessionView,
    config: &ScoringWeights,
) -> f64 {
    let markers = session.intent.markers();
    let aligned = markers.iter().any(|m| {
        template.segments().any(|s| s == *m) || template.keywords.iter().any(|k| k.as_str() == *m)
    });
    if aligned {
        config.intent_alignment
    } else {
        0.0
    }
}

pub(crate) fn session_momentum(
    template: &SpecialistTemplate,
    session: &SessionView,
    config: &ScoringWeights,
) -> f64 {
    if session.in_momentum(&template.species) {
        config.session_momentum
    } else {
        0.0
    }
}

/// Detected languages match whole species segments, so `c` never matches `code`
pub(crate) fn language_momentum(
    template: &SpecialistTemplate,
    session: &SessionView,
    config: &ScoringWeights,
) -> f64 {
    let hit = session
        .detected_languages
        .iter()
        .any(|lang| template.segments().any(|s| s == lang.as_str()));
    if hit {
        config.language_momentum
    } else {
        0.0
    }
}

pub(crate) fn time_of_day(
    template: &SpecialistTemplate,
    snapshot: &ContextSnapshot,
    config: &ScoringWeights,
) -> f64 {
    match template.family() {
        DomainFamily::Wellbeing if snapshot.time_bucket.is_night() => config.time_of_day,
        DomainFamily::Creative if snapshot.is_playing => config.time_of_day,
        _ => 0.0,
    }
}

pub(crate) fn clipboard_relevance(
    template: &SpecialistTemplate,
    query: &PreparedQuery,
    config: &ScoringWeights,
) -> f64 {
    let Some(clip) = &query.clipboard else {
        return 0.0;
    };
    let hits = template
        .keywords
        .iter()
        .filter(|kw| clip.contains(kw))
        .count()
        .min(config.clipboard_keyword_cap);
    let mut score = hits as f64 * config.clipboard_keyword;

    let language_match = query
        .clipboard_syntax
        .and_then(|kind| kind.language_tag())
        .is_some_and(|tag| template.segments().any(|s| s == tag));
    if language_match {
        score += config.clipboard_language;
    }
    score
}

pub(crate) fn query_complexity(
    template: &SpecialistTemplate,
    query: &PreparedQuery,
    hits: &KeywordHits,
    config: &ScoringWeights,
) -> f64 {
    if hits.any()
        && query.text.word_count() >= config.complexity_min_words
        && template.depth() >= config.complexity_min_depth
    {
        config.complexity
    } else {
        0.0
    }
}

pub(crate) fn mode_bias(
    template: &SpecialistTemplate,
    session: &SessionView,
    config: &ScoringWeights,
) -> f64 {
    if session.mode_bias.is_empty() {
        return 0.0;
    }
    let overlap = session
        .mode_bias
        .iter()
        .filter(|term| template.domain == **term || template.segments().any(|s| s == term.as_str()))
        .count();
    config.mode_bias * overlap as f64 / session.mode_bias.len() as f64
}
