//! Consensus resolver
//!
//! Selects or merges the final response from the scored candidates using
//! one of four protocols. Resolution is pure and total: an empty candidate
//! set yields [`ConsensusResult::empty`], never an error.

use std::cmp::Ordering;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of candidates merged by synthesis
pub const DEFAULT_SYNTHESIS_TOP_N: usize = 3;

/// One candidate response for a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub species: String,
    pub label: String,
    pub domain: String,
    pub confidence: f64,
    pub text: String,
    /// Wall time spent scoring and composing this candidate
    pub latency: Duration,
}

/// Consensus protocol selecting or merging candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConsensusProtocol {
    /// Highest confidence wins outright
    Majority,
    /// Merge up to `top_n` candidates above the floor
    Synthesis { top_n: usize },
    /// Pairwise elimination; always agrees with Majority
    Tournament,
    /// Majority when every candidate clears the agreement threshold, else Synthesis(3)
    Unanimous,
}

impl Default for ConsensusProtocol {
    fn default() -> Self {
        Self::Synthesis {
            top_n: DEFAULT_SYNTHESIS_TOP_N,
        }
    }
}

impl std::fmt::Display for ConsensusProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Majority => write!(f, "majority"),
            Self::Synthesis { top_n } => write!(f, "synthesis:{top_n}"),
            Self::Tournament => write!(f, "tournament"),
            Self::Unanimous => write!(f, "unanimous"),
        }
    }
}

/// Error parsing a protocol name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consensus protocol '{0}' (expected majority, synthesis[:N], tournament or unanimous)")]
pub struct ParseProtocolError(String);

impl FromStr for ConsensusProtocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (lower.as_str(), None),
        };
        match (name, arg) {
            ("majority", None) => Ok(Self::Majority),
            ("tournament", None) => Ok(Self::Tournament),
            ("unanimous", None) => Ok(Self::Unanimous),
            ("synthesis", None) => Ok(Self::default()),
            ("synthesis", Some(n)) => match n.trim().parse::<usize>() {
                Ok(top_n) if top_n > 0 => Ok(Self::Synthesis { top_n }),
                _ => Err(ParseProtocolError(s.to_string())),
            },
            _ => Err(ParseProtocolError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ConsensusProtocol {
    type Error = ParseProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConsensusProtocol> for String {
    fn from(protocol: ConsensusProtocol) -> Self {
        protocol.to_string()
    }
}

/// Resolver thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Synthesis only merges candidates strictly above this confidence
    pub synthesis_floor: f64,
    /// Unanimous requires every candidate strictly above this confidence
    pub unanimous_threshold: f64,
    /// Ranked entries kept in the result breakdown
    pub breakdown_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            synthesis_floor: 0.2,
            unanimous_threshold: 0.6,
            breakdown_len: 5,
        }
    }
}

/// One row of the ranked breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub species: String,
    pub confidence: f64,
    pub latency_ms: u64,
}

/// Outcome of resolving one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub final_response: String,
    /// Empty when no consensus was reached
    pub winning_species: String,
    pub participant_count: usize,
    pub consensus_strength: f64,
    /// Protocol requested by the caller
    pub protocol: ConsensusProtocol,
    /// Top-ranked candidates, best first
    pub breakdown: Vec<RankedEntry>,
}

impl ConsensusResult {
    /// Canonical "no consensus" result
    pub fn empty(protocol: ConsensusProtocol) -> Self {
        Self {
            final_response: String::new(),
            winning_species: String::new(),
            participant_count: 0,
            consensus_strength: 0.0,
            protocol,
            breakdown: Vec::new(),
        }
    }

    pub fn is_no_consensus(&self) -> bool {
        self.winning_species.is_empty() && self.participant_count == 0
    }
}

/// Descending confidence, species ascending on ties
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.species.cmp(&b.species))
}

/// Stateless resolver parameterized by [`ResolverConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConsensusResolver {
    config: ResolverConfig,
}

impl ConsensusResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve candidates under `protocol`. Input order does not matter.
    pub fn resolve(&self, candidates: &[Candidate], protocol: ConsensusProtocol) -> ConsensusResult {
        let mut ranked: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| !c.text.trim().is_empty())
            .collect();
        if ranked.len() < candidates.len() {
            warn!(
                dropped = candidates.len() - ranked.len(),
                "Ignoring candidates without response text"
            );
        }
        if ranked.is_empty() {
            return ConsensusResult::empty(protocol);
        }
        ranked.sort_by(|a, b| rank_order(a, b));

        let mut result = match protocol {
            ConsensusProtocol::Majority => self.majority(&ranked),
            ConsensusProtocol::Synthesis { top_n } => self.synthesis(&ranked, top_n),
            ConsensusProtocol::Tournament => self.tournament(&ranked),
            ConsensusProtocol::Unanimous => self.unanimous(&ranked),
        };
        result.protocol = protocol;

        debug!(
            protocol = %protocol,
            winner = %result.winning_species,
            participants = result.participant_count,
            strength = result.consensus_strength,
            "Resolved candidates"
        );
        result
    }

    fn majority(&self, ranked: &[&Candidate]) -> ConsensusResult {
        match ranked.first() {
            Some(top) => self.declare(top, ranked),
            None => ConsensusResult::empty(ConsensusProtocol::Majority),
        }
    }

    /// Result with `winner` answering alone
    fn declare(&self, winner: &Candidate, ranked: &[&Candidate]) -> ConsensusResult {
        ConsensusResult {
            final_response: winner.text.clone(),
            winning_species: winner.species.clone(),
            participant_count: ranked.len(),
            consensus_strength: winner.confidence,
            protocol: ConsensusProtocol::Majority,
            breakdown: self.breakdown(ranked),
        }
    }

    fn synthesis(&self, ranked: &[&Candidate], top_n: usize) -> ConsensusResult {
        let survivors: Vec<&Candidate> = ranked
            .iter()
            .copied()
            .filter(|c| c.confidence > self.config.synthesis_floor)
            .take(top_n.max(1))
            .collect();

        if survivors.len() <= 1 {
            return self.majority(ranked);
        }

        let total: f64 = survivors.iter().map(|c| c.confidence).sum();
        let sections: Vec<String> = survivors
            .iter()
            .map(|c| {
                let share = if total > 0.0 { c.confidence / total } else { 0.0 };
                format!("## {} ({:.0}%)\n{}", c.label, share * 100.0, c.text)
            })
            .collect();

        ConsensusResult {
            final_response: sections.join("\n\n"),
            winning_species: survivors[0].species.clone(),
            participant_count: ranked.len(),
            consensus_strength: total / survivors.len() as f64,
            protocol: ConsensusProtocol::Synthesis { top_n },
            breakdown: self.breakdown(ranked),
        }
    }

    /// Single-elimination bracket over adjacent pairs. The better-ranked
    /// side of each pair advances, so the champion is always the top-ranked
    /// candidate and the result matches Majority.
    fn tournament(&self, ranked: &[&Candidate]) -> ConsensusResult {
        let mut round: Vec<&Candidate> = ranked.to_vec();
        while round.len() > 1 {
            round = round
                .chunks(2)
                .filter_map(|pair| pair.iter().copied().min_by(|a, b| rank_order(a, b)))
                .collect();
        }
        match round.first() {
            Some(champion) => {
                debug!(champion = %champion.species, "Tournament decided");
                self.declare(champion, ranked)
            }
            None => ConsensusResult::empty(ConsensusProtocol::Tournament),
        }
    }

    fn unanimous(&self, ranked: &[&Candidate]) -> ConsensusResult {
        let agreed = ranked
            .iter()
            .all(|c| c.confidence > self.config.unanimous_threshold);
        if agreed {
            self.majority(ranked)
        } else {
            self.synthesis(ranked, DEFAULT_SYNTHESIS_TOP_N)
        }
    }

    fn breakdown(&self, ranked: &[&Candidate]) -> Vec<RankedEntry> {
        ranked
            .iter()
            .take(self.config.breakdown_len)
            .map(|c| RankedEntry {
                species: c.species.clone(),
                confidence: c.confidence,
                latency_ms: c.latency.as_millis().min(u128::from(u64::MAX)) as u64,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(species: &str, confidence: f64) -> Candidate {
        Candidate {
            species: species.to_string(),
            label: species.to_uppercase(),
            domain: "test".to_string(),
            confidence,
            text: format!("answer from {species}"),
            latency: Duration::from_millis(3),
        }
    }

    fn same_except_protocol(a: &ConsensusResult, b: &ConsensusResult) -> bool {
        a.final_response == b.final_response
            && a.winning_species == b.winning_species
            && a.participant_count == b.participant_count
            && a.consensus_strength == b.consensus_strength
            && a.breakdown == b.breakdown
    }

    #[test]
    fn test_empty_candidates_give_canonical_empty() {
        let resolver = ConsensusResolver::default();
        for protocol in [
            ConsensusProtocol::Majority,
            ConsensusProtocol::default(),
            ConsensusProtocol::Tournament,
            ConsensusProtocol::Unanimous,
        ] {
            let result = resolver.resolve(&[], protocol);
            assert_eq!(result, ConsensusResult::empty(protocol));
            assert!(result.is_no_consensus());
        }
    }

    #[test]
    fn test_majority_picks_top_regardless_of_input_order() {
        let resolver = ConsensusResolver::default();
        let cands = vec![candidate("b", 0.4), candidate("a", 0.9), candidate("c", 0.2)];
        let result = resolver.resolve(&cands, ConsensusProtocol::Majority);
        assert_eq!(result.winning_species, "a");
        assert_eq!(result.final_response, "answer from a");
        assert_eq!(result.participant_count, 3);
        assert_eq!(result.consensus_strength, 0.9);
        let order: Vec<&str> = result.breakdown.iter().map(|e| e.species.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ties_break_on_species() {
        let resolver = ConsensusResolver::default();
        let cands = vec![candidate("zeta", 0.5), candidate("alpha", 0.5)];
        let result = resolver.resolve(&cands, ConsensusProtocol::Majority);
        assert_eq!(result.winning_species, "alpha");
    }

    #[test]
    fn test_synthesis_merges_with_shares() {
        let resolver = ConsensusResolver::default();
        let cands = vec![
            candidate("a", 0.6),
            candidate("b", 0.3),
            candidate("c", 0.3),
            candidate("d", 0.25),
            candidate("e", 0.1),
        ];
        let result = resolver.resolve(&cands, ConsensusProtocol::Synthesis { top_n: 3 });
        assert_eq!(result.winning_species, "a");
        assert!(result.final_response.contains("## A (50%)"));
        assert!(result.final_response.contains("## B (25%)"));
        assert!(result.final_response.contains("## C (25%)"));
        assert!(!result.final_response.contains("answer from d"));
        assert_eq!(result.participant_count, 5);
        assert!((result.consensus_strength - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_synthesis_single_survivor_matches_majority() {
        let resolver = ConsensusResolver::default();
        let cands = vec![candidate("a", 0.7), candidate("b", 0.18), candidate("c", 0.16)];
        let synth = resolver.resolve(&cands, ConsensusProtocol::default());
        let majority = resolver.resolve(&cands, ConsensusProtocol::Majority);
        assert!(same_except_protocol(&synth, &majority));
        assert_eq!(synth.protocol, ConsensusProtocol::default());
    }

    #[test]
    fn test_synthesis_without_survivors_falls_back_to_majority() {
        let resolver = ConsensusResolver::default();
        let cands = vec![candidate("a", 0.19), candidate("b", 0.16)];
        let synth = resolver.resolve(&cands, ConsensusProtocol::default());
        assert_eq!(synth.winning_species, "a");
        assert_eq!(synth.final_response, "answer from a");
    }

    #[test]
    fn test_tournament_equals_majority() {
        let resolver = ConsensusResolver::default();
        let sets = [
            vec![candidate("a", 0.3)],
            vec![candidate("a", 0.3), candidate("b", 0.8), candidate("c", 0.8)],
            vec![
                candidate("a", 0.1),
                candidate("b", 0.2),
                candidate("c", 0.9),
                candidate("d", 0.4),
                candidate("e", 0.9),
            ],
        ];
        for cands in sets {
            let t = resolver.resolve(&cands, ConsensusProtocol::Tournament);
            let m = resolver.resolve(&cands, ConsensusProtocol::Majority);
            assert!(same_except_protocol(&t, &m));
        }
    }

    #[test]
    fn test_blank_text_candidates_never_win() {
        let resolver = ConsensusResolver::default();
        let mut blank = candidate("a.blank", 0.95);
        blank.text = "  ".into();
        let mut empty = candidate("b.empty", 0.9);
        empty.text.clear();

        let cands = vec![blank.clone(), empty, candidate("c.real", 0.4)];
        for protocol in [
            ConsensusProtocol::Majority,
            ConsensusProtocol::default(),
            ConsensusProtocol::Tournament,
            ConsensusProtocol::Unanimous,
        ] {
            let result = resolver.resolve(&cands, protocol);
            assert_eq!(result.winning_species, "c.real");
            assert_eq!(result.participant_count, 1);
            assert_eq!(result.final_response, "answer from c.real");
        }

        let only_blank = resolver.resolve(&[blank], ConsensusProtocol::Majority);
        assert_eq!(only_blank, ConsensusResult::empty(ConsensusProtocol::Majority));
    }

    #[test]
    fn test_unanimous_switches_on_threshold() {
        let resolver = ConsensusResolver::default();
        let agreed = vec![candidate("a", 0.9), candidate("b", 0.7)];
        assert!(same_except_protocol(
            &resolver.resolve(&agreed, ConsensusProtocol::Unanimous),
            &resolver.resolve(&agreed, ConsensusProtocol::Majority),
        ));

        let split = vec![candidate("a", 0.9), candidate("b", 0.5)];
        assert!(same_except_protocol(
            &resolver.resolve(&split, ConsensusProtocol::Unanimous),
            &resolver.resolve(&split, ConsensusProtocol::Synthesis { top_n: 3 }),
        ));
    }

    #[test]
    fn test_breakdown_is_bounded() {
        let resolver = ConsensusResolver::default();
        let cands: Vec<Candidate> = (0..12)
            .map(|i| candidate(&format!("s{i:02}"), 0.2 + i as f64 * 0.05))
            .collect();
        let result = resolver.resolve(&cands, ConsensusProtocol::Majority);
        assert_eq!(result.breakdown.len(), 5);
        assert_eq!(result.breakdown[0].species, "s11");
        assert_eq!(result.breakdown[0].latency_ms, 3);
    }

    #[test]
    fn test_protocol_parsing() {
        let parse = |s: &str| s.parse::<ConsensusProtocol>();
        assert_eq!(parse("majority"), Ok(ConsensusProtocol::Majority));
        assert_eq!(parse(" Tournament "), Ok(ConsensusProtocol::Tournament));
        assert_eq!(parse("synthesis"), Ok(ConsensusProtocol::Synthesis { top_n: 3 }));
        assert_eq!(parse("synthesis:4"), Ok(ConsensusProtocol::Synthesis { top_n: 4 }));
        assert!("synthesis:0".parse::<ConsensusProtocol>().is_err());
        assert!("majority:2".parse::<ConsensusProtocol>().is_err());
        assert!("plurality".parse::<ConsensusProtocol>().is_err());

        let json = serde_json::to_string(&ConsensusProtocol::Synthesis { top_n: 4 }).unwrap();
        assert_eq!(json, "\"synthesis:4\"");
        let back: ConsensusProtocol = serde_json::from_str("\"unanimous\"").unwrap();
        assert_eq!(back, ConsensusProtocol::Unanimous);
    }
}
