//! Rendering of consensus results for the terminal

use std::fmt::Write as _;

use consensus_engine::ConsensusResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// One JSON object per query
    Json,
}

pub fn render(result: &ConsensusResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string(result),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &ConsensusResult) -> String {
    if result.is_no_consensus() {
        return format!("(no consensus, protocol {})\n", result.protocol);
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "winner: {}  strength: {:.2}  participants: {}  protocol: {}",
        result.winning_species, result.consensus_strength, result.participant_count, result.protocol
    );
    for (rank, entry) in result.breakdown.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<32} {:.3}  {}ms",
            rank + 1,
            entry.species,
            entry.confidence,
            entry.latency_ms
        );
    }
    let _ = writeln!(out, "\n{}", result.final_response);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_engine::{ConsensusProtocol, RankedEntry};

    fn sample() -> ConsensusResult {
        ConsensusResult {
            final_response: "[Swift Debugger] Start with the crash log.".into(),
            winning_species: "code.swift.debug".into(),
            participant_count: 4,
            consensus_strength: 0.82,
            protocol: ConsensusProtocol::Majority,
            breakdown: vec![RankedEntry {
                species: "code.swift.debug".into(),
                confidence: 0.82,
                latency_ms: 0,
            }],
        }
    }

    #[test]
    fn test_text_lists_winner_and_breakdown() {
        let text = render(&sample(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("winner: code.swift.debug"));
        assert!(text.contains("1. code.swift.debug"));
        assert!(text.ends_with("Start with the crash log.\n"));
    }

    #[test]
    fn test_no_consensus_text() {
        let empty = ConsensusResult::empty(ConsensusProtocol::Tournament);
        assert_eq!(
            render(&empty, OutputFormat::Text).unwrap(),
            "(no consensus, protocol tournament)\n"
        );
    }

    #[test]
    fn test_json_is_single_line() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["winning_species"], "code.swift.debug");
        assert_eq!(value["protocol"], "majority");
    }
}
