//! Engine events
//!
//! Query outcomes and evolution passes are broadcast over a
//! `tokio::sync::broadcast` channel so hosts can observe the engine without
//! coupling to it. Publishing with no subscribers is not an error.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Everything the engine reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Scoring finished for a query
    QueryScored {
        query_preview: String,
        scored: usize,
        survivors: usize,
        elapsed_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A winner was declared
    ConsensusReached {
        winning_species: String,
        protocol: String,
        participant_count: usize,
        consensus_strength: f64,
        timestamp: DateTime<Utc>,
    },

    /// No template survived the discard threshold
    NoConsensus {
        query_preview: String,
        protocol: String,
        timestamp: DateTime<Utc>,
    },

    /// A query was rejected or timed out before resolution
    QueryAborted {
        query_preview: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// An evolution pass finished
    EvolutionCompleted {
        generation: u64,
        pruned: Vec<String>,
        survivors: usize,
        timestamp: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// snake_case tag, matching the serialized `type` field
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::QueryScored { .. } => "query_scored",
            Self::ConsensusReached { .. } => "consensus_reached",
            Self::NoConsensus { .. } => "no_consensus",
            Self::QueryAborted { .. } => "query_aborted",
            Self::EvolutionCompleted { .. } => "evolution_completed",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::QueryScored { timestamp, .. }
            | Self::ConsensusReached { timestamp, .. }
            | Self::NoConsensus { timestamp, .. }
            | Self::QueryAborted { timestamp, .. }
            | Self::EvolutionCompleted { timestamp, .. } => *timestamp,
        }
    }
}

/// Broadcast bus for [`EngineEvent`]s
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: EngineEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evolution(generation: u64) -> EngineEvent {
        EngineEvent::EvolutionCompleted {
            generation,
            pruned: vec!["code.cobol".to_string()],
            survivors: 3,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new().shared();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(evolution(4));

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1, e2);
        assert_eq!(e1.event_type(), "evolution_completed");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(evolution(1));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let event = EngineEvent::NoConsensus {
            query_preview: "hmm".to_string(),
            protocol: "majority".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.event_type());
    }
}
