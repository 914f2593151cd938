//! Conversation-log collaborator
//!
//! The engine appends one [`ConversationEntry`] per resolved query. Hosts
//! choose the storage; the in-memory log here is enough for tests and for
//! seeding a [`SessionContext`](crate::session::SessionContext) after restart.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resolved exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub query: String,
    pub response: String,
    /// Winning species; empty when no consensus was reached
    pub species: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    /// Entry stamped with the current time
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        species: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            species: species.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Sink for resolved exchanges, optionally readable for session seeding
pub trait ConversationLog: Send + Sync {
    fn append(&self, entry: ConversationEntry);

    /// The most recent `limit` entries, oldest first
    fn recent(&self, limit: usize) -> Vec<ConversationEntry>;
}

/// Bounded in-memory log
pub struct MemoryConversationLog {
    entries: Mutex<VecDeque<ConversationEntry>>,
    capacity: usize,
}

impl MemoryConversationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryConversationLog {
    fn default() -> Self {
        Self::new(500)
    }
}

impl ConversationLog for MemoryConversationLog {
    fn append(&self, entry: ConversationEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    fn recent(&self, limit: usize) -> Vec<ConversationEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_is_bounded_and_ordered() {
        let log = MemoryConversationLog::new(3);
        for i in 0..5 {
            log.append(ConversationEntry::new(format!("q{i}"), "r", "s"));
        }
        assert_eq!(log.len(), 3);

        let recent = log.recent(2);
        let queries: Vec<&str> = recent.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["q3", "q4"]);
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = ConversationEntry::new("hello", "hi", "locale.es");
        let json = serde_json::to_string(&entry).unwrap();
        let back: ConversationEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
