use dashmap::DashMap;
use serde::Serialize;

use responder_common::ids::new_dead_letter_id;
use responder_common::time::now_ms;

use super::target::Delivery;

/// A delivery that exhausted its retry budget, held for manual replay.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLetter {
    pub id: String,
    pub incident_id: String,
    pub target: String,
    pub delivery: Delivery,
    pub error: String,
    pub attempts: u32,
    pub created_at_ms: i64,
}

/// In-memory dead-letter holding area, keyed by entry id. Entries only
/// leave through explicit replay or delete.
pub struct DeadLetterStore {
    entries: DashMap<String, DeadLetter>,
}

impl DeadLetterStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn insert(&self, target: &str, delivery: Delivery, error: String, attempts: u32) -> String {
        let id = new_dead_letter_id();
        let entry = DeadLetter {
            id: id.clone(),
            incident_id: delivery.incident.incident_id.clone(),
            target: target.to_string(),
            delivery,
            error,
            attempts,
            created_at_ms: now_ms(),
        };
        self.entries.insert(id.clone(), entry);
        id
    }

    pub fn get(&self, id: &str) -> Option<DeadLetter> {
        self.entries.get(id).map(|e| e.clone())
    }

    pub fn list(&self, target: Option<&str>) -> Vec<DeadLetter> {
        let mut out: Vec<DeadLetter> = self
            .entries
            .iter()
            .filter(|e| target.map_or(true, |t| e.target == t))
            .map(|e| e.clone())
            .collect();
        out.sort_by_key(|e| e.created_at_ms);
        out
    }

    pub fn delete(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeadLetterStore {
    fn default() -> Self {
        Self::new()
    }
}
