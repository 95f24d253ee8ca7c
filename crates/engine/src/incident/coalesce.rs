use dashmap::DashMap;

/// Narrow ledger view the normalizer needs to decide whether a `resolved`
/// delivery has anything to resolve.
pub trait OpenExecutions: Send + Sync {
    fn has_open_execution(&self, incident_id: &str) -> bool;
}

/// Per-fingerprint coalescing window. Repeated `firing` deliveries inside
/// the window collapse into one occurrence; each suppressed delivery
/// refreshes the last-seen marker, so a steadily re-notifying condition
/// stays a single occurrence.
pub struct Coalescer {
    window_ms: i64,
    last_seen: DashMap<String, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringDecision {
    Emit,
    Suppress,
}

impl Coalescer {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            last_seen: DashMap::new(),
        }
    }

    pub fn observe_firing(&self, fingerprint: &str, now_ms: i64) -> FiringDecision {
        let mut emit = FiringDecision::Emit;
        self.last_seen
            .entry(fingerprint.to_string())
            .and_modify(|last| {
                if now_ms - *last < self.window_ms {
                    emit = FiringDecision::Suppress;
                }
                *last = now_ms;
            })
            .or_insert(now_ms);
        emit
    }

    /// An accepted `resolved` closes the occurrence; the next `firing`
    /// opens a fresh one regardless of the window.
    pub fn clear(&self, fingerprint: &str) {
        self.last_seen.remove(fingerprint);
    }

    pub fn evict_older_than(&self, cutoff_ms: i64) {
        self.last_seen.retain(|_, last| *last >= cutoff_ms);
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
