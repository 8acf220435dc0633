use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PendingSummary {
    pub id: u64,
    pub tab_id: String,
    pub tab_name: String,
    pub requested_at: Instant,
}

/// At most one summary request in flight per tab.
pub struct PendingSummaryRegistry {
    requests: HashMap<String, PendingSummary>, // tab id -> request
    next_id: u64,
}

impl Default for PendingSummaryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingSummaryRegistry {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            next_id: 1,
        }
    }

    /// Try to register a request. Returns its id, or `None` if one is already
    /// pending for the tab.
    pub fn try_register(&mut self, tab_id: String, tab_name: String) -> Option<u64> {
        if self.requests.contains_key(&tab_id) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.requests.insert(
            tab_id.clone(),
            PendingSummary {
                id,
                tab_id,
                tab_name,
                requested_at: Instant::now(),
            },
        );
        Some(id)
    }

    /// Mark the request as finished (answered or failed).
    pub fn complete(&mut self, tab_id: &str) -> Option<PendingSummary> {
        self.requests.remove(tab_id)
    }

    /// Finish request `id` for the tab. A reply to an expired or replaced
    /// request leaves the current one alone and returns `None`.
    pub fn complete_request(&mut self, tab_id: &str, id: u64) -> Option<PendingSummary> {
        if self.requests.get(tab_id)?.id != id {
            return None;
        }
        self.requests.remove(tab_id)
    }

    pub fn is_pending(&self, tab_id: &str) -> bool {
        self.requests.contains_key(tab_id)
    }

    /// Remove and return requests older than `max_age`, so a lost response
    /// does not block the tab forever.
    pub fn expire_older_than(&mut self, max_age: Duration) -> Vec<PendingSummary> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .requests
            .iter()
            .filter(|(_, req)| now.duration_since(req.requested_at) > max_age)
            .map(|(id, _)| id.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.requests.remove(&id))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.requests.len()
    }
}
