use common::QueryCount;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Cumulative query popularity and per-replica latency counters, plus the
/// last Top-10 actually pushed to observers (so pushes only happen when the
/// ordered Top-10 content changes).
#[derive(Default)]
pub struct QueryStats {
    query_counts: Mutex<HashMap<String, u64>>,
    replica_times: Mutex<HashMap<String, (u64, u64)>>, // cumulative nanos, call count
    last_pushed: Mutex<Vec<QueryCount>>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one served search: bump the normalized query's counter and the
    /// serving replica's latency totals.
    pub fn record(&self, query: &str, replica: &str, elapsed: Duration) {
        *self.query_counts.lock().entry(query.to_string()).or_insert(0) += 1;
        let mut times = self.replica_times.lock();
        let entry = times.entry(replica.to_string()).or_insert((0, 0));
        entry.0 += elapsed.as_nanos().min(u64::MAX as u128) as u64;
        entry.1 += 1;
    }

    /// The ten most frequent queries, by descending count with ties broken
    /// by query string so the ordering is deterministic.
    pub fn top10(&self) -> Vec<QueryCount> {
        let counts = self.query_counts.lock();
        let mut entries: Vec<QueryCount> = counts
            .iter()
            .map(|(query, count)| QueryCount {
                query: query.clone(),
                count: *count,
            })
            .collect();
        drop(counts);
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
        entries.truncate(10);
        entries
    }

    /// Recompute the Top-10 and compare against what observers last saw.
    /// Returns the fresh list (and remembers it) only when the content
    /// differs; unchanged content means no push.
    pub fn top10_if_changed(&self) -> Option<Vec<QueryCount>> {
        let fresh = self.top10();
        let mut last = self.last_pushed.lock();
        if *last == fresh {
            return None;
        }
        *last = fresh.clone();
        Some(fresh)
    }

    /// Average response time per replica in deciseconds, rounded to one
    /// decimal. Replicas that never served a call are absent.
    pub fn avg_response_deciseconds(&self) -> HashMap<String, f64> {
        self.replica_times
            .lock()
            .iter()
            .filter(|(_, (_, count))| *count > 0)
            .map(|(name, (nanos, count))| {
                let deciseconds = *nanos as f64 / *count as f64 / 1e8;
                (name.clone(), (deciseconds * 10.0).round() / 10.0)
            })
            .collect()
    }
}
