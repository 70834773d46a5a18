//! Time-boxed result cache shared by the scanner and peer discovery.

/// Results of the last refresh and when it started.
///
/// A cache that was never refreshed is always stale.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedCache<T> {
    results: Vec<T>,
    refreshed_at: Option<u64>,
    max_age_ms: u64,
}

impl<T: Clone> TimedCache<T> {
    /// Creates an empty, stale cache.
    pub fn new(max_age_ms: u64) -> Self {
        Self {
            results: Vec::new(),
            refreshed_at: None,
            max_age_ms,
        }
    }

    /// Returns true if a refresh started less than `max_age_ms` before `now_ms`.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        self.refreshed_at
            .is_some_and(|at| now_ms.saturating_sub(at) < self.max_age_ms)
    }

    /// Records the start of a refresh.
    pub fn mark_refreshed(&mut self, now_ms: u64) {
        self.refreshed_at = Some(now_ms);
    }

    /// Replaces the cached results.
    pub fn replace(&mut self, results: Vec<T>) {
        self.results = results;
    }

    /// The cached results, fresh or not.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    /// Clones the cached results.
    pub fn snapshot(&self) -> Vec<T> {
        self.results.clone()
    }

    /// When the last refresh started.
    pub fn refreshed_at(&self) -> Option<u64> {
        self.refreshed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_refreshed_is_stale() {
        let cache: TimedCache<u8> = TimedCache::new(30_000);
        assert!(!cache.is_fresh(0));
        assert!(!cache.is_fresh(10));
    }

    #[test]
    fn freshness_window() {
        let mut cache: TimedCache<u8> = TimedCache::new(30_000);
        cache.mark_refreshed(1_000);
        assert!(cache.is_fresh(1_000));
        assert!(cache.is_fresh(30_999));
        assert!(!cache.is_fresh(31_000));
    }

    #[test]
    fn refresh_at_time_zero_counts() {
        let mut cache: TimedCache<u8> = TimedCache::new(100);
        cache.mark_refreshed(0);
        assert!(cache.is_fresh(50));
    }

    #[test]
    fn replace_keeps_timestamp() {
        let mut cache = TimedCache::new(100);
        cache.mark_refreshed(5);
        cache.replace(vec![1, 2, 3]);
        assert_eq!(cache.results(), &[1, 2, 3]);
        assert_eq!(cache.refreshed_at(), Some(5));
    }
}
