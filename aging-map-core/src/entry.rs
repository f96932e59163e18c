use std::time::{Duration, Instant};

/// A stored value together with the instant it was written
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, inserted_at: Instant) -> Self {
        Self { value, inserted_at }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Live iff strictly less than `ttl` has elapsed since insertion.
    ///
    /// A clock reading earlier than `inserted_at` counts as zero elapsed.
    pub(crate) fn is_live_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }

    pub(crate) fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        !self.is_live_at(now, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_live_before_ttl() {
        let start = Instant::now();
        let entry = Entry::new("value", start);

        assert_eq!(*entry.value(), "value");
        assert!(entry.is_live_at(start, Duration::from_secs(1)));
        assert!(entry.is_live_at(start + Duration::from_millis(999), Duration::from_secs(1)));
    }

    #[test]
    fn test_entry_expired_exactly_at_ttl() {
        let start = Instant::now();
        let entry = Entry::new(1, start);

        assert!(entry.is_expired_at(start + Duration::from_secs(1), Duration::from_secs(1)));
        assert!(entry.is_expired_at(start + Duration::from_secs(5), Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_ttl_is_always_expired() {
        let start = Instant::now();
        let entry = Entry::new(1, start);

        assert!(entry.is_expired_at(start, Duration::ZERO));
    }

    #[test]
    fn test_clock_before_insertion_counts_as_fresh() {
        let start = Instant::now() + Duration::from_secs(10);
        let entry = Entry::new(1, start);

        assert!(entry.is_live_at(Instant::now(), Duration::from_secs(1)));
    }
}
