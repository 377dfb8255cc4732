use std::time::{Duration, Instant};

/// Single-slot cache holding a value and the instant it was inserted.
/// The caller passes the current instant in, so tests can drive expiry
/// without sleeping.
#[derive(Debug)]
pub struct TtlCache<T> {
    slot: Option<(T, Instant)>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: None, ttl }
    }

    pub fn get(&self, now: Instant) -> Option<&T> {
        match &self.slot {
            Some((value, inserted_at)) if now.duration_since(*inserted_at) < self.ttl => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn put(&mut self, value: T, now: Instant) {
        self.slot = Some((value, now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get(Instant::now()).is_none());
    }

    #[test]
    fn test_fresh_value_hits() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put(42, t0);
        assert_eq!(cache.get(t0 + Duration::from_secs(59)), Some(&42));
    }

    #[test]
    fn test_expired_value_misses() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put(42, t0);
        assert!(cache.get(t0 + Duration::from_secs(60)).is_none());
        assert!(cache.get(t0 + Duration::from_secs(3600)).is_none());
    }

    #[test]
    fn test_put_refreshes_insertion_time() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put(1, t0);
        let t1 = t0 + Duration::from_secs(50);
        cache.put(2, t1);
        assert_eq!(cache.get(t1 + Duration::from_secs(59)), Some(&2));
    }

}
