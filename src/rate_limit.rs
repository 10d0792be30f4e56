use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::metrics::TRACKED_USERS;

// Sliding-window usage ledger keyed by username. Each user maps to the
// timestamps (seconds since epoch) of their recent admitted requests, pruned
// only when that user is touched again or by evict_idle.
pub struct UsageLedger {
    history: DashMap<String, Vec<f64>>,
    limit: usize,
    window: f64,
}

impl UsageLedger {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            history: DashMap::new(),
            limit,
            window: window.as_secs_f64(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window)
    }

    // Prune to the window ending at `now`, then record `now` if there is room.
    // On denial returns whole seconds until the oldest in-window request ages
    // out (at least 1). The pruned history is kept even when denied.
    pub fn try_record(&self, user_id: &str, now: f64) -> Result<(), u64> {
        // entry() holds the shard write lock until the guard drops, so two
        // requests for the same user cannot both see room for one more slot
        let mut entry = self.history.entry(user_id.to_string()).or_default();
        entry.retain(|&t| now - t < self.window);

        if entry.len() >= self.limit {
            let retry_after = match entry.iter().copied().reduce(f64::min) {
                Some(oldest) => (self.window - (now - oldest)).ceil().max(1.0) as u64,
                None => 1,
            };
            return Err(retry_after);
        }

        entry.push(now);
        Ok(())
    }

    pub fn record_and_check(&self, user_id: &str, now: f64) -> bool {
        self.try_record(user_id, now).is_ok()
    }

    // in-window requests currently stored for the user
    pub fn usage(&self, user_id: &str) -> usize {
        self.history.get(user_id).map_or(0, |h| h.len())
    }

    pub fn tracked_users(&self) -> usize {
        self.history.len()
    }

    // Drop users with no request inside the window ending at `now`,
    // returns how many were removed
    pub fn evict_idle(&self, now: f64) -> usize {
        let before = self.history.len();
        self.history
            .retain(|_, h| h.iter().any(|&t| now - t < self.window));
        before.saturating_sub(self.history.len())
    }
}

pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// Periodically drops idle users so the ledger does not grow with every
// username ever seen
pub async fn sweeper<C>(ledger: Arc<UsageLedger>, every: Duration, clock: C)
where
    C: Fn() -> f64 + Send + 'static,
{
    let mut interval = interval(every);

    tracing::info!(interval = ?every, "usage ledger sweeper started");

    loop {
        interval.tick().await;

        let evicted = ledger.evict_idle(clock());
        TRACKED_USERS.set(ledger.tracked_users() as f64);

        if evicted > 0 {
            tracing::debug!(evicted, remaining = ledger.tracked_users(), "evicted idle users");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> UsageLedger {
        UsageLedger::new(5, Duration::from_secs(60))
    }

    #[test]
    fn admits_up_to_limit_then_denies() {
        let ledger = ledger();
        for i in 0..5 {
            assert!(ledger.record_and_check("aditya", 1000.0 + i as f64));
        }
        assert!(!ledger.record_and_check("aditya", 1005.0));
        assert_eq!(ledger.usage("aditya"), 5);
    }

    #[test]
    fn repeated_denials_do_not_grow_history() {
        let ledger = ledger();
        for _ in 0..5 {
            assert!(ledger.record_and_check("aditya", 1000.0));
        }
        for i in 0..20 {
            assert!(!ledger.record_and_check("aditya", 1001.0 + i as f64));
        }
        assert_eq!(ledger.usage("aditya"), 5);
    }

    #[test]
    fn window_slides_once_oldest_ages_out() {
        let ledger = ledger();
        assert!(ledger.record_and_check("aditya", 1000.0));
        for _ in 0..4 {
            assert!(ledger.record_and_check("aditya", 1030.0));
        }
        assert!(!ledger.record_and_check("aditya", 1059.9));
        // exactly one window later the first timestamp no longer counts
        assert!(ledger.record_and_check("aditya", 1060.0));
        assert_eq!(ledger.usage("aditya"), 5);
    }

    #[test]
    fn denial_persists_pruned_history() {
        let ledger = ledger();
        ledger.history.insert(
            "aditya".into(),
            vec![900.0, 950.0, 1000.0, 1001.0, 1002.0, 1003.0, 1004.0],
        );
        assert!(!ledger.record_and_check("aditya", 1010.0));
        assert_eq!(*ledger.history.get("aditya").unwrap(), vec![
            1000.0, 1001.0, 1002.0, 1003.0, 1004.0
        ]);
    }

    #[test]
    fn users_are_independent() {
        let ledger = ledger();
        for _ in 0..5 {
            ledger.record_and_check("aditya", 1000.0);
        }
        assert!(!ledger.record_and_check("aditya", 1000.0));
        assert!(ledger.record_and_check("priya", 1000.0));
    }

    #[test]
    fn denial_reports_seconds_until_oldest_expiry() {
        let ledger = ledger();
        for t in [1000.0, 1010.0, 1020.0, 1030.0, 1040.0] {
            assert_eq!(ledger.try_record("aditya", t), Ok(()));
        }
        assert_eq!(ledger.try_record("aditya", 1045.0), Err(15));
        assert_eq!(ledger.try_record("aditya", 1059.5), Err(1));
        assert_eq!(ledger.usage("aditya"), 5);
    }

    #[test]
    fn evict_idle_drops_only_stale_users() {
        let ledger = ledger();
        ledger.record_and_check("old", 1000.0);
        ledger.record_and_check("fresh", 1050.0);
        assert_eq!(ledger.evict_idle(1070.0), 1);
        assert_eq!(ledger.tracked_users(), 1);
        assert_eq!(ledger.usage("fresh"), 1);
    }

    #[test]
    fn concurrent_requests_never_exceed_limit() {
        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || ledger.record_and_check("aditya", 1000.0))
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();

        assert_eq!(admitted, 5);
        assert_eq!(ledger.usage("aditya"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_users_once_their_window_passes() {
        let ledger = Arc::new(ledger());
        let start = tokio::time::Instant::now();
        let clock = move || 1000.0 + start.elapsed().as_secs_f64();

        ledger.record_and_check("aditya", 1000.0);
        ledger.record_and_check("priya", 1000.0);
        let task = tokio::spawn(sweeper(Arc::clone(&ledger), Duration::from_secs(10), clock));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ledger.tracked_users(), 2);

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(ledger.tracked_users(), 0);
        assert_eq!(TRACKED_USERS.get(), 0.0);

        task.abort();
    }
}
