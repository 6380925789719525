/// Message retention.
///
/// Messages older than the window are deleted lazily: every handler that reads
/// or writes messages calls [`RetentionPolicy::enforce`] first. A periodic
/// sweep can run alongside when an interval is configured.
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::db::{Database, DbPool};

pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy::new(DEFAULT_RETENTION)
    }
}

impl RetentionPolicy {
    pub fn new(window: Duration) -> Self {
        RetentionPolicy { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Oldest timestamp still visible at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        // Saturates instead of panicking for absurd configured windows
        chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Purge everything outside the window. Returns the number of messages removed.
    pub async fn enforce(&self, pool: &DbPool) -> rusqlite::Result<usize> {
        let removed = Database::purge_expired(pool, self.cutoff(Utc::now())).await?;
        if removed > 0 {
            log::debug!("Purged {} expired messages", removed);
        }
        Ok(removed)
    }
}

/// Background task that purges expired messages on a fixed interval.
pub async fn run_sweep_loop(pool: DbPool, policy: RetentionPolicy, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        match policy.enforce(&pool).await {
            Ok(count) => {
                if count > 0 {
                    log::info!("Sweep: purged {} expired messages", count);
                }
            }
            Err(e) => {
                log::warn!("Sweep error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[test]
    fn test_default_window_is_one_day() {
        assert_eq!(RetentionPolicy::default().window(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_cutoff() {
        let now = Utc::now();
        let policy = RetentionPolicy::new(Duration::from_secs(3600));
        assert_eq!(policy.cutoff(now), now - chrono::Duration::hours(1));
    }

    #[test]
    fn test_cutoff_saturates() {
        let policy = RetentionPolicy::new(Duration::from_secs(u64::MAX));
        assert_eq!(policy.cutoff(Utc::now()), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn test_enforce_drops_messages_outside_window() {
        let pool = create_test_pool();
        let now = Utc::now();

        Database::store_message_at(&pool, "u1", "u2", "old", now - chrono::Duration::hours(2))
            .await
            .expect("Failed to store");
        Database::store_message(&pool, "u1", "u2", "new")
            .await
            .expect("Failed to store");

        let removed = RetentionPolicy::new(Duration::from_secs(3600))
            .enforce(&pool)
            .await
            .expect("Failed to enforce");
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_sweep_loop_purges_on_first_tick() {
        let pool = create_test_pool();
        Database::store_message_at(
            &pool,
            "u1",
            "u2",
            "old",
            Utc::now() - chrono::Duration::hours(30),
        )
        .await
        .expect("Failed to store");

        let sweep = tokio::spawn(run_sweep_loop(
            pool.clone(),
            RetentionPolicy::default(),
            Duration::from_secs(3600),
        ));
        // The first tick of a tokio interval completes immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweep.abort();

        let remaining = Database::all_messages(&pool, DateTime::<Utc>::MIN_UTC)
            .await
            .expect("Failed to read");
        assert!(remaining.is_empty());
    }
}
