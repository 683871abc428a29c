//! Nightly reset of the allocation table
//!
//! A single background task sleeps until the next local midnight, clears
//! every client's history and goes back to sleep. The delay is recomputed
//! from the wall clock after every reset instead of accumulating a fixed
//! 24 hour interval, so oversleeping on one night does not push the next
//! reset later.

use crate::metrics::Metrics;
use crate::tracker::AllocationTracker;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time remaining from `now` until the start of the next calendar day in
/// `now`'s timezone
///
/// DST handling follows the usual rules: an ambiguous midnight resolves to
/// the earliest instant, and a midnight that does not exist (a spring-forward
/// gap at 00:00) resolves to the first valid hour after it.
pub fn until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|day| local_midnight(&tz, day));

    match next {
        Some(next) => next
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO),
        None => ONE_DAY,
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
    (0..3).find_map(|hour| {
        let local = day.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&local).earliest()
    })
}

/// Background task that resets the allocation table once a day
pub struct DailyReset;

impl DailyReset {
    /// Spawn the reset loop on the current runtime, firing at local midnight
    ///
    /// The loop runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn(tracker: AllocationTracker, metrics: Arc<Metrics>) -> JoinHandle<()> {
        Self::spawn_with(tracker, metrics, || until_next_midnight(&Local::now()))
    }

    /// Spawn the reset loop with a custom delay function
    ///
    /// `next_delay` is called before every sleep and must return the time
    /// left until the next reset.
    pub fn spawn_with<F>(
        tracker: AllocationTracker,
        metrics: Arc<Metrics>,
        mut next_delay: F,
    ) -> JoinHandle<()>
    where
        F: FnMut() -> Duration + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                let delay = next_delay();
                tracing::debug!("Next allocation reset in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;

                let cleared = tracker.reset_all();
                metrics.record_reset();
                tracing::info!("Daily reset cleared {} client records", cleared);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuoteStore;
    use chrono::{FixedOffset, Timelike, Utc};
    use chrono_tz::America::Havana;
    use chrono_tz::Europe::Berlin;

    #[test]
    fn test_until_next_midnight_fixed_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_until_next_midnight_at_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(until_next_midnight(&now), ONE_DAY);
    }

    #[test]
    fn test_until_next_midnight_subsecond() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        assert_eq!(until_next_midnight(&now), Duration::from_millis(500));
    }

    #[test]
    fn test_until_next_midnight_crosses_year_and_leap_day() {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(12 * 3600));

        let now = Utc.with_ymd_and_hms(2024, 2, 28, 18, 0, 0).unwrap();
        assert_eq!(until_next_midnight(&now), Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_until_next_midnight_uses_local_calendar() {
        // 22:00 UTC is already the next day in UTC+3
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 22, 0, 0)
            .unwrap()
            .with_timezone(&tz);
        assert_eq!(until_next_midnight(&now), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn test_until_next_midnight_skipped_midnight() {
        // Havana springs forward at 00:00 on 2024-03-10, so local midnight
        // does not exist and the reset moves to 01:00 CDT (05:00 UTC)
        let now = Utc
            .with_ymd_and_hms(2024, 3, 10, 3, 0, 0)
            .unwrap()
            .with_timezone(&Havana);
        assert_eq!(now.hour(), 22);
        assert_eq!(until_next_midnight(&now), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_until_next_midnight_repeated_midnight() {
        // Havana falls back at 01:00 on 2024-11-03, so 00:00 occurs twice;
        // the earlier one (00:00 CDT, 04:00 UTC) wins
        let now = Utc
            .with_ymd_and_hms(2024, 11, 3, 2, 0, 0)
            .unwrap()
            .with_timezone(&Havana);
        assert_eq!(now.hour(), 22);
        assert_eq!(until_next_midnight(&now), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_until_next_midnight_regular_dst_zone() {
        // Berlin switches at 02:00, so midnight itself is unaffected
        let now = Utc
            .with_ymd_and_hms(2024, 3, 30, 22, 0, 0)
            .unwrap()
            .with_timezone(&Berlin);
        assert_eq!(until_next_midnight(&now), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_loop_fires() {
        let tracker = AllocationTracker::new(Arc::new(QuoteStore::parse("A\tQ1").unwrap()));
        let metrics = Arc::new(Metrics::new());

        tracker.issue_for_client("c1").unwrap();
        assert!(tracker.issue_for_client("c1").is_err());

        let handle = DailyReset::spawn_with(tracker.clone(), metrics.clone(), || {
            Duration::from_secs(3600)
        });

        tokio::time::sleep(Duration::from_secs(3599)).await;
        assert_eq!(tracker.used_today("c1"), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.used_today("c1"), 0);
        assert!(tracker.issue_for_client("c1").is_ok());
        assert_eq!(metrics.resets(), 1);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(metrics.resets(), 2);

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_loop_recomputes_delay() {
        let tracker = AllocationTracker::new(Arc::new(QuoteStore::parse("A\tQ1").unwrap()));
        let metrics = Arc::new(Metrics::new());

        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = DailyReset::spawn_with(tracker, metrics.clone(), move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Duration::from_secs(10)
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        handle.abort();

        assert_eq!(metrics.resets(), 3);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 4);
    }
}
