use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 2024-06-01T12:00:00Z; the fixtures are dated relative to this instant.
pub const FIXTURE_NOW: i64 = 1_717_243_200;

/// Controllable time shared by recorded events and the pipeline's "today".
///
/// Events are stamped with the clock's current time, and the same clock is
/// passed to `PipelineContext::with_time_provider()`, so waiting between
/// recording and extracting moves events towards the end of the lookback window.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicI64>,
}

impl MockClock {
    /// Creates a time provider function suitable for passing to PipelineContext.
    pub fn as_provider(&self) -> impl Fn() -> i64 + Send + Sync + 'static {
        let current = self.current.clone();
        move || current.load(Ordering::SeqCst)
    }
}

impl MockClock {
    /// Create a clock starting at the given Unix timestamp
    pub fn at(secs: i64) -> Self {
        Self {
            current: Arc::new(AtomicI64::new(secs)),
        }
    }

    /// Get current timestamp
    pub fn now(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Current time as a UTC datetime
    pub fn now_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.now(), 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Advance time by duration
    pub fn advance(&self, duration: Duration) {
        let seconds = duration.as_secs() as i64;
        self.current.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Advance time by days
    pub fn advance_days(&self, days: u64) {
        self.advance(Duration::from_secs(days * 86400));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(FIXTURE_NOW)
    }
}
