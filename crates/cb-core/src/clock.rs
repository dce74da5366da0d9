//! # Time Normalization
//!
//! All timestamps are Tokyo wall-clock times. A request reads the clock once
//! and derives both the stored timestamp and the identity date from that
//! single [`PostInstant`].

use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};

/// Asia/Tokyo has no daylight saving time, so a fixed +09:00 offset is exact.
const TOKYO_OFFSET_SECS: i32 = 9 * 3600;

pub fn tokyo_offset() -> FixedOffset {
    FixedOffset::east_opt(TOKYO_OFFSET_SECS).expect("+09:00 is within the valid offset range")
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Reads the clock once for a whole request.
    fn instant(&self) -> PostInstant {
        PostInstant::from_datetime(self.now())
    }
}

/// The system clock rendered in Tokyo time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokyoClock;

impl Clock for TokyoClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&tokyo_offset())
    }
}

/// A settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Pins the clock at a Tokyo wall-clock time.
    pub fn at_tokyo(local: NaiveDateTime) -> Option<Self> {
        local
            .and_local_timezone(tokyo_offset())
            .single()
            .map(Self::new)
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// The single instant a request works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInstant {
    /// Tokyo wall-clock time, truncated to whole seconds
    pub created_at: NaiveDateTime,
    /// `YYYY-MM-DD` of `created_at`, fed to identity derivation
    pub date_key: String,
}

impl PostInstant {
    pub fn from_datetime(now: DateTime<FixedOffset>) -> Self {
        let local = now.with_timezone(&tokyo_offset()).naive_local();
        let created_at = local.with_nanosecond(0).unwrap_or(local);
        Self {
            date_key: created_at.format("%Y-%m-%d").to_string(),
            created_at,
        }
    }
}

/// Display format for timestamps.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
