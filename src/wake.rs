//! # Wake Scheduling
//!
//! Computes how long to sleep so the device next wakes at the configured
//! wall-clock target. A wrong result here either wastes battery or leaves a
//! stale display up for a whole day, so the arithmetic is kept as a pure
//! function over an injected clock reading.
//!
//! The clock collaborator may fail to produce a reading (time never
//! synchronized); that path falls back to exactly one day of sleep, which
//! keeps the device cycling rather than hanging.

use chrono::{Local, NaiveTime, Timelike};

/// Seconds in one day, and the fallback sleep when the clock is unusable.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// The wall-clock collaborator.
///
/// `synchronize` performs whatever bounded effort the platform needs before
/// local time is trustworthy (SNTP on the original board, a no-op where the
/// OS keeps time). `now` may fail afterwards; callers must treat `None` as
/// "time unknown", not as an error.
pub trait Clock {
    /// Attempt to synchronize wall-clock time. Returns false if time is
    /// still not trustworthy after the platform's bounded retries.
    fn synchronize(&mut self) -> bool;

    /// Current local time of day, if known.
    fn now(&self) -> Option<NaiveTime>;
}

/// Host clock: the OS synchronizes time, chrono reads it.
pub struct SystemClock;

impl Clock for SystemClock {
    fn synchronize(&mut self) -> bool {
        true
    }

    fn now(&self) -> Option<NaiveTime> {
        Some(Local::now().time())
    }
}

/// Seconds to sleep until the next occurrence of `hour:minute`.
///
/// With a valid `now` this is exact to the second: a target later today
/// yields the plain difference, a target already passed (or exactly now)
/// rolls over to tomorrow. Without a reading it is exactly one day. The
/// result is always in `(0, 86400]` for any input; a target beyond 23:59
/// is wrapped into the day first, so an unchecked caller cannot schedule
/// a sleep longer than a day.
pub fn compute_sleep_seconds(hour: u32, minute: u32, now: Option<NaiveTime>) -> u32 {
    let now = match now {
        Some(now) => now,
        None => {
            log::warn!("no clock reading, sleeping one full day");
            return SECONDS_PER_DAY;
        }
    };

    let target = ((hour * 3600 + minute * 60) % SECONDS_PER_DAY) as i64;
    let current = now.num_seconds_from_midnight() as i64;

    let mut delta = target - current;
    if delta <= 0 {
        // Target already passed today; next occurrence is tomorrow
        delta += SECONDS_PER_DAY as i64;
    }
    delta as u32
}
