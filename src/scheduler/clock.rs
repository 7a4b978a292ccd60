//! Time sources and day arithmetic
//!
//! All scheduling math works on integer Unix seconds. "Days" are counted
//! from local midnight, so the helpers here go through `chrono::Local`.

use std::cell::Cell;

use chrono::{Local, NaiveDateTime, TimeZone, Utc};

pub const SECS_PER_DAY: i64 = 86_400;

/// A source of wall-clock time
pub trait Clock {
    /// Current time in Unix milliseconds
    fn now_millis(&self) -> i64;

    /// Current time in Unix seconds
    fn now(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

/// The real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// Used by tests and by the CLI simulator to replay several days of study in
/// a few milliseconds.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: Cell<i64>,
}

impl ManualClock {
    pub fn at(secs: i64) -> Self {
        Self {
            millis: Cell::new(secs * 1000),
        }
    }

    /// A clock set to the given local date and time
    pub fn at_local(datetime: NaiveDateTime) -> Self {
        Self::at(local_to_timestamp(datetime))
    }

    pub fn set(&self, secs: i64) {
        self.millis.set(secs * 1000);
    }

    pub fn advance(&self, secs: i64) {
        self.millis.set(self.millis.get() + secs * 1000);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(days * SECS_PER_DAY);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

/// Generates unique, creation-ordered identifiers from a millisecond clock
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// A generator whose ids all exceed `last`
    pub fn starting_after(last: i64) -> Self {
        Self { last }
    }

    /// Next id: the current millisecond, or one past the previous id if the
    /// clock has not moved since.
    pub fn next_id(&mut self, clock: &impl Clock) -> i64 {
        let id = clock.now_millis().max(self.last + 1);
        self.last = id;
        id
    }
}

/// Convert a local wall-clock time to a Unix timestamp.
///
/// Times skipped by a DST jump fall back to interpreting the value as UTC.
pub fn local_to_timestamp(datetime: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&datetime).earliest() {
        Some(dt) => dt.timestamp(),
        None => datetime.and_utc().timestamp(),
    }
}

/// Unix timestamp of the local midnight that starts the day containing `secs`
pub fn start_of_local_day(secs: i64) -> i64 {
    let local = match Local.timestamp_opt(secs, 0).earliest() {
        Some(dt) => dt,
        None => return secs - secs.rem_euclid(SECS_PER_DAY),
    };
    match local.date_naive().and_hms_opt(0, 0, 0) {
        Some(midnight) => local_to_timestamp(midnight),
        None => secs - secs.rem_euclid(SECS_PER_DAY),
    }
}

/// The first local midnight strictly after `secs`, after which "today"
/// advances. At midnight itself this is the following midnight.
pub fn next_day_cutoff(secs: i64) -> i64 {
    let midnight = start_of_local_day(secs);
    let tomorrow = Local
        .timestamp_opt(secs, 0)
        .earliest()
        .and_then(|dt| dt.date_naive().succ_opt())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(local_to_timestamp);
    match tomorrow {
        Some(next) if next > secs => next,
        _ => midnight + SECS_PER_DAY,
    }
}

/// Whole days elapsed from `start` to `now`
pub fn days_between(start: i64, now: i64) -> i64 {
    (now - start).div_euclid(SECS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_ids_strictly_increase_on_frozen_clock() {
        let clock = ManualClock::at(1_700_000_000);
        let mut ids = IdGenerator::new();
        let a = ids.next_id(&clock);
        let b = ids.next_id(&clock);
        let c = ids.next_id(&clock);
        assert_eq!(a, 1_700_000_000_000);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_ids_follow_clock() {
        let clock = ManualClock::at(1_700_000_000);
        let mut ids = IdGenerator::new();
        ids.next_id(&clock);
        clock.advance(5);
        assert_eq!(ids.next_id(&clock), 1_700_000_005_000);
    }

    #[test]
    fn test_day_cutoff_is_next_midnight() {
        let now = local_to_timestamp(noon());
        let start = start_of_local_day(now);
        let cutoff = next_day_cutoff(now);
        assert!(start <= now && now < cutoff);
        assert_eq!(start_of_local_day(cutoff), cutoff);
    }

    #[test]
    fn test_day_cutoff_at_midnight_is_the_following_midnight() {
        let start = start_of_local_day(local_to_timestamp(noon()));
        let cutoff = next_day_cutoff(start);
        assert!(cutoff > start);
        assert_eq!(start_of_local_day(cutoff), cutoff);
        assert_eq!(next_day_cutoff(start + 1), cutoff);
        assert_eq!(next_day_cutoff(cutoff - 1), cutoff);
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(0, SECS_PER_DAY - 1), 0);
        assert_eq!(days_between(0, SECS_PER_DAY), 1);
        assert_eq!(days_between(SECS_PER_DAY, 0), -1);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at(100);
        clock.advance(20);
        assert_eq!(clock.now(), 120);
        clock.advance_days(1);
        assert_eq!(clock.now(), 120 + SECS_PER_DAY);
        clock.set(5);
        assert_eq!(clock.now_millis(), 5000);
    }
}
