//! Datetime value family (`SPEC_FULL.md` §4.4 ambient addition).
//!
//! `spec.md` §3.1 lists `LocalDate`/`LocalTime`/`LocalDateTime`/`Instant`
//! as heap-backed value tags but leaves their operations unspecified (the
//! method catalogue is "illustrative, not normative" per §1). This gives
//! them a minimal surface built on `chrono`, with `now()`/`today()` bound
//! to an injectable `Clock` so tests are deterministic.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Supplies the current instant. The VM's default clock reads the system
/// time; tests inject a fixed clock instead.
pub trait Clock: std::fmt::Debug {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDate(NaiveDate);

impl LocalDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(LocalDate)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn plus_days(&self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(chrono::Duration::days(days)).map(LocalDate)
    }

    pub fn to_iso_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalTime(NaiveTime);

impl LocalTime {
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(LocalTime)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn to_iso_string(&self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }

    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime(NaiveDateTime);

impl LocalDateTime {
    pub fn new(date: LocalDate, time: LocalTime) -> Self {
        LocalDateTime(NaiveDateTime::new(date.0, time.0))
    }

    pub fn date(&self) -> LocalDate {
        LocalDate(self.0.date())
    }

    pub fn time(&self) -> LocalTime {
        LocalTime(self.0.time())
    }

    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp_millis(millis).map(|dt| LocalDateTime(dt.naive_utc()))
    }

    pub fn to_epoch_millis(&self) -> i64 {
        self.0.and_utc().timestamp_millis()
    }

    pub fn to_iso_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// A point in time independent of any calendar, stored as milliseconds
/// since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(i64);

impl Instant {
    pub fn from_epoch_millis(millis: i64) -> Self {
        Instant(millis)
    }

    pub fn epoch_millis(&self) -> i64 {
        self.0
    }

    pub fn plus_millis(&self, delta: i64) -> Option<Self> {
        self.0.checked_add(delta).map(Instant)
    }

    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedClock(i64);
    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let clock = FixedClock(1_700_000_000_000);
        assert_eq!(clock.now_millis(), 1_700_000_000_000);
    }

    #[test]
    fn date_round_trips_through_iso_string() {
        let d = LocalDate::from_ymd(2024, 2, 29).unwrap();
        assert_eq!(d.to_iso_string(), "2024-02-29");
    }

    #[test]
    fn instant_overflow_is_none() {
        let i = Instant::from_epoch_millis(i64::MAX);
        assert!(i.plus_millis(1).is_none());
    }
}
