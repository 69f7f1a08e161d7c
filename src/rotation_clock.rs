//! Computes GMT-aligned rotation boundaries from a [`RotationInterval`]
//! (`spec.md` §3, §4.1).

use crate::interval::{RotationField, RotationInterval};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};

/// A half-open rotation window: `[start, end)`. `end` is the exclusive
/// boundary -- rotation fires when `now > end`, never on equality.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Boundary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Tracks the current rotation boundary and advances it on demand.
///
/// Unlike the source this was distilled from, `RotationClock` is a pure
/// value: it holds no I/O and no lock, so [`WriterLoop`](crate::writer_loop)
/// owns one directly instead of sharing it.
#[derive(Debug)]
pub struct RotationClock {
    interval: RotationInterval,
}

impl RotationClock {
    pub fn new(interval: RotationInterval) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> RotationInterval {
        self.interval
    }

    /// `alignToBoundary`: truncates `instant` to the start of its window for
    /// the configured field, rounds that field's own value down to a
    /// multiple of the multiplier, and returns `(start, end)`.
    pub fn align(&self, instant: DateTime<Utc>) -> Boundary {
        let start = truncate(instant, self.interval.field, self.interval.multiplier);
        let end = advance(start, self.interval.field, self.interval.multiplier);
        Boundary { start, end }
    }

    /// Advances to the boundary immediately following `current.end`. Per
    /// the round-trip law in `spec.md` §8, `align(x.end).start == x.end`.
    pub fn next(&self, current: Boundary) -> Boundary {
        self.align(current.end)
    }
}

/// The "fallthrough calendar-field zeroing" table from `spec.md` §9,
/// re-expressed explicitly instead of leaning on fallthrough `match` arms.
fn truncate(instant: DateTime<Utc>, field: RotationField, multiplier: u32) -> DateTime<Utc> {
    let naive = instant.naive_utc();
    let date = naive.date();

    let truncated_date = match field {
        RotationField::Minute | RotationField::Hour | RotationField::Day => date,
        RotationField::Week => {
            let week = date.week(Weekday::Mon);
            week.first_day()
        }
        RotationField::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap(),
        RotationField::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap(),
    };

    let hour = match field {
        RotationField::Minute | RotationField::Hour => naive.hour(),
        _ => 0,
    };
    let minute = match field {
        RotationField::Minute => naive.minute(),
        _ => 0,
    };

    let rounded = round_to_boundary(truncated_date, hour, minute, field, multiplier);
    DateTime::<Utc>::from_naive_utc_and_offset(rounded, Utc)
}

/// Rounds the configured field's own numeric value down to the nearest
/// multiple of `multiplier`, rebuilding the naive timestamp from it.
fn round_to_boundary(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    field: RotationField,
    multiplier: u32,
) -> NaiveDateTime {
    let m = multiplier.max(1);
    match field {
        RotationField::Minute => {
            let rounded_minute = (minute / m) * m;
            date.and_hms_opt(hour, rounded_minute, 0).unwrap()
        }
        RotationField::Hour => {
            let rounded_hour = (hour / m) * m;
            date.and_hms_opt(rounded_hour, 0, 0).unwrap()
        }
        RotationField::Day => {
            let zero_based_day = date.day() - 1;
            let rounded_day = (zero_based_day / m) * m + 1;
            NaiveDate::from_ymd_opt(date.year(), date.month(), rounded_day)
                .unwrap_or(date)
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }
        RotationField::Week => {
            let iso = date.iso_week();
            let rounded_week = ((iso.week() - 1) / m) * m + 1;
            NaiveDate::from_isoywd_opt(iso.year(), rounded_week, Weekday::Mon)
                .unwrap_or(date)
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }
        RotationField::Month => {
            let zero_based_month = date.month0();
            let rounded_month = (zero_based_month / m) * m;
            NaiveDate::from_ymd_opt(date.year(), rounded_month + 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }
        RotationField::Year => {
            let rounded_year = (date.year() / m as i32) * m as i32;
            NaiveDate::from_ymd_opt(rounded_year, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }
    }
}

/// `start + multiplier * unit`, using calendar arithmetic for `MONTH`/`YEAR`
/// (whose unit length varies) and fixed `Duration`s otherwise (safe because
/// everything here is UTC, so there's no DST to dodge).
fn advance(start: DateTime<Utc>, field: RotationField, multiplier: u32) -> DateTime<Utc> {
    let m = i64::from(multiplier.max(1));
    match field {
        RotationField::Minute => start + Duration::minutes(m),
        RotationField::Hour => start + Duration::hours(m),
        RotationField::Day => start + Duration::days(m),
        RotationField::Week => start + Duration::days(7 * m),
        RotationField::Month => {
            let date = start.date_naive();
            let next = add_months(date, multiplier);
            DateTime::<Utc>::from_naive_utc_and_offset(next.and_hms_opt(0, 0, 0).unwrap(), Utc)
        }
        RotationField::Year => {
            let date = start.date_naive();
            let next = NaiveDate::from_ymd_opt(date.year() + multiplier as i32, 1, 1).unwrap();
            DateTime::<Utc>::from_naive_utc_and_offset(next.and_hms_opt(0, 0, 0).unwrap(), Utc)
        }
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = total.div_euclid(12) as i32;
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn hour_alignment_contains_instant() {
        let clock = RotationClock::new(RotationInterval::parse("HOUR").unwrap());
        let instant = dt(2024, 3, 15, 13, 47);
        let boundary = clock.align(instant);
        assert_eq!(boundary.start, dt(2024, 3, 15, 13, 0));
        assert_eq!(boundary.end, dt(2024, 3, 15, 14, 0));
        assert!(boundary.start <= instant && instant < boundary.end);
    }

    #[test]
    fn chained_alignment_round_trips() {
        let clock = RotationClock::new(RotationInterval::parse("HOUR").unwrap());
        let instant = dt(2024, 3, 15, 13, 47);
        let first = clock.align(instant);
        let second = clock.align(first.end);
        assert_eq!(second.start, first.end);
    }

    #[test]
    fn multiplier_rounds_down() {
        let clock = RotationClock::new(RotationInterval::parse("3HOURS").unwrap());
        let boundary = clock.align(dt(2024, 3, 15, 13, 47));
        assert_eq!(boundary.start, dt(2024, 3, 15, 12, 0));
        assert_eq!(boundary.end, dt(2024, 3, 15, 15, 0));
    }

    #[test]
    fn minute_interval_keeps_minute_field() {
        let clock = RotationClock::new(RotationInterval::parse("5MINUTES").unwrap());
        let boundary = clock.align(dt(2024, 3, 15, 13, 27));
        assert_eq!(boundary.start, dt(2024, 3, 15, 13, 25));
        assert_eq!(boundary.end, dt(2024, 3, 15, 13, 30));
    }

    #[test]
    fn day_interval_spans_exactly_one_day() {
        let clock = RotationClock::new(RotationInterval::parse("DAY").unwrap());
        let boundary = clock.align(dt(2024, 3, 15, 10, 30));
        assert_eq!(boundary.start, dt(2024, 3, 15, 0, 0));
        assert_eq!(boundary.end, dt(2024, 3, 16, 0, 0));
    }

    #[test]
    fn month_interval_handles_year_rollover() {
        let clock = RotationClock::new(RotationInterval::parse("MONTH").unwrap());
        let boundary = clock.align(dt(2024, 12, 20, 5, 0));
        assert_eq!(boundary.start, dt(2024, 12, 1, 0, 0));
        assert_eq!(boundary.end, dt(2025, 1, 1, 0, 0));
    }
}
