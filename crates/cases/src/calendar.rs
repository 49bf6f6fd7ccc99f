//! Day and month boundaries in the lab's local time.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Converts between UTC timestamps and the lab's calendar.
///
/// The lab runs on a fixed UTC offset; invoice ranges and month filters are
/// expressed in local calendar days.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LabCalendar {
    offset: FixedOffset,
}

impl LabCalendar {
    /// Build from an offset in minutes east of UTC. Out-of-range offsets fall
    /// back to UTC.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(Self::utc_offset);
        Self { offset }
    }

    pub fn utc() -> Self {
        Self {
            offset: Self::utc_offset(),
        }
    }

    fn utc_offset() -> FixedOffset {
        Utc.fix()
    }

    /// `yyyy-MM` key of a timestamp's local month.
    pub fn month_key(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format("%Y-%m").to_string()
    }

    /// First instant of `date` in local time, as UTC.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        match self.offset.from_local_datetime(&midnight).single() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&midnight),
        }
    }

    /// Last instant of `date` in local time, as UTC (nanosecond before the
    /// next day's start).
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
    }
}

impl Default for LabCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
