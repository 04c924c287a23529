//! Reporting clock: the as-of instant every window is measured from.
//!
//! RULE: no query reads the wall clock. Trailing windows and trend
//! buckets are always derived from an explicit as-of timestamp, so the
//! same filter over the same data yields the same rows.

use crate::types::TrendPeriod;
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Utc};

/// Storage format for transaction timestamps (UTC, lexically sortable).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default trailing window for "recent activity" checks.
pub const TRAILING_WINDOW_DAYS: i64 = 90;

/// Current UTC time without a zone, matching the stored format.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Midnight at the start of `date`.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

/// Exclusive upper bound for an inclusive `date_to`.
pub fn day_after(date: NaiveDate) -> NaiveDateTime {
    day_start(date.succ_opt().unwrap_or(date))
}

/// Start of the trailing window that ends at `as_of`.
pub fn trailing_window_start(as_of: NaiveDateTime, days: i64) -> NaiveDateTime {
    as_of - Duration::days(days)
}

/// First day of the period containing `date`.
/// Weeks start on Monday.
pub fn truncate_to_period(date: NaiveDate, period: TrendPeriod) -> NaiveDate {
    match period {
        TrendPeriod::Mom => date.with_day(1).unwrap_or(date),
        TrendPeriod::Wow => {
            date - Duration::days(date.weekday().num_days_from_monday() as i64)
        }
    }
}

/// Start of a trend window: the as-of period's first day, moved back
/// `periods_back` whole periods.
pub fn periods_back_start(as_of: NaiveDateTime, period: TrendPeriod, periods_back: u32) -> NaiveDate {
    let current = truncate_to_period(as_of.date(), period);
    match period {
        TrendPeriod::Mom => current
            .checked_sub_months(Months::new(periods_back))
            .unwrap_or(NaiveDate::MIN),
        TrendPeriod::Wow => current - Duration::weeks(periods_back as i64),
    }
}
