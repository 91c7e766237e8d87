//! Game reset times and rotation bookkeeping.
//!
//! Destiny's daily reset happens at 17:00 UTC and the weekly reset at the
//! same time every Tuesday. Rotating drop tables are anchored at some past
//! reset and advance by a fixed interval:
//!
//! ```text
//! anchor        anchor+1w     anchor+2w     anchor+3w
//!   |-------------|-------------|-------------|
//!         0              1             2   ^ now
//!                                      current = 2
//!                                      next    = anchor + 3w
//! ```

use chrono::{DateTime, Datelike, Duration, SecondsFormat, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

const RESET_HOUR_UTC: u32 = 17;
const WEEKLY_RESET_DAY: Weekday = Weekday::Tue;

/// ISO 8601 with millisecond precision and a `Z` suffix.
pub fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn todays_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let reset = date
        .and_hms_opt(RESET_HOUR_UTC, 0, 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    Utc.from_utc_datetime(&reset)
}

/// The first daily reset strictly after `now`.
pub fn next_daily_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let reset = todays_reset(now);
    if reset > now {
        reset
    } else {
        reset + Duration::days(1)
    }
}

/// The first weekly reset strictly after `now`.
pub fn next_weekly_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let mut reset = next_daily_reset(now);
    while reset.weekday() != WEEKLY_RESET_DAY {
        reset += Duration::days(1);
    }
    reset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    #[default]
    Weekly,
}

impl Interval {
    pub fn duration(self) -> Duration {
        match self {
            Interval::Daily => Duration::days(1),
            Interval::Weekly => Duration::weeks(1),
        }
    }
}

/// How many whole intervals have passed since `anchor`.
pub fn rotation_index(anchor: DateTime<Utc>, interval: Interval, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - anchor).num_milliseconds();
    elapsed.div_euclid(interval.duration().num_milliseconds())
}

/// Start of the rotation after the current one, `None` past the end of time.
pub fn next_rotation(
    anchor: DateTime<Utc>,
    interval: Interval,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let next = rotation_index(anchor, interval, now).checked_add(1)?;
    let millis = interval.duration().num_milliseconds().checked_mul(next)?;
    anchor.checked_add_signed(Duration::try_milliseconds(millis)?)
}
