//! Clock utilities and bulk-ingest time parsing
//!
//! The admin bulk-ingest mini-format carries durations as `HH:MM:SS` or
//! `MM:SS` strings and start times as `DD/MM/YYYY | HH:MM AM|PM` strings.
//! Everything is converted to plain seconds here; the repository only ever
//! stores integers.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Current wall-clock time, seconds since the Unix epoch
pub fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Current UTC timestamp for event payloads
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a duration string in `HH:MM:SS` or `MM:SS` form to total seconds.
///
/// # Examples
///
/// ```
/// use onair_common::clock::parse_duration;
///
/// assert_eq!(parse_duration("01:10:30").unwrap(), 4230);
/// assert_eq!(parse_duration("45:00").unwrap(), 2700);
/// assert_eq!(parse_duration("0:07").unwrap(), 7);
/// ```
pub fn parse_duration(s: &str) -> Result<u32> {
    let parts: Vec<&str> = s.trim().split(':').collect();

    let fields: Vec<u32> = parts
        .iter()
        .map(|p| {
            p.parse::<u32>()
                .map_err(|_| Error::TimeParse(format!("invalid duration component '{}' in '{}'", p, s)))
        })
        .collect::<Result<_>>()?;

    let (hours, minutes, seconds) = match fields.as_slice() {
        [m, sec] => (0, *m, *sec),
        [h, m, sec] => (*h, *m, *sec),
        _ => {
            return Err(Error::TimeParse(format!(
                "duration '{}' must be MM:SS or HH:MM:SS",
                s
            )))
        }
    };

    if minutes >= 60 || seconds >= 60 {
        return Err(Error::TimeParse(format!(
            "duration '{}' has out-of-range minutes or seconds",
            s
        )));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Parse a bulk-ingest start time of the form `DD/MM/YYYY | HH:MM AM` (or
/// `PM`) to seconds since the Unix epoch.
///
/// The string is interpreted as UTC; the repository stores absolute epoch
/// seconds only.
///
/// # Examples
///
/// ```
/// use onair_common::clock::parse_start_time;
///
/// // 1970-01-02 12:00:00 UTC
/// assert_eq!(parse_start_time("02/01/1970 | 12:00 PM").unwrap(), 129_600);
/// // Midnight is 12:00 AM
/// assert_eq!(parse_start_time("02/01/1970 | 12:00 AM").unwrap(), 86_400);
/// ```
pub fn parse_start_time(s: &str) -> Result<i64> {
    let (date_part, time_part) = s
        .split_once('|')
        .ok_or_else(|| Error::TimeParse(format!("start time '{}' missing '|' separator", s)))?;

    let date = NaiveDate::parse_from_str(date_part.trim(), "%d/%m/%Y")
        .map_err(|e| Error::TimeParse(format!("invalid date '{}': {}", date_part.trim(), e)))?;

    let time_part = time_part.trim();
    let (clock, meridiem) = time_part
        .split_once(' ')
        .ok_or_else(|| Error::TimeParse(format!("time '{}' missing AM/PM", time_part)))?;

    let (hh, mm) = clock
        .split_once(':')
        .ok_or_else(|| Error::TimeParse(format!("time '{}' must be HH:MM", clock)))?;
    let hour: u32 = hh
        .parse()
        .map_err(|_| Error::TimeParse(format!("invalid hour '{}'", hh)))?;
    let minute: u32 = mm
        .parse()
        .map_err(|_| Error::TimeParse(format!("invalid minute '{}'", mm)))?;

    if !(1..=12).contains(&hour) || minute >= 60 {
        return Err(Error::TimeParse(format!(
            "time '{}' out of range for 12-hour clock",
            time_part
        )));
    }

    let hour24 = match meridiem.trim().to_ascii_uppercase().as_str() {
        "AM" => hour % 12,
        "PM" => hour % 12 + 12,
        other => {
            return Err(Error::TimeParse(format!(
                "expected AM or PM, got '{}'",
                other
            )))
        }
    };

    let naive = date
        .and_hms_opt(hour24, minute, 0)
        .ok_or_else(|| Error::TimeParse(format!("invalid time '{}'", time_part)))?;

    Ok(Utc.from_utc_datetime(&naive).timestamp())
}

/// Format a second count as `H:MM:SS` (or `M:SS` under one hour) for
/// display and conflict reports.
///
/// # Examples
///
/// ```
/// use onair_common::clock::format_clock;
///
/// assert_eq!(format_clock(7), "0:07");
/// assert_eq!(format_clock(2700), "45:00");
/// assert_eq!(format_clock(4230), "1:10:30");
/// ```
pub fn format_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
