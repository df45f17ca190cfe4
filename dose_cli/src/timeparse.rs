//! Parsing of the `--date` / `--time` options of `add`.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use dose_core::{Error, Result};

/// Full date layouts, tried in order
const DATE_LAYOUTS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y%m%d"];

const TIME_LAYOUTS: &[&str] = &["%I:%M%p", "%H:%M", "%H%M"];

/// Parse a date; `MM-DD` and `MMDD` are taken to be in `year`
pub fn parse_date(text: &str, year: i32) -> Result<NaiveDate> {
    let text = text.trim();

    if let Some(date) = DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
    {
        return Ok(date);
    }

    let short = match text.len() {
        5 if text.as_bytes()[2] == b'-' => NaiveDate::parse_from_str(
            &format!("{}-{}", year, text),
            "%Y-%m-%d",
        )
        .ok(),
        4 if text.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(&format!("{}{}", year, text), "%Y%m%d").ok()
        }
        _ => None,
    };

    short.ok_or_else(|| Error::TimeParse(format!("unrecognized date: {}", text)))
}

/// Parse a time of day
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveTime::parse_from_str(text, layout).ok())
        .ok_or_else(|| Error::TimeParse(format!("unrecognized time: {}", text)))
}

/// Build the instant of a new dose in `tz`; missing parts are taken from `now`
pub fn resolve(
    date: Option<&str>,
    time: Option<&str>,
    tz: Tz,
    now: DateTime<Tz>,
) -> Result<DateTime<FixedOffset>> {
    if date.is_none() && time.is_none() {
        return Ok(now.fixed_offset());
    }

    let day = match date {
        Some(text) => parse_date(text, now.year())?,
        None => now.date_naive(),
    };
    let clock = match time {
        Some(text) => parse_time(text)?,
        None => now.time(),
    };

    let local = day.and_time(clock);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| Error::TimeParse(format!("{} does not exist in {}", local, tz.name())))
}
