//! ISO-8601 timestamp parsing and rendering.
//!
//! Timestamp columns store whole seconds since the Unix epoch. Inputs may be
//! native [`OffsetDateTime`] values or ISO-8601 strings in any of these forms:
//!
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DDTHH:MM`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DDTHH:MM:SS.ffffff`
//!   (a space may replace the `T`)
//! - any of the above with a `Z` or `±HH:MM` / `±HHMM` / `±HH` suffix
//!
//! Strings without an offset are read as UTC. Rendering always produces UTC
//! without an offset suffix, at second precision.

use lancedoc_result::{Error, Result};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Parse an ISO-8601 date or date-time string.
pub fn parse_iso8601(text: &str) -> Result<OffsetDateTime> {
    let invalid = || Error::validation(format!("invalid ISO-8601 timestamp '{text}'"));
    let trimmed = text.trim();
    if trimmed.len() < 10 || !trimmed.is_char_boundary(10) {
        return Err(invalid());
    }

    let (date_part, rest) = trimmed.split_at(10);
    let date = parse_date(date_part).ok_or_else(invalid)?;

    if rest.is_empty() {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
    }

    let rest = rest
        .strip_prefix('T')
        .or_else(|| rest.strip_prefix('t'))
        .or_else(|| rest.strip_prefix(' '))
        .ok_or_else(invalid)?;
    let (time_part, offset) = split_offset(rest).ok_or_else(invalid)?;
    let time = parse_time(time_part).ok_or_else(invalid)?;

    Ok(PrimitiveDateTime::new(date, time)
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC))
}

/// Seconds since the Unix epoch, truncated towards negative infinity.
pub fn to_epoch_seconds(value: &OffsetDateTime) -> i64 {
    value.unix_timestamp()
}

/// Inverse of [`to_epoch_seconds`].
pub fn from_epoch_seconds(seconds: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|err| Error::validation(format!("timestamp {seconds} out of range: {err}")))
}

/// Render epoch seconds as `YYYY-MM-DDTHH:MM:SS`.
pub fn format_iso8601(seconds: i64) -> Result<String> {
    let value = from_epoch_seconds(seconds)?;
    Ok(format!(
        "{}T{}",
        format_date(&value),
        format_clock(&value)
    ))
}

/// Render epoch seconds as the body of a SQL timestamp literal,
/// `YYYY-MM-DD HH:MM:SS`.
pub fn format_sql_timestamp(seconds: i64) -> Result<String> {
    let value = from_epoch_seconds(seconds)?;
    Ok(format!("{} {}", format_date(&value), format_clock(&value)))
}

fn format_date(value: &OffsetDateTime) -> String {
    let month_number = value.month() as u8;
    format!("{:04}-{:02}-{:02}", value.year(), month_number, value.day())
}

fn format_clock(value: &OffsetDateTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    )
}

fn parse_date(text: &str) -> Option<Date> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let year = parse_digits(&text[0..4])? as i32;
    let month = month_from_number(parse_digits(&text[5..7])? as u8)?;
    let day = parse_digits(&text[8..10])? as u8;
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_time(text: &str) -> Option<Time> {
    let (clock, fraction) = match text.split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (text, None),
    };

    let mut parts = clock.split(':');
    let hour = parse_two_digits(parts.next()?)?;
    let minute = parse_two_digits(parts.next()?)?;
    let second = match parts.next() {
        Some(raw) => parse_two_digits(raw)?,
        None if fraction.is_none() => 0,
        None => return None,
    };
    if parts.next().is_some() {
        return None;
    }

    let nanos = match fraction {
        Some(raw) => parse_fraction_nanos(raw)?,
        None => 0,
    };
    Time::from_hms_nano(hour, minute, second, nanos).ok()
}

/// Split a trailing `Z` / `±HH[:MM]` offset from the clock part.
fn split_offset(text: &str) -> Option<(&str, UtcOffset)> {
    if let Some(clock) = text.strip_suffix(['Z', 'z']) {
        return Some((clock, UtcOffset::UTC));
    }
    let Some(idx) = text.rfind(['+', '-']) else {
        return Some((text, UtcOffset::UTC));
    };

    let (clock, suffix) = text.split_at(idx);
    let sign: i8 = if suffix.starts_with('-') { -1 } else { 1 };
    let digits: String = suffix[1..].chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (parse_two_digits(&digits)?, 0),
        4 => (
            parse_two_digits(&digits[0..2])?,
            parse_two_digits(&digits[2..4])?,
        ),
        _ => return None,
    };
    let offset =
        UtcOffset::from_hms(sign * hours as i8, sign * minutes as i8, 0).ok()?;
    Some((clock, offset))
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_two_digits(text: &str) -> Option<u8> {
    if text.len() != 2 {
        return None;
    }
    parse_digits(text).map(|v| v as u8)
}

fn parse_fraction_nanos(text: &str) -> Option<u32> {
    if text.is_empty() || text.len() > 9 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{text:0<9}");
    padded.parse().ok()
}

fn month_from_number(raw: u8) -> Option<Month> {
    if raw == 0 || raw > 12 {
        return None;
    }
    Some(Month::January.nth_next(raw - 1))
}
