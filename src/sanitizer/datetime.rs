//! Date-time parsing and formatting for the `date_time` primitive
//!
//! Formats are written with moment-style tokens (`YYYY-MM-DD HH:mm:ss`)
//! and translated to chrono strftime before use. Text between `[` and `]`
//! is copied literally.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Default output format.
pub const DEFAULT_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("A", "%p"),
];

/// Translates a moment-style format into a chrono strftime format.
pub fn to_strftime(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'scan: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(close) = rest.find(']') {
                push_literal(&mut out, &rest[1..close]);
                rest = &rest[close + 1..];
                continue;
            }
        }
        for (token, spec) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'scan;
            }
        }
        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

/// Parses a date-like value.
///
/// - strings: the given format first, then its date part (read as
///   midnight), then RFC 3339
/// - numbers: whole milliseconds since the Unix epoch, in UTC
pub fn parse(value: &Value, strftime: &str) -> Option<NaiveDateTime> {
    match value {
        Value::String(text) => parse_text(text.trim(), strftime),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().and_then(whole_millis))?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn whole_millis(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// The part of a strftime format before its first hour field.
fn date_part(strftime: &str) -> Option<&str> {
    let end = [strftime.find("%H"), strftime.find("%I")].into_iter().flatten().min()?;
    let date = strftime[..end].trim_end_matches([' ', 'T']);
    (!date.is_empty()).then_some(date)
}

fn parse_text(text: &str, strftime: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, strftime) {
        return Some(dt);
    }
    let date_formats = [Some(strftime), date_part(strftime), Some("%Y-%m-%d")];
    for format in date_formats.into_iter().flatten() {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local())
}
