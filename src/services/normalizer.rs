// src/services/normalizer.rs

//! Record normalizer.
//!
//! Converts one raw captured fragment into a canonical [`PostRecord`],
//! rejecting anything that fails validation instead of silently zeroing it.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{PostRecord, RawFragment};

/// Coerce a raw fragment into a validated post record.
///
/// Required fields: non-empty `text` and `author`, an RFC 3339 `timestamp`,
/// and count fields that parse as non-negative integers (absent or empty
/// counts are 0).
pub fn normalize(fragment: &RawFragment) -> Result<PostRecord> {
    let text = required_text(fragment.text.as_deref(), "text")?;
    let author = required_text(fragment.author.as_deref(), "author")?;
    let timestamp = parse_timestamp(fragment.timestamp.as_deref())?;

    Ok(PostRecord {
        text,
        author,
        timestamp,
        likes: parse_count(fragment.likes.as_deref(), "likes")?,
        retweets: parse_count(fragment.retweets.as_deref(), "retweets")?,
        replies: parse_count(fragment.replies.as_deref(), "replies")?,
    })
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String> {
    let trimmed = value.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Err(AppError::normalize(field, "missing or empty"));
    }
    Ok(trimmed.to_string())
}

fn parse_timestamp(value: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::normalize("timestamp", "missing or empty"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::normalize("timestamp", format!("'{raw}' is not ISO-8601: {e}")))
}

/// Parse a count display string as rendered in the DOM.
///
/// Accepts plain digits, thousands separators ("1,234") and the compact
/// "1.2K"/"3M" forms, nothing else. Absent or empty counts are 0;
/// negatives, exponents, bare decimals and overflowing values are
/// rejected rather than coerced.
fn parse_count(value: Option<&str>, field: &'static str) -> Result<u64> {
    let raw = match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => return Ok(0),
    };

    if raw.starts_with('-') {
        return Err(AppError::normalize(field, format!("'{raw}' is negative")));
    }

    let (body, multiplier) = match raw.chars().last() {
        Some('K') | Some('k') => (&raw[..raw.len() - 1], 1_000u64),
        Some('M') | Some('m') => (&raw[..raw.len() - 1], 1_000_000u64),
        _ => (raw, 1),
    };

    let cleaned = body.replace(',', "");
    let (int_part, frac_part) = match cleaned.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (cleaned.as_str(), ""),
    };

    // A fractional part only makes sense under a K/M suffix, and only as
    // many digits as the suffix scale can absorb exactly.
    let frac_scale = if multiplier > 1 {
        multiplier.ilog10() as usize
    } else {
        0
    };
    let all_digits =
        |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if !all_digits(int_part)
        || (!frac_part.is_empty() && !all_digits(frac_part))
        || frac_part.len() > frac_scale
    {
        return Err(AppError::normalize(field, format!("'{raw}' is not a count")));
    }

    let int_value: u64 = int_part
        .parse()
        .map_err(|_| AppError::normalize(field, format!("'{raw}' is too large")))?;
    let frac_value: u64 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{frac_part:0<frac_scale$}");
        padded
            .parse()
            .map_err(|_| AppError::normalize(field, format!("'{raw}' is not a count")))?
    };

    int_value
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| AppError::normalize(field, format!("'{raw}' is too large")))
}
