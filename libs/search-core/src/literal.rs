//! Literal handling: escape-aware splitting, LIKE wildcard translation,
//! per-type parsing and the timestamp forms clients may send.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{LiteralError, SearchError, SearchResult};
use crate::schema::ColumnKind;

/// Characters a client may backslash-escape inside a value.
pub const SPECIAL_CHARS: &[char] = &[',', '(', ')', '~', '*', '!', '\\', '.'];

/// Separator used to store string arrays in a single text column.
pub const ARRAY_SEPARATOR: char = '\u{1f}';

/// A typed, validated value ready to be bound as a statement parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Timestamp(ts) => write!(f, "'{}'", ts.to_rfc3339()),
            Self::Uuid(u) => write!(f, "'{u}'"),
        }
    }
}

/* ---------- escaping ---------- */

/// Split `raw` on every unescaped `sep`. Escapes are kept in the pieces.
pub fn split_unescaped(raw: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            parts.push(&raw[start..i]);
            start = i + ch.len_utf8();
        }
    }
    parts.push(&raw[start..]);
    parts
}

/// Byte offsets of the first `n` unescaped occurrences of `sep`.
pub(crate) fn find_unescaped(raw: &str, sep: char, n: usize) -> Vec<usize> {
    let mut found = Vec::with_capacity(n);
    let mut escaped = false;
    for (i, ch) in raw.char_indices() {
        if found.len() == n {
            break;
        }
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            found.push(i);
        }
    }
    found
}

/// Drop escape backslashes: `\x` becomes `x`. A trailing lone backslash is kept.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Inverse of [`unescape`] for the characters in [`SPECIAL_CHARS`].
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if SPECIAL_CHARS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape SQL LIKE metacharacters with `\`.
pub fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Translate a raw (still escaped) LIKE value into a SQL pattern using `\`
/// as escape character: `*` -> `%`, `!` -> `_`; escaped wildcards and SQL
/// metacharacters match literally.
pub fn like_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next) => push_like_literal(&mut out, next),
                None => push_like_literal(&mut out, '\\'),
            },
            '*' => out.push('%'),
            '!' => out.push('_'),
            c => push_like_literal(&mut out, c),
        }
    }
    out
}

fn push_like_literal(out: &mut String, ch: char) {
    if matches!(ch, '%' | '_' | '\\') {
        out.push('\\');
    }
    out.push(ch);
}

/* ---------- string arrays ---------- */

/// Storage form of a string array: every element wrapped in separators.
pub fn encode_string_array<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::from(ARRAY_SEPARATOR);
    for item in items {
        out.push_str(item.as_ref());
        out.push(ARRAY_SEPARATOR);
    }
    out
}

pub fn decode_string_array(stored: &str) -> Vec<String> {
    stored
        .split(ARRAY_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// LIKE pattern matching rows whose encoded array holds `element`.
pub fn array_element_pattern(element: &str) -> String {
    format!("%{ARRAY_SEPARATOR}{}{ARRAY_SEPARATOR}%", like_escape(element))
}

/* ---------- typed parsing ---------- */

/// Parse one unescaped literal as `kind`.
pub fn parse_literal(attribute: &str, kind: ColumnKind, value: &str) -> SearchResult<Literal> {
    let invalid = |reason| SearchError::invalid_literal(attribute, value, reason);
    Ok(match kind {
        ColumnKind::String | ColumnKind::StringArray => Literal::String(value.to_string()),
        ColumnKind::Boolean => {
            let v = value.trim();
            if v.eq_ignore_ascii_case("true") {
                Literal::Bool(true)
            } else if v.eq_ignore_ascii_case("false") {
                Literal::Bool(false)
            } else {
                return Err(invalid(LiteralError::Boolean));
            }
        }
        ColumnKind::Integer => Literal::Int(
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(LiteralError::Integer))?,
        ),
        ColumnKind::Timestamp => {
            Literal::Timestamp(parse_timestamp(value).ok_or_else(|| invalid(LiteralError::Timestamp))?)
        }
        ColumnKind::Uuid => Literal::Uuid(
            Uuid::parse_str(value.trim()).map_err(|_| invalid(LiteralError::Uuid))?,
        ),
        ColumnKind::Enum(allowed) => {
            let v = value.trim();
            let canonical = allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(v))
                .ok_or_else(|| {
                    invalid(LiteralError::Enum {
                        allowed: allowed.join(", "),
                    })
                })?;
            Literal::String((*canonical).to_string())
        }
    })
}

/// Parse the ISO-8601 subsets clients send: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`,
/// optionally followed by `T`/space and `HH:MM[:SS[.f]]`, optionally
/// followed by `Z` or a `±HH[:MM]` offset. No offset means UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let (date_part, time_part) = match s.find(['T', 't', ' ']) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let date = parse_partial_date(date_part)?;

    let Some(time_part) = time_part else {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    };

    let (clock, offset) = split_offset(time_part)?;
    let time = NaiveTime::parse_from_str(clock, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .ok()?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_partial_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y] if y.len() == 4 && all_digits(y) => NaiveDate::from_ymd_opt(y.parse().ok()?, 1, 1),
        [y, m] if y.len() == 4 && all_digits(y) && m.len() == 2 && all_digits(m) => {
            NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1)
        }
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Split a trailing `Z` / `±HH[:MM]` / `±HHMM` offset off a clock string.
fn split_offset(time: &str) -> Option<(&str, FixedOffset)> {
    if let Some(clock) = time.strip_suffix(['Z', 'z']) {
        return Some((clock, FixedOffset::east_opt(0)?));
    }
    let Some(idx) = time.rfind(['+', '-']) else {
        return Some((time, FixedOffset::east_opt(0)?));
    };
    let (clock, off) = time.split_at(idx);
    let sign = if off.starts_with('-') { -1 } else { 1 };
    let digits: String = off[1..].chars().filter(|c| *c != ':').collect();
    if !all_digits(&digits) {
        return None;
    }
    let (hh, mm) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hh > 23 || mm > 59 {
        return None;
    }
    Some((clock, FixedOffset::east_opt(sign * (hh * 3600 + mm * 60))?))
}
