use chrono::{Duration as ChronoDur, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Legacy date-serial utilities ──────────────────
Imported sheets carry dates as 1900-epoch day-count serials. The legacy
conversion used by existing templates is NOT the textbook Excel mapping:
  d    = serial - 1
  secs = round(frac(d) * 86400)
  dt   = 1900-01-01 + (trunc(d) - 1) days + 08:00:00 + secs
The fixed 8 hour offset is part of the format; dropping it moves every
afternoon timestamp to the next calendar day.
------------------------------------------------------------------- */

const SECS_PER_DAY: i64 = 86_400;
const LEGACY_HOUR_OFFSET: i64 = 8;

fn legacy_base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a spreadsheet serial into a timestamp using the legacy formula.
///
/// Returns `None` for non-finite serials or results outside chrono's range.
pub fn legacy_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let d = serial - 1.0;
    let secs = ((d - d.floor()) * SECS_PER_DAY as f64).round() as i64;
    let day = d.trunc() as i64;

    legacy_base()
        .checked_add_signed(ChronoDur::try_days(day - 1)?)?
        .checked_add_signed(ChronoDur::try_hours(LEGACY_HOUR_OFFSET)?)?
        .checked_add_signed(ChronoDur::try_seconds(secs)?)
}

/// A single cell value as it travels between sheets and records.
///
/// Serialized untagged, so records map naturally onto JSON payloads:
/// `null`, `true`, `12`, `1.5`, `"text"`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
}

/// Header-keyed (raw) or field-keyed (record) row, in column order.
pub type Row = IndexMap<String, CellValue>;

impl CellValue {
    /// Missing, null, or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Equality that ignores the `Int`/`Number` split, so a label typed as
    /// `1` matches a numeric cell holding `1.0`.
    pub fn loosely_eq(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Int(i), CellValue::Number(n)) | (CellValue::Number(n), CellValue::Int(i)) => {
                *n == *i as f64
            }
            _ => self == other,
        }
    }

    /// Lenient integer parse.
    ///
    /// Numbers truncate toward zero. Text takes its leading integer prefix
    /// (optional whitespace, optional sign, digits) and ignores the rest, so
    /// `"12.9kg"` yields `12`. Returns `None` when no digits lead the value.
    pub fn parse_int_lenient(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            CellValue::Text(s) => parse_int_prefix(s),
            _ => None,
        }
    }
}

fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let magnitude = rest[..digits]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add((b - b'0') as i64));
    Some(if negative { -magnitude } else { magnitude })
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}
