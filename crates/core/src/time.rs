//! Rotation periods and timestamps.
//!
//! Periods use the compact duration grammar (`"1h30m"`, `"1.5h"`, `"90s"`,
//! `"250ms"`) and must be strictly positive. Timestamps are RFC 3339,
//! normalized to UTC, and printed losslessly: fractional seconds appear only
//! when they are non-zero.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::error::Error;
use crate::result::Result;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000;
const MILLISECOND: u128 = 1_000_000;
const SECOND: u128 = 1_000_000_000;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

/// Largest magnitude a period may have, in nanoseconds.
const MAX_NANOS: u128 = i64::MAX as u128;

/// A strictly positive rotation period with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period(i64);

impl Period {
    /// Create a period from a nanosecond count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if `nanos` is not positive.
    pub fn from_nanos(nanos: i64) -> Result<Self> {
        if nanos <= 0 {
            return Err(Error::invalid_period(
                format_nanos(nanos),
                "rotation period must be positive",
            ));
        }
        Ok(Self(nanos))
    }

    /// Length of the period in nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// `n` whole periods, in nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the product does not fit in a nanosecond count.
    pub fn times(&self, n: usize) -> Result<i128> {
        i128::try_from(n)
            .ok()
            .and_then(|n| n.checked_mul(i128::from(self.0)))
            .ok_or_else(|| Error::out_of_range(format!("{n} x {self} overflows")))
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let nanos = parse_duration_nanos(s).map_err(|reason| Error::invalid_period(s, reason))?;
        if nanos <= 0 {
            return Err(Error::invalid_period(s, "rotation period must be positive"));
        }
        Ok(Self(nanos))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_nanos(self.0))
    }
}

/// Parse a signed duration literal into nanoseconds.
///
/// The grammar is an optional sign followed by one or more
/// `<decimal><unit>` terms. The bare literal `0` is accepted.
fn parse_duration_nanos(literal: &str) -> std::result::Result<i64, String> {
    let (negative, body) = match literal.as_bytes().first() {
        Some(b'-') => (true, literal.get(1..).unwrap_or_default()),
        Some(b'+') => (false, literal.get(1..).unwrap_or_default()),
        _ => (false, literal),
    };
    if body == "0" {
        return Ok(0);
    }
    if body.is_empty() {
        return Err("empty duration".to_string());
    }

    let bytes = body.as_bytes();
    let mut idx = 0usize;
    let mut total: u128 = 0;
    while idx < bytes.len() {
        let term_start = idx;

        let int_start = idx;
        let mut whole: u128 = 0;
        while let Some(digit) = bytes.get(idx).filter(|b| b.is_ascii_digit()) {
            whole = whole
                .checked_mul(10)
                .and_then(|w| w.checked_add(u128::from(digit.wrapping_sub(b'0'))))
                .filter(|w| *w <= MAX_NANOS)
                .ok_or_else(|| "duration out of range".to_string())?;
            idx = idx.saturating_add(1);
        }
        let has_int = idx > int_start;

        let mut frac: u128 = 0;
        let mut scale: u128 = 1;
        let mut has_frac = false;
        if bytes.get(idx) == Some(&b'.') {
            idx = idx.saturating_add(1);
            while let Some(digit) = bytes.get(idx).filter(|b| b.is_ascii_digit()) {
                has_frac = true;
                // Digits past twenty cannot move the result by a nanosecond.
                if scale < 10u128.pow(20) {
                    frac = frac.saturating_mul(10).saturating_add(u128::from(digit.wrapping_sub(b'0')));
                    scale = scale.saturating_mul(10);
                }
                idx = idx.saturating_add(1);
            }
        }
        if !has_int && !has_frac {
            return Err(format!(
                "expected a number at '{}'",
                body.get(term_start..).unwrap_or_default()
            ));
        }

        let unit_start = idx;
        while let Some(b) = bytes.get(idx) {
            if *b == b'.' || b.is_ascii_digit() {
                break;
            }
            idx = idx.saturating_add(1);
        }
        let unit = body.get(unit_start..idx).unwrap_or_default();
        let factor = match unit {
            "" => return Err("missing unit".to_string()),
            "ns" => NANOSECOND,
            "us" | "\u{00b5}s" | "\u{03bc}s" => MICROSECOND,
            "ms" => MILLISECOND,
            "s" => SECOND,
            "m" => MINUTE,
            "h" => HOUR,
            other => return Err(format!("unknown unit '{other}'")),
        };

        let term = whole
            .checked_mul(factor)
            .and_then(|t| t.checked_add(frac.saturating_mul(factor).checked_div(scale)?))
            .ok_or_else(|| "duration out of range".to_string())?;
        total = total
            .checked_add(term)
            .filter(|t| *t <= MAX_NANOS)
            .ok_or_else(|| "duration out of range".to_string())?;
    }

    let magnitude = i64::try_from(total).map_err(|_| "duration out of range".to_string())?;
    Ok(if negative { magnitude.saturating_neg() } else { magnitude })
}

fn format_nanos(nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let n = nanos.unsigned_abs();
    if n == 0 {
        return "0s".to_string();
    }
    let body = if n < 1_000 {
        format!("{n}ns")
    } else if n < 1_000_000 {
        format!("{}\u{00b5}s", decimal(n / 1_000, n % 1_000, 3))
    } else if n < 1_000_000_000 {
        format!("{}ms", decimal(n / 1_000_000, n % 1_000_000, 6))
    } else {
        let secs = n / 1_000_000_000;
        let sub = n % 1_000_000_000;
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        let tail = format!("{}s", decimal(seconds, sub, 9));
        if hours > 0 {
            format!("{hours}h{minutes}m{tail}")
        } else if minutes > 0 {
            format!("{minutes}m{tail}")
        } else {
            tail
        }
    };
    format!("{sign}{body}")
}

fn decimal(whole: u64, frac: u64, digits: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let padded = format!("{frac:0digits$}");
    format!("{whole}.{}", padded.trim_end_matches('0'))
}

/// An instant in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap a UTC datetime.
    #[must_use]
    pub const fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// The underlying datetime.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse an RFC 3339 timestamp, naming `field` in the error on failure.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimestamp` if `input` is not RFC 3339.
    pub fn parse(field: &str, input: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(input)
            .map(|at| Self(at.with_timezone(&Utc)))
            .map_err(|e| Error::invalid_timestamp(field, input, e.to_string()))
    }

    /// Shift by a signed nanosecond offset.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the result is not representable.
    pub fn checked_add_nanos(&self, nanos: i128) -> Result<Self> {
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok();
        let sub = u32::try_from(nanos.rem_euclid(NANOS_PER_SECOND)).ok();
        secs.zip(sub)
            .and_then(|(secs, sub)| TimeDelta::new(secs, sub))
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or_else(|| Error::out_of_range(format!("{self} shifted by {nanos}ns")))
    }

    /// Shift forward by `n` periods.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the result is not representable.
    pub fn checked_add_periods(&self, period: Period, n: usize) -> Result<Self> {
        self.checked_add_nanos(period.times(n)?)
    }

    /// Shift backward by `n` periods.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the result is not representable.
    pub fn checked_sub_periods(&self, period: Period, n: usize) -> Result<Self> {
        let nanos = period.times(n)?;
        self.checked_add_nanos(nanos.saturating_neg())
    }

    /// Signed nanoseconds from `self` to `later`.
    #[must_use]
    pub fn nanos_until(&self, later: &Self) -> i128 {
        let delta = later.0.signed_duration_since(self.0);
        i128::from(delta.num_seconds())
            .saturating_mul(NANOS_PER_SECOND)
            .saturating_add(i128::from(delta.subsec_nanos()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}
