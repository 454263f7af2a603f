//! Typed flag values and their string setters.
//!
//! Every flag carries a [`FlagValue`], whose variant doubles as the flag's
//! type tag. [`FlagValue::set`] is the type-specific setter shared by the
//! command-line parser and the environment overlay, so both sources accept
//! exactly the same grammar.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Declared type of a flag.
///
/// # Examples
///
/// ```
/// use envy_core::{FlagValue, ValueType};
///
/// assert_eq!(FlagValue::Bool(false).value_type(), ValueType::Bool);
/// assert_eq!(ValueType::Duration.to_string(), "duration");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `true` / `false`; may appear on the command line without a value.
    Bool,
    /// Arbitrary UTF-8 string.
    String,
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    Uint,
    /// 64-bit float.
    Float,
    /// Time span such as `1h30m` or `250ms`.
    Duration,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// Rejection reported by a flag's setter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Not one of the accepted bool literals.
    #[error("invalid bool literal {0:?}")]
    InvalidBool(String),
    /// Not a valid signed integer.
    #[error("invalid integer {value:?}: {reason}")]
    InvalidInt {
        /// Rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// Not a valid unsigned integer.
    #[error("invalid unsigned integer {value:?}: {reason}")]
    InvalidUint {
        /// Rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// Not a valid float.
    #[error("invalid float {value:?}: {reason}")]
    InvalidFloat {
        /// Rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// Not a valid duration.
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),
}

/// Current value of a flag, tagged with its type.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use envy_core::FlagValue;
///
/// let mut timeout = FlagValue::Duration(Duration::from_secs(5));
/// timeout.set("1m30s").unwrap();
/// assert_eq!(timeout, FlagValue::Duration(Duration::from_secs(90)));
/// assert_eq!(timeout.to_string(), "1m30s");
///
/// let mut count = FlagValue::Int(13);
/// assert!(count.set("thirteen").is_err());
/// assert_eq!(count, FlagValue::Int(13));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Duration(Duration),
}

impl FlagValue {
    /// Returns the type tag for this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::String(_) => ValueType::String,
            Self::Int(_) => ValueType::Int,
            Self::Uint(_) => ValueType::Uint,
            Self::Float(_) => ValueType::Float,
            Self::Duration(_) => ValueType::Duration,
        }
    }

    /// Parses `raw` according to this value's type and stores it.
    ///
    /// On error the current value is left untouched.
    pub fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        match self {
            Self::Bool(v) => {
                *v = parse_bool(raw).ok_or_else(|| ValueError::InvalidBool(raw.to_string()))?;
            }
            Self::String(v) => *v = raw.to_string(),
            Self::Int(v) => {
                *v = raw.parse().map_err(|err: std::num::ParseIntError| {
                    ValueError::InvalidInt {
                        value: raw.to_string(),
                        reason: err.to_string(),
                    }
                })?;
            }
            Self::Uint(v) => {
                *v = raw.parse().map_err(|err: std::num::ParseIntError| {
                    ValueError::InvalidUint {
                        value: raw.to_string(),
                        reason: err.to_string(),
                    }
                })?;
            }
            Self::Float(v) => {
                *v = raw.parse().map_err(|err: std::num::ParseFloatError| {
                    ValueError::InvalidFloat {
                        value: raw.to_string(),
                        reason: err.to_string(),
                    }
                })?;
            }
            Self::Duration(v) => *v = parse_duration(raw)?,
        }
        Ok(())
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Duration(v) => f.write_str(&format_duration(*v)),
        }
    }
}

impl Serialize for FlagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Uint(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Duration(v) => serializer.serialize_str(&format_duration(*v)),
        }
    }
}

/// Parses a bool literal.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false counterparts
/// `0`, `f`, `F`, `FALSE`, `false`, `False`. Anything else, including `yes`,
/// returns `None`.
///
/// # Examples
///
/// ```
/// use envy_core::parse_bool;
///
/// assert_eq!(parse_bool("True"), Some(true));
/// assert_eq!(parse_bool("0"), Some(false));
/// assert_eq!(parse_bool("yay"), None);
/// ```
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Parses a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Each segment is a decimal number followed by one of `ns`, `us` (or `µs`),
/// `ms`, `s`, `m`, `h`. A bare `0` is also accepted. Negative durations are
/// rejected.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use envy_core::parse_duration;
///
/// assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
/// assert_eq!(parse_duration("2h45m").unwrap(), Duration::from_secs(9900));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(raw: &str) -> Result<Duration, ValueError> {
    let invalid = || ValueError::InvalidDuration(raw.to_string());

    let mut rest = raw.strip_prefix('+').unwrap_or(raw);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            _ => return Err(invalid()),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && frac.is_empty()) || frac.contains('.') {
            return Err(invalid());
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;
        let mut place = scale;
        for digit in frac.bytes() {
            place /= 10;
            nanos = nanos
                .checked_add(u128::from(digit - b'0') * place)
                .ok_or_else(invalid)?;
        }
        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }

    u64::try_from(total)
        .map(Duration::from_nanos)
        .map_err(|_| invalid())
}

/// Formats a duration the way [`parse_duration`] reads it back.
///
/// Spans under one second use the largest fitting sub-second unit
/// (`1.5ms`); longer spans are written as hours, minutes and seconds
/// (`1h30m0s`).
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (scale, unit) = if nanos < NANOS_PER_MICRO {
            (1, "ns")
        } else if nanos < NANOS_PER_MILLI {
            (NANOS_PER_MICRO, "µs")
        } else {
            (NANOS_PER_MILLI, "ms")
        };
        return format!("{}{unit}", decimal(nanos, scale));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = nanos % NANOS_PER_MIN;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&decimal(seconds, NANOS_PER_SEC));
    out.push('s');
    out
}

fn decimal(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let remainder = value % scale;
    if remainder == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{remainder:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_flag_library_grammar() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["yes", "no", "tRUE", "", " true"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_set_leaves_value_on_error() {
        let mut value = FlagValue::Bool(false);
        assert_eq!(
            value.set("yay"),
            Err(ValueError::InvalidBool("yay".to_string()))
        );
        assert_eq!(value, FlagValue::Bool(false));

        let mut value = FlagValue::Uint(7);
        assert!(value.set("-1").is_err());
        assert_eq!(value, FlagValue::Uint(7));
    }

    #[test]
    fn test_set_parses_each_type() {
        let mut value = FlagValue::String(String::new());
        value.set("http://127.0.0.1").unwrap();
        assert_eq!(value, FlagValue::String("http://127.0.0.1".to_string()));

        let mut value = FlagValue::Int(0);
        value.set("-42").unwrap();
        assert_eq!(value, FlagValue::Int(-42));

        let mut value = FlagValue::Float(0.0);
        value.set("2.5").unwrap();
        assert_eq!(value, FlagValue::Float(2.5));

        let mut value = FlagValue::Duration(Duration::ZERO);
        value.set("250ms").unwrap();
        assert_eq!(value, FlagValue::Duration(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_duration_segments() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("+5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1h1m1s").unwrap(), Duration::from_secs(3661));
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("10µs").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("3ns").unwrap(), Duration::from_nanos(3));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        for raw in ["", "s", "5", "-5s", "1.2.3s", "5 s", "5d", ".s"] {
            assert!(parse_duration(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        // The whole part alone fits in the accumulator; the fraction tips it over.
        assert!(parse_duration("94522879700260684295381835.9h").is_err());
        assert!(parse_duration("94522879700260684295381835h").is_err());
        assert!(parse_duration("5124096h").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(10)), "10ns");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m0s");
        assert_eq!(format_duration(Duration::from_millis(61_250)), "1m1.25s");
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let json = serde_json::to_string(&vec![
            FlagValue::Bool(true),
            FlagValue::Int(13),
            FlagValue::String("x".to_string()),
            FlagValue::Duration(Duration::from_secs(90)),
        ])
        .unwrap();
        assert_eq!(json, r#"[true,13,"x","1m30s"]"#);
    }
}
