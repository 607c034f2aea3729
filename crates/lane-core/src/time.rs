//! Fixed-point race times.
//!
//! Every time value inside the crate is an integer count of centiseconds.
//! At any boundary (serde, CLI output, storage summaries) a time is written as
//! the canonical zero-padded `MM:SS.CC` string.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pre-compiled pattern for `M:SS.CC` / `MM:SS.CC`.
///
/// ASCII classes on purpose: `\d` would also accept non-ASCII digits.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})\.([0-9]{2})$").unwrap());

const CENTIS_PER_SECOND: u32 = 100;
const CENTIS_PER_MINUTE: u32 = 60 * CENTIS_PER_SECOND;

/// A time string could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The input does not match `M{1,2}:SS.CC`.
    #[error("expected a time like MM:SS.CC, got {input:?}")]
    Pattern { input: String },

    /// The seconds component is above 59.
    #[error("seconds must be between 00 and 59, got {value}")]
    SecondsOutOfRange { value: u32 },
}

/// A numeric value cannot be represented as a [`Time`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("time cannot be negative, got {value}")]
    Negative { value: f64 },

    #[error("time must be a finite number, got {value}")]
    NotFinite { value: f64 },

    #[error("time {value} exceeds the representable range")]
    OutOfRange { value: f64 },
}

/// A race time as a non-negative count of centiseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u32);

impl Time {
    pub const ZERO: Self = Self(0);

    /// Creates a time from a centisecond count.
    #[must_use]
    pub const fn from_centis(centis: u32) -> Self {
        Self(centis)
    }

    /// Creates a time from a signed centisecond count, rejecting negatives.
    pub fn try_from_centis(centis: i64) -> Result<Self, DomainError> {
        #[expect(
            clippy::cast_precision_loss,
            reason = "only used to report the rejected value"
        )]
        let reported = centis as f64;
        if centis < 0 {
            return Err(DomainError::Negative { value: reported });
        }
        u32::try_from(centis)
            .map(Self)
            .map_err(|_| DomainError::OutOfRange { value: reported })
    }

    /// Converts seconds to a time, rounding to the nearest centisecond.
    pub fn from_seconds(seconds: f64) -> Result<Self, DomainError> {
        if !seconds.is_finite() {
            return Err(DomainError::NotFinite { value: seconds });
        }
        if seconds < 0.0 {
            return Err(DomainError::Negative { value: seconds });
        }
        let centis = (seconds * f64::from(CENTIS_PER_SECOND)).round();
        if centis > f64::from(u32::MAX) {
            return Err(DomainError::OutOfRange { value: seconds });
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "range checked above"
        )]
        let centis = centis as u32;
        Ok(Self(centis))
    }

    /// Returns the raw centisecond count.
    #[must_use]
    pub const fn centis(self) -> u32 {
        self.0
    }

    /// Returns the time in seconds.
    #[must_use]
    pub fn to_seconds(self) -> f64 {
        f64::from(self.0) / f64::from(CENTIS_PER_SECOND)
    }
}

/// Parses a strict `M{1,2}:SS.CC` string into centiseconds.
///
/// `cs = minutes * 6000 + seconds * 100 + centiseconds`.
pub fn parse(input: &str) -> Result<Time, FormatError> {
    let Some(caps) = TIME_RE.captures(input) else {
        return Err(FormatError::Pattern {
            input: input.to_string(),
        });
    };

    // The pattern guarantees at most two ASCII digits per component.
    let component = |i: usize| -> Result<u32, FormatError> {
        caps[i].parse().map_err(|_| FormatError::Pattern {
            input: input.to_string(),
        })
    };
    let minutes = component(1)?;
    let seconds = component(2)?;
    let centis = component(3)?;

    if seconds > 59 {
        return Err(FormatError::SecondsOutOfRange { value: seconds });
    }

    Ok(Time(
        minutes * CENTIS_PER_MINUTE + seconds * CENTIS_PER_SECOND + centis,
    ))
}

/// Formats a time as zero-padded `MM:SS.CC`.
pub fn format(time: Time) -> String {
    time.to_string()
}

/// Formats a signed centisecond difference as `+MM:SS.CC` / `-MM:SS.CC`.
///
/// A zero difference is written without a sign.
pub fn format_signed(delta_cs: i64) -> String {
    let magnitude = delta_cs.unsigned_abs();
    let minutes = magnitude / u64::from(CENTIS_PER_MINUTE);
    let seconds = (magnitude % u64::from(CENTIS_PER_MINUTE)) / u64::from(CENTIS_PER_SECOND);
    let centis = magnitude % u64::from(CENTIS_PER_SECOND);
    let sign = match delta_cs.signum() {
        1 => "+",
        -1 => "-",
        _ => "",
    };
    format!("{sign}{minutes:02}:{seconds:02}.{centis:02}")
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / CENTIS_PER_MINUTE;
        let seconds = (self.0 % CENTIS_PER_MINUTE) / CENTIS_PER_SECOND;
        let centis = self.0 % CENTIS_PER_SECOND;
        write!(f, "{minutes:02}:{seconds:02}.{centis:02}")
    }
}

impl FromStr for Time {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_digit_minutes() {
        assert_eq!(parse("1:23.45").unwrap(), Time::from_centis(8345));
        assert_eq!(format(Time::from_centis(8345)), "01:23.45");
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format(Time::ZERO), "00:00.00");
        assert_eq!(format(Time::from_centis(5)), "00:00.05");
        assert_eq!(format(Time::from_centis(599_999)), "99:59.99");
    }

    #[test]
    fn format_inverts_parse_for_canonical_strings() {
        for minutes in [0, 1, 9, 10, 59, 99] {
            for seconds in [0, 7, 30, 59] {
                for centis in [0, 1, 50, 99] {
                    let canonical = format!("{minutes:02}:{seconds:02}.{centis:02}");
                    let time = parse(&canonical).unwrap();
                    assert_eq!(format(time), canonical);
                }
            }
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "1:2.45",
            "123:00.00",
            "01:23.4",
            "01:23.456",
            " 01:23.45",
            "01:23.45 ",
            "01:23,45",
            "-1:00.00",
            "01-23.45",
            "٠١:٢٣.٤٥",
        ] {
            assert!(
                matches!(parse(input), Err(FormatError::Pattern { .. })),
                "expected pattern error for {input:?}"
            );
        }
    }

    #[test]
    fn rejects_seconds_above_59() {
        assert_eq!(
            parse("01:60.00"),
            Err(FormatError::SecondsOutOfRange { value: 60 })
        );
    }

    #[test]
    fn converts_seconds_with_rounding() {
        assert_eq!(Time::from_seconds(83.45).unwrap().centis(), 8345);
        assert_eq!(Time::from_seconds(0.004).unwrap().centis(), 0);
        assert_eq!(Time::from_seconds(0.005).unwrap().centis(), 1);
        assert!((Time::from_centis(8345).to_seconds() - 83.45).abs() < 1e-9);
    }

    #[test]
    fn rejects_negative_and_non_finite_seconds() {
        assert!(matches!(
            Time::from_seconds(-0.01),
            Err(DomainError::Negative { .. })
        ));
        assert!(matches!(
            Time::from_seconds(f64::NAN),
            Err(DomainError::NotFinite { .. })
        ));
        assert!(matches!(
            Time::from_seconds(f64::INFINITY),
            Err(DomainError::NotFinite { .. })
        ));
    }

    #[test]
    fn signed_centis_reject_negatives() {
        assert_eq!(Time::try_from_centis(6000).unwrap().centis(), 6000);
        assert!(matches!(
            Time::try_from_centis(-1),
            Err(DomainError::Negative { .. })
        ));
        assert!(matches!(
            Time::try_from_centis(i64::from(u32::MAX) + 1),
            Err(DomainError::OutOfRange { .. })
        ));
    }

    #[test]
    fn signed_format_marks_direction() {
        assert_eq!(format_signed(45), "+00:00.45");
        assert_eq!(format_signed(-6123), "-01:01.23");
        assert_eq!(format_signed(0), "00:00.00");
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json::to_string(&Time::from_centis(8345)).unwrap();
        assert_eq!(json, "\"01:23.45\"");
        let parsed: Time = serde_json::from_str("\"1:23.45\"").unwrap();
        assert_eq!(parsed.centis(), 8345);
        assert!(serde_json::from_str::<Time>("\"1:23\"").is_err());
        assert!(serde_json::from_str::<Time>("8345").is_err());
    }
}
