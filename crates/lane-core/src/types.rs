//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::FormatError;

/// Validation errors for segments, identifiers and wizard stages.
///
/// Validators never stop at the first problem: they return every violation
/// they find so the presentation layer can mark all offending fields at once.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A segment index below 1.
    #[error("segment {segment}: index must be 1 or greater")]
    InvalidIndex { segment: i64 },

    /// A segment with a zero or negative distance.
    #[error("segment {segment}: distance must be positive, got {value} m")]
    NonPositiveDistance { segment: i64, value: i64 },

    /// Streamline distance outside `0..=distance`.
    #[error("segment {segment}: streamline distance {value} m must be between 0 and {distance} m")]
    StreamlineOutOfRange {
        segment: i64,
        value: f64,
        distance: i64,
    },

    /// The split time could not be parsed.
    #[error("segment {segment}: {source}")]
    InvalidTime {
        segment: i64,
        #[source]
        source: FormatError,
    },

    /// A negative stroke count.
    #[error("segment {segment}: stroke count cannot be negative, got {value}")]
    NegativeStrokeCount { segment: i64, value: i64 },

    #[error("no competition selected")]
    MissingCompetition,

    #[error("competition ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("recording date {date} is outside the competition dates {start}..={end}")]
    RecordedOutsideRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("no swimmer selected")]
    MissingSwimmer,

    #[error("no event selected")]
    MissingEvent,

    #[error("no phase selected")]
    MissingPhase,

    /// The event is swum in a different pool than the competition.
    #[error("event is {event} but the competition is {competition}")]
    CourseMismatch { event: Course, competition: Course },

    #[error("at least one segment is required")]
    NoSegments,

    /// Segment indices are not exactly `1..=N`.
    #[error("segment indices must run 1..={expected} without gaps or duplicates, got {indices:?}")]
    NonContiguousIndices { indices: Vec<i64>, expected: usize },

    #[error("expected {expected} segments for this event, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },

    #[error("segment {segment}: distance must be {expected} m for this course, got {actual} m")]
    LapDistanceMismatch {
        segment: i64,
        expected: u32,
        actual: i64,
    },

    #[error("segment {segment}: medley order expects {expected}, got {actual}")]
    MedleyOrder {
        segment: i64,
        expected: Style,
        actual: Style,
    },

    #[error("global time is required")]
    MissingGlobalTime,

    #[error("a 15 m time is only allowed for 50 m events, this event is {distance} m")]
    Time15mNotAllowed { distance: u32 },
}

/// Stroke swum during a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Style {
    Free,
    Back,
    Breast,
    Fly,
}

impl Style {
    /// Medley order: butterfly, backstroke, breaststroke, freestyle.
    pub const MEDLEY_ORDER: [Self; 4] = [Self::Fly, Self::Back, Self::Breast, Self::Free];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Back => "Back",
            Self::Breast => "Breast",
            Self::Fly => "Fly",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Style {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(Self::Free),
            "Back" => Ok(Self::Back),
            "Breast" => Ok(Self::Breast),
            "Fly" => Ok(Self::Fly),
            _ => Err(UnknownVariant::new("style", s)),
        }
    }
}

/// Competition round the result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Preliminary,
    Semifinal,
    Final,
}

impl Phase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preliminary => "Preliminary",
            Self::Semifinal => "Semifinal",
            Self::Final => "Final",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Preliminary" => Ok(Self::Preliminary),
            "Semifinal" => Ok(Self::Semifinal),
            "Final" => Ok(Self::Final),
            _ => Err(UnknownVariant::new("phase", s)),
        }
    }
}

/// Pool length: short course (25 m) or long course (50 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Course {
    #[serde(rename = "SC")]
    Short,
    #[serde(rename = "LC")]
    Long,
}

impl Course {
    /// Length of one lap in metres.
    #[must_use]
    pub const fn lap_length(&self) -> u32 {
        match self {
            Self::Short => 25,
            Self::Long => 50,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "SC",
            Self::Long => "LC",
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Course {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SC" => Ok(Self::Short),
            "LC" => Ok(Self::Long),
            _ => Err(UnknownVariant::new("course", s)),
        }
    }
}

/// Whether a committed result needs a second look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Review,
}

impl ValidationStatus {
    #[must_use]
    pub const fn from_review_flag(requires_review: bool) -> Self {
        if requires_review {
            Self::Review
        } else {
            Self::Valid
        }
    }

    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Review => "review",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValidationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "review" => Ok(Self::Review),
            _ => Err(UnknownVariant::new("validation status", s)),
        }
    }
}

/// Error type for unknown enum strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated competition identifier.
    CompetitionId, "competition ID"
);

define_string_id!(
    /// A validated swimmer identifier.
    SwimmerId, "swimmer ID"
);

define_string_id!(
    /// A validated event (catalog race) identifier, e.g. `100-free-lc`.
    EventId, "event ID"
);

define_string_id!(
    /// A validated capture draft identifier.
    ///
    /// One draft is owned by exactly one wizard for its lifetime.
    DraftId, "draft ID"
);

/// Identifier assigned by the persistence collaborator to a committed result.
pub type ResultId = i64;
