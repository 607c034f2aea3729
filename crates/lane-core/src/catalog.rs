//! Read-only reference data: competitions, swimmers and the event catalog.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{CompetitionId, Course, EventId, Style, SwimmerId, UnknownVariant};

/// A competition (meet) results are captured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    pub course: Course,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

impl Competition {
    /// Whether `date` falls inside the competition, both ends inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_date..=self.end_date).contains(&date)
    }
}

/// A swimmer results are captured for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swimmer {
    pub id: SwimmerId,
    pub full_name: String,
    pub birth_date: NaiveDate,
}

/// Stroke of a catalog event; medley mixes all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStyle {
    Free,
    Back,
    Breast,
    Fly,
    Medley,
}

impl EventStyle {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Back => "Back",
            Self::Breast => "Breast",
            Self::Fly => "Fly",
            Self::Medley => "Medley",
        }
    }
}

impl fmt::Display for EventStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Medley" => Ok(Self::Medley),
            other => other.parse::<Style>().map(|style| match style {
                Style::Free => Self::Free,
                Style::Back => Self::Back,
                Style::Breast => Self::Breast,
                Style::Fly => Self::Fly,
            }),
        }
    }
}

/// A race from the event catalog, e.g. 200 m medley long course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub id: EventId,
    pub style: EventStyle,
    pub distance_m: u32,
    pub course: Course,
}

impl RaceEvent {
    #[must_use]
    pub const fn lap_length(&self) -> u32 {
        self.course.lap_length()
    }

    /// Number of splits captured for this event: one per lap.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        (self.distance_m / self.lap_length()) as usize
    }

    /// Display name such as `100m Free SC`.
    pub fn name(&self) -> String {
        format!("{}m {} {}", self.distance_m, self.style, self.course)
    }

    /// Stroke required for the 1-based segment `index`, if the event fixes one.
    ///
    /// Medley events split the laps into four equal quarters swum fly, back,
    /// breast, free. Single-stroke events do not constrain the segment style.
    pub fn expected_style(&self, index: u32) -> Option<Style> {
        if self.style != EventStyle::Medley {
            return None;
        }
        let laps = self.segment_count();
        let position = usize::try_from(index.checked_sub(1)?).ok()?;
        if laps == 0 || position >= laps {
            return None;
        }
        // Quarters by race distance, not one stroke per lap: a short-course
        // 200 IM swims laps 1-2 fly and 3-4 back, where `(index - 1) % 4`
        // would rotate strokes every lap.
        let quarter = (position * 4 / laps).min(3);
        Some(Style::MEDLEY_ORDER[quarter])
    }
}

/// Age group a swimmer competes in, fixed on the competition date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "11-12")]
    Under13,
    #[serde(rename = "13-14")]
    Age13To14,
    #[serde(rename = "15-16")]
    Age15To16,
    #[serde(rename = "17+")]
    Open,
}

impl AgeCategory {
    /// Category for a whole-year age.
    #[must_use]
    pub const fn from_age(age: i32) -> Self {
        match age {
            ..=12 => Self::Under13,
            13..=14 => Self::Age13To14,
            15..=16 => Self::Age15To16,
            _ => Self::Open,
        }
    }

    /// Category of a swimmer born on `birth_date` when competing on `on`.
    pub fn on_date(birth_date: NaiveDate, on: NaiveDate) -> Self {
        let had_birthday = (on.month(), on.day()) >= (birth_date.month(), birth_date.day());
        let age = on.year() - birth_date.year() - i32::from(!had_birthday);
        Self::from_age(age)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Under13 => "11-12",
            Self::Age13To14 => "13-14",
            Self::Age15To16 => "15-16",
            Self::Open => "17+",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only provider of reference records, queried during stages 1–3.
///
/// The core never mutates reference data; implementations may be backed by a
/// database, a remote service or test fixtures.
pub trait ReferenceData {
    type Error: std::error::Error + Send + Sync + 'static;

    fn competition(&self, id: &CompetitionId) -> Result<Option<Competition>, Self::Error>;

    fn swimmer(&self, id: &SwimmerId) -> Result<Option<Swimmer>, Self::Error>;

    fn race_event(&self, id: &EventId) -> Result<Option<RaceEvent>, Self::Error>;
}
