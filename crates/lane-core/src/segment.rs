//! Race segments (splits) and their per-segment validation.

use serde::{Deserialize, Serialize};

use crate::time::{self, Time};
use crate::types::{Style, ValidationError};

/// A segment as entered by the user, before validation.
///
/// Numeric fields are signed and the time is kept as text so that every bad
/// value can be reported back to the field it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInput {
    /// 1-based position of the segment in the race.
    pub index: i64,
    pub style: Style,
    pub distance_m: i64,
    /// Split time as `MM:SS.CC`.
    pub time: String,
    #[serde(default)]
    pub stroke_count: i64,
    /// Underwater distance off the wall.
    #[serde(default)]
    pub streamline_m: f64,
}

/// A validated segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: u32,
    pub style: Style,
    pub distance_m: u32,
    pub time: Time,
    pub stroke_count: u32,
    pub streamline_m: f64,
}

impl Segment {
    /// Distance covered swimming, after the streamline phase.
    pub fn swim_distance_m(&self) -> f64 {
        (f64::from(self.distance_m) - self.streamline_m).max(0.0)
    }
}

impl From<&Segment> for SegmentInput {
    fn from(segment: &Segment) -> Self {
        Self {
            index: i64::from(segment.index),
            style: segment.style,
            distance_m: i64::from(segment.distance_m),
            time: time::format(segment.time),
            stroke_count: i64::from(segment.stroke_count),
            streamline_m: segment.streamline_m,
        }
    }
}

/// Validates one segment against its physical bounds.
///
/// All violations are collected; the function never stops at the first one.
pub fn validate(input: &SegmentInput) -> Result<Segment, Vec<ValidationError>> {
    let segment = input.index;
    let mut errors = Vec::new();

    let index = u32::try_from(input.index).ok().filter(|&i| i >= 1);
    if index.is_none() {
        errors.push(ValidationError::InvalidIndex { segment });
    }

    let distance_m = u32::try_from(input.distance_m).ok().filter(|&d| d > 0);
    if distance_m.is_none() {
        errors.push(ValidationError::NonPositiveDistance {
            segment,
            value: input.distance_m,
        });
    }

    // NaN fails the range check as well.
    let streamline_ok = input.streamline_m >= 0.0
        && distance_m.is_none_or(|d| input.streamline_m <= f64::from(d));
    if !streamline_ok {
        errors.push(ValidationError::StreamlineOutOfRange {
            segment,
            value: input.streamline_m,
            distance: input.distance_m,
        });
    }

    let split = match time::parse(&input.time) {
        Ok(t) => Some(t),
        Err(source) => {
            errors.push(ValidationError::InvalidTime { segment, source });
            None
        }
    };

    let stroke_count = u32::try_from(input.stroke_count).ok();
    if stroke_count.is_none() {
        errors.push(ValidationError::NegativeStrokeCount {
            segment,
            value: input.stroke_count,
        });
    }

    match (index, distance_m, split, stroke_count) {
        (Some(index), Some(distance_m), Some(time), Some(stroke_count)) if errors.is_empty() => {
            Ok(Segment {
                index,
                style: input.style,
                distance_m,
                time,
                stroke_count,
                streamline_m: input.streamline_m,
            })
        }
        _ => Err(errors),
    }
}

/// Validates every segment, returning the valid ones or all errors combined.
pub fn validate_all(inputs: &[SegmentInput]) -> Result<Vec<Segment>, Vec<ValidationError>> {
    let mut segments = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();
    for input in inputs {
        match validate(input) {
            Ok(segment) => segments.push(segment),
            Err(mut found) => errors.append(&mut found),
        }
    }
    if errors.is_empty() {
        Ok(segments)
    } else {
        Err(errors)
    }
}
