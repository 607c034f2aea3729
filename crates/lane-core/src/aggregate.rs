//! Race-level aggregation of validated segments.
//!
//! # Algorithm Summary
//!
//! 1. Refuse structurally broken drafts (indices must be exactly `1..=N`)
//! 2. Sum split times in index order and compare with the global time
//! 3. Sum technical counters and derive velocity and distance per stroke
//!
//! The aggregate is recomputed from scratch whenever its inputs change; it is
//! never patched in place.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::segment::Segment;
use crate::time::Time;
use crate::types::{CompetitionId, EventId, Phase, SwimmerId};

/// Configuration for result aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Largest tolerated `|sum of splits - global time|` before a result is
    /// tagged for review. Covers reaction time and timing-system slack.
    /// Default: 40 (0.40 s).
    pub review_tolerance_cs: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            review_tolerance_cs: 40,
        }
    }
}

/// The segments cannot be aggregated into a single race.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("result has no segments")]
    Empty,

    #[error("segment index {index} appears more than once")]
    DuplicateIndex { index: u32 },

    #[error("segment index {index} is missing from 1..={count}")]
    MissingIndex { index: u32, count: usize },

    /// The split times add up to more than a `Time` can hold.
    #[error("sum of splits ({sum_cs} cs) exceeds the representable time range")]
    SumOutOfRange { sum_cs: u64 },
}

/// Non-blocking finding attached to an aggregate for downstream review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainWarning {
    /// The global time is zero, so average velocity could not be computed.
    ZeroGlobalTime,
    /// A split time is zero, so its velocity could not be computed.
    ZeroSegmentTime { index: u32 },
}

impl fmt::Display for DomainWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGlobalTime => write!(f, "global time is zero, average velocity not computed"),
            Self::ZeroSegmentTime { index } => {
                write!(f, "segment {index} time is zero, velocity not computed")
            }
        }
    }
}

/// Input to the aggregator: an immutable snapshot of a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDraft {
    pub competition_id: CompetitionId,
    pub swimmer_id: SwimmerId,
    pub event_id: EventId,
    pub phase: Phase,
    /// Ordered by index once validated.
    pub segments: Vec<Segment>,
    pub global_time: Time,
    /// Time at the 15 m mark, only captured for 50 m events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_15m: Option<Time>,
}

/// Per-segment derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub index: u32,
    pub time: Time,
    pub swim_distance_m: f64,
    pub velocity_mps: f64,
    pub distance_per_stroke_m: Option<f64>,
}

/// Race-level derived metrics and consistency checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultAggregate {
    pub sum_of_splits: Time,
    /// `sum_of_splits - global_time` in centiseconds.
    pub deviation_cs: i64,
    pub absolute_deviation_cs: u64,
    pub requires_review: bool,
    pub total_strokes: u64,
    pub total_streamline_m: f64,
    pub total_swim_distance_m: f64,
    pub total_distance_m: u64,
    pub average_velocity_mps: f64,
    /// `None` when no strokes were counted.
    pub distance_per_stroke_m: Option<f64>,
    pub splits: Vec<SplitMetrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DomainWarning>,
}

/// Checks that segment indices are exactly `1..=N` and returns them in order.
pub fn ordered_segments(segments: &[Segment]) -> Result<Vec<&Segment>, StructuralError> {
    if segments.is_empty() {
        return Err(StructuralError::Empty);
    }
    let count = segments.len();
    let mut slots: Vec<Option<&Segment>> = vec![None; count];
    for segment in segments {
        let position = usize::try_from(segment.index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .filter(|&p| p < count);
        let Some(position) = position else {
            // An index outside 1..=N means some index inside it is missing.
            let index = first_missing(segments, count);
            return Err(StructuralError::MissingIndex { index, count });
        };
        if slots[position].is_some() {
            return Err(StructuralError::DuplicateIndex {
                index: segment.index,
            });
        }
        slots[position] = Some(segment);
    }
    // N distinct indices inside 1..=N fill every slot.
    Ok(slots.into_iter().flatten().collect())
}

fn first_missing(segments: &[Segment], count: usize) -> u32 {
    (1..=count)
        .filter_map(|i| u32::try_from(i).ok())
        .find(|i| !segments.iter().any(|s| s.index == *i))
        .unwrap_or(0)
}

/// Aggregates a draft with the default configuration.
pub fn compute(draft: &ResultDraft) -> Result<ResultAggregate, StructuralError> {
    compute_with(draft, &AggregationConfig::default())
}

/// Aggregates a draft into race-level metrics.
///
/// Deterministic: the same draft always yields an identical aggregate.
pub fn compute_with(
    draft: &ResultDraft,
    config: &AggregationConfig,
) -> Result<ResultAggregate, StructuralError> {
    let ordered = ordered_segments(&draft.segments)?;
    let mut warnings = Vec::new();

    let mut sum_cs: u64 = 0;
    let mut total_strokes: u64 = 0;
    let mut total_streamline_m = 0.0;
    let mut total_swim_distance_m = 0.0;
    let mut total_distance_m: u64 = 0;
    let mut splits = Vec::with_capacity(ordered.len());

    for segment in ordered {
        sum_cs += u64::from(segment.time.centis());
        total_strokes += u64::from(segment.stroke_count);
        total_streamline_m += segment.streamline_m;
        total_distance_m += u64::from(segment.distance_m);

        let swim_distance_m = segment.swim_distance_m();
        total_swim_distance_m += swim_distance_m;

        let velocity_mps = if segment.time == Time::ZERO {
            warnings.push(DomainWarning::ZeroSegmentTime {
                index: segment.index,
            });
            0.0
        } else {
            f64::from(segment.distance_m) / segment.time.to_seconds()
        };

        splits.push(SplitMetrics {
            index: segment.index,
            time: segment.time,
            swim_distance_m,
            velocity_mps,
            distance_per_stroke_m: per_stroke(swim_distance_m, u64::from(segment.stroke_count)),
        });
    }

    let sum_of_splits = u32::try_from(sum_cs)
        .map(Time::from_centis)
        .map_err(|_| StructuralError::SumOutOfRange { sum_cs })?;
    let deviation_cs = i64::from(sum_of_splits.centis()) - i64::from(draft.global_time.centis());
    let absolute_deviation_cs = deviation_cs.unsigned_abs();
    let requires_review = absolute_deviation_cs > u64::from(config.review_tolerance_cs);

    #[expect(
        clippy::cast_precision_loss,
        reason = "race distances are far below 2^52 metres"
    )]
    let distance = total_distance_m as f64;
    let average_velocity_mps = if draft.global_time == Time::ZERO {
        warnings.insert(0, DomainWarning::ZeroGlobalTime);
        0.0
    } else {
        distance / draft.global_time.to_seconds()
    };

    if requires_review {
        tracing::warn!(
            deviation_cs,
            tolerance_cs = config.review_tolerance_cs,
            "split sum deviates from global time"
        );
    }
    for warning in &warnings {
        tracing::warn!(?warning, "domain warning while aggregating result");
    }

    Ok(ResultAggregate {
        sum_of_splits,
        deviation_cs,
        absolute_deviation_cs,
        requires_review,
        total_strokes,
        total_streamline_m,
        total_swim_distance_m,
        total_distance_m,
        average_velocity_mps,
        distance_per_stroke_m: per_stroke(total_swim_distance_m, total_strokes),
        splits,
        warnings,
    })
}

fn per_stroke(swim_distance_m: f64, strokes: u64) -> Option<f64> {
    if strokes == 0 {
        return None;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "stroke counts are far below 2^52"
    )]
    let strokes = strokes as f64;
    Some(swim_distance_m / strokes)
}
