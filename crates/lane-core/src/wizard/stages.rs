//! Per-stage gate predicates.
//!
//! Each predicate inspects a wizard state and returns every violation that
//! blocks leaving its stage. An empty list means the stage may advance.

use std::collections::BTreeSet;

use crate::catalog::RaceEvent;
use crate::segment;
use crate::types::ValidationError;

use super::{SegmentForm, Stage, WizardState};

/// Violations blocking a forward transition out of `state.stage`.
pub fn validate_stage(state: &WizardState) -> Vec<ValidationError> {
    match state.stage {
        Stage::Context => context_errors(state),
        Stage::Subject => subject_errors(state),
        Stage::Event => event_errors(state),
        Stage::Segments => segment_errors(state),
        Stage::Committed => Vec::new(),
    }
}

fn context_errors(state: &WizardState) -> Vec<ValidationError> {
    let Some(competition) = &state.competition else {
        return vec![ValidationError::MissingCompetition];
    };

    let mut errors = Vec::new();
    if competition.name.trim().is_empty() {
        errors.push(ValidationError::Empty {
            field: "competition name",
        });
    }
    if competition.start_date > competition.end_date {
        errors.push(ValidationError::InvalidDateRange {
            start: competition.start_date,
            end: competition.end_date,
        });
    } else if let Some(date) = state.recorded_on() {
        if !competition.contains(date) {
            errors.push(ValidationError::RecordedOutsideRange {
                date,
                start: competition.start_date,
                end: competition.end_date,
            });
        }
    }
    errors
}

fn subject_errors(state: &WizardState) -> Vec<ValidationError> {
    if state.swimmer.is_some() {
        Vec::new()
    } else {
        vec![ValidationError::MissingSwimmer]
    }
}

fn event_errors(state: &WizardState) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    match (&state.event, &state.competition) {
        (None, _) => errors.push(ValidationError::MissingEvent),
        (Some(event), Some(competition)) if event.course != competition.course => {
            errors.push(ValidationError::CourseMismatch {
                event: event.course,
                competition: competition.course,
            });
        }
        _ => {}
    }
    if state.phase.is_none() {
        errors.push(ValidationError::MissingPhase);
    }
    errors
}

fn segment_errors(state: &WizardState) -> Vec<ValidationError> {
    let empty = SegmentForm::default();
    let form = state.form.as_ref().unwrap_or(&empty);

    let mut errors = Vec::new();
    if form.segments.is_empty() {
        errors.push(ValidationError::NoSegments);
    } else {
        for input in &form.segments {
            if let Err(segment_errors) = segment::validate(input) {
                errors.extend(segment_errors);
            }
        }
        errors.extend(contiguity_errors(form));
    }

    match &state.event {
        Some(event) => errors.extend(event_shape_errors(event, form)),
        None => errors.push(ValidationError::MissingEvent),
    }

    if form.global_time.is_none() {
        errors.push(ValidationError::MissingGlobalTime);
    }
    errors
}

fn contiguity_errors(form: &SegmentForm) -> Option<ValidationError> {
    let indices: Vec<i64> = form.segments.iter().map(|s| s.index).collect();
    let unique: BTreeSet<i64> = indices.iter().copied().collect();
    let expected = indices.len();
    let contiguous = unique.len() == expected
        && unique
            .iter()
            .zip(1_i64..)
            .all(|(index, position)| *index == position);
    (!contiguous).then_some(ValidationError::NonContiguousIndices { indices, expected })
}

/// Checks that tie the segments to the selected event's layout.
fn event_shape_errors(event: &RaceEvent, form: &SegmentForm) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !form.segments.is_empty() && form.segments.len() != event.segment_count() {
        errors.push(ValidationError::SegmentCountMismatch {
            expected: event.segment_count(),
            actual: form.segments.len(),
        });
    }

    let lap = event.lap_length();
    for input in &form.segments {
        // Non-positive distances are already reported by the segment validator.
        if input.distance_m > 0 && input.distance_m != i64::from(lap) {
            errors.push(ValidationError::LapDistanceMismatch {
                segment: input.index,
                expected: lap,
                actual: input.distance_m,
            });
        }
        let expected = u32::try_from(input.index)
            .ok()
            .and_then(|index| event.expected_style(index));
        if let Some(expected) = expected {
            if expected != input.style {
                errors.push(ValidationError::MedleyOrder {
                    segment: input.index,
                    expected,
                    actual: input.style,
                });
            }
        }
    }

    if form.time_15m.is_some() && event.distance_m != 50 {
        errors.push(ValidationError::Time15mNotAllowed {
            distance: event.distance_m,
        });
    }
    errors
}
