//! Four-stage capture flow as an explicit state machine.
//!
//! [`transition`] is pure: it maps the current [`WizardState`] and a
//! [`WizardEvent`] to the next state plus the side effects the host must run
//! ([`Effect`]). [`CaptureWizard`] is the host that owns a state, executes the
//! effects against a [`ResultStore`] and debounces autosaves on a
//! [`Scheduler`].

mod host;
mod schedule;
mod stages;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{ResultDraft, StructuralError};
use crate::catalog::{AgeCategory, Competition, RaceEvent, Swimmer};
use crate::record::{CommitConfig, CommittedResult};
use crate::segment::{self, SegmentInput};
use crate::time::{self, FormatError, Time};
use crate::types::{DraftId, Phase, ValidationError};

pub use host::{CaptureWizard, ResultStore, SaveFailure};
pub use schedule::{Scheduler, SystemScheduler, TimerToken, VirtualScheduler};
pub use stages::validate_stage;

/// Position in the capture flow. Ordered: earlier stages compare lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Context,
    Subject,
    Event,
    Segments,
    Committed,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Subject => "subject",
            Self::Event => "event",
            Self::Segments => "segments",
            Self::Committed => "committed",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Context => Self::Subject,
            Self::Subject => Self::Event,
            Self::Event => Self::Segments,
            Self::Segments | Self::Committed => Self::Committed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Editable data of the final stage. Created on first entry to
/// [`Stage::Segments`] and kept when navigating back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentForm {
    /// Kept sorted by index.
    pub segments: Vec<SegmentInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_15m: Option<Time>,
}

/// Everything the wizard knows about one capture. Serialized as the autosave
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub draft_id: DraftId,
    pub stage: Stage,
    #[serde(default)]
    pub competition: Option<Competition>,
    /// Explicit recording date; falls back to the competition start date.
    #[serde(default)]
    pub recorded_on: Option<NaiveDate>,
    #[serde(default)]
    pub swimmer: Option<Swimmer>,
    #[serde(default)]
    pub event: Option<RaceEvent>,
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub form: Option<SegmentForm>,
    /// Set once the capture reached [`Stage::Committed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed: Option<Box<CommittedResult>>,
}

impl WizardState {
    /// A blank capture at the first stage.
    pub const fn new(draft_id: DraftId) -> Self {
        Self {
            draft_id,
            stage: Stage::Context,
            competition: None,
            recorded_on: None,
            swimmer: None,
            event: None,
            phase: None,
            form: None,
            committed: None,
        }
    }

    /// Date the result is recorded on.
    pub fn recorded_on(&self) -> Option<NaiveDate> {
        self.recorded_on
            .or_else(|| self.competition.as_ref().map(|c| c.start_date))
    }

    fn form_mut(&mut self) -> &mut SegmentForm {
        self.form.get_or_insert_with(SegmentForm::default)
    }
}

/// User intents fed to [`transition`].
///
/// Edits are accepted only while the wizard sits in the stage that owns the
/// edited field; navigate back first to change earlier answers.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    SelectCompetition(Competition),
    SetRecordedOn(NaiveDate),
    SelectSwimmer(Swimmer),
    SelectEvent(RaceEvent),
    SelectPhase(Phase),
    /// Inserts a segment or replaces the one with the same index.
    UpsertSegment(SegmentInput),
    RemoveSegment(i64),
    /// Raw `MM:SS.CC` text; rejected inline when unparseable.
    SetGlobalTime(String),
    SetTime15m(Option<String>),
    /// Leave the current stage if its gate passes; commits from the last stage.
    Advance,
    GoBack(Stage),
}

impl WizardEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::SelectCompetition(_) => "select competition",
            Self::SetRecordedOn(_) => "set recording date",
            Self::SelectSwimmer(_) => "select swimmer",
            Self::SelectEvent(_) => "select event",
            Self::SelectPhase(_) => "select phase",
            Self::UpsertSegment(_) => "edit segment",
            Self::RemoveSegment(_) => "remove segment",
            Self::SetGlobalTime(_) => "set global time",
            Self::SetTime15m(_) => "set 15 m time",
            Self::Advance => "advance",
            Self::GoBack(_) => "go back",
        }
    }

    const fn owning_stage(&self) -> Option<Stage> {
        match self {
            Self::SelectCompetition(_) | Self::SetRecordedOn(_) => Some(Stage::Context),
            Self::SelectSwimmer(_) => Some(Stage::Subject),
            Self::SelectEvent(_) | Self::SelectPhase(_) => Some(Stage::Event),
            Self::UpsertSegment(_)
            | Self::RemoveSegment(_)
            | Self::SetGlobalTime(_)
            | Self::SetTime15m(_) => Some(Stage::Segments),
            Self::Advance | Self::GoBack(_) => None,
        }
    }
}

/// Side effects requested by a transition, executed by the host in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Re-arm the debounced autosave of the host's current state.
    ScheduleAutosave,
    /// Cancel any pending autosave and write this snapshot now.
    FlushAutosave(Box<WizardState>),
    /// Hand the result to the persistence collaborator.
    Commit(Box<CommittedResult>),
}

/// Outcome of an accepted event. The host adopts `state` once every effect ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WizardState,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("capture {0} is already committed; start a new capture")]
    Committed(DraftId),

    #[error("cannot {event} during the {stage} stage")]
    WrongStage { stage: Stage, event: &'static str },

    #[error("cannot go back from {from} to {to}")]
    InvalidBack { from: Stage, to: Stage },

    #[error("segment {0} does not exist")]
    UnknownSegment(i64),

    /// Unparseable time, reported against the field it was typed into.
    #[error("{field}: {source}")]
    Format {
        field: &'static str,
        #[source]
        source: FormatError,
    },

    #[error("{stage} stage is blocked by {} validation error(s)", .errors.len())]
    Blocked {
        stage: Stage,
        errors: Vec<ValidationError>,
    },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("failed to commit result")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WizardError {
    /// Validation errors carried by a blocked transition.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Blocked { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Computes the next state for `event` without touching the outside world.
pub fn transition(
    state: &WizardState,
    event: WizardEvent,
    config: &CommitConfig,
) -> Result<Transition, WizardError> {
    if state.stage == Stage::Committed {
        return Err(WizardError::Committed(state.draft_id.clone()));
    }

    match event {
        WizardEvent::Advance => advance(state, config),
        WizardEvent::GoBack(to) => {
            if to >= state.stage {
                return Err(WizardError::InvalidBack {
                    from: state.stage,
                    to,
                });
            }
            let mut next = state.clone();
            next.stage = to;
            Ok(Transition {
                effects: vec![Effect::FlushAutosave(Box::new(next.clone()))],
                state: next,
            })
        }
        edit => {
            if edit.owning_stage() != Some(state.stage) {
                return Err(WizardError::WrongStage {
                    stage: state.stage,
                    event: edit.name(),
                });
            }
            let mut next = state.clone();
            apply_edit(&mut next, edit)?;
            Ok(Transition {
                state: next,
                effects: vec![Effect::ScheduleAutosave],
            })
        }
    }
}

fn apply_edit(state: &mut WizardState, event: WizardEvent) -> Result<(), WizardError> {
    match event {
        WizardEvent::SelectCompetition(competition) => state.competition = Some(competition),
        WizardEvent::SetRecordedOn(date) => state.recorded_on = Some(date),
        WizardEvent::SelectSwimmer(swimmer) => state.swimmer = Some(swimmer),
        WizardEvent::SelectEvent(event) => state.event = Some(event),
        WizardEvent::SelectPhase(phase) => state.phase = Some(phase),
        WizardEvent::UpsertSegment(input) => {
            let segments = &mut state.form_mut().segments;
            match segments.iter_mut().find(|s| s.index == input.index) {
                Some(existing) => *existing = input,
                None => segments.push(input),
            }
            segments.sort_by_key(|s| s.index);
        }
        WizardEvent::RemoveSegment(index) => {
            let segments = &mut state.form_mut().segments;
            let before = segments.len();
            segments.retain(|s| s.index != index);
            if segments.len() == before {
                return Err(WizardError::UnknownSegment(index));
            }
        }
        WizardEvent::SetGlobalTime(raw) => {
            let parsed = parse_field("global time", &raw)?;
            state.form_mut().global_time = Some(parsed);
        }
        WizardEvent::SetTime15m(raw) => {
            let parsed = raw
                .map(|raw| parse_field("15 m time", &raw))
                .transpose()?;
            state.form_mut().time_15m = parsed;
        }
        WizardEvent::Advance | WizardEvent::GoBack(_) => {}
    }
    Ok(())
}

fn parse_field(field: &'static str, raw: &str) -> Result<Time, WizardError> {
    time::parse(raw).map_err(|source| WizardError::Format { field, source })
}

fn advance(state: &WizardState, config: &CommitConfig) -> Result<Transition, WizardError> {
    let errors = validate_stage(state);
    if !errors.is_empty() {
        tracing::debug!(stage = %state.stage, errors = errors.len(), "stage gate blocked");
        return Err(WizardError::Blocked {
            stage: state.stage,
            errors,
        });
    }

    if state.stage == Stage::Segments {
        return commit(state, config);
    }

    let mut next = state.clone();
    next.stage = state.stage.next();
    if next.stage == Stage::Segments && next.form.is_none() {
        next.form = Some(SegmentForm::default());
    }
    tracing::debug!(from = %state.stage, to = %next.stage, "stage advanced");
    Ok(Transition {
        effects: vec![Effect::FlushAutosave(Box::new(next.clone()))],
        state: next,
    })
}

fn commit(state: &WizardState, config: &CommitConfig) -> Result<Transition, WizardError> {
    let (draft, recorded_on, category) = snapshot(state)?;
    let result = CommittedResult::build(
        state.draft_id.clone(),
        draft,
        recorded_on,
        category,
        config,
    )?;

    let mut next = state.clone();
    next.stage = Stage::Committed;
    next.committed = Some(Box::new(result.clone()));
    Ok(Transition {
        state: next,
        effects: vec![
            Effect::FlushAutosave(Box::new(state.clone())),
            Effect::Commit(Box::new(result)),
        ],
    })
}

/// Freezes the state into an owned draft for aggregation.
fn snapshot(state: &WizardState) -> Result<(ResultDraft, NaiveDate, AgeCategory), WizardError> {
    let blocked = |error| WizardError::Blocked {
        stage: state.stage,
        errors: vec![error],
    };
    let competition = state
        .competition
        .as_ref()
        .ok_or_else(|| blocked(ValidationError::MissingCompetition))?;
    let swimmer = state
        .swimmer
        .as_ref()
        .ok_or_else(|| blocked(ValidationError::MissingSwimmer))?;
    let event = state
        .event
        .as_ref()
        .ok_or_else(|| blocked(ValidationError::MissingEvent))?;
    let phase = state
        .phase
        .ok_or_else(|| blocked(ValidationError::MissingPhase))?;
    let form = state
        .form
        .as_ref()
        .ok_or_else(|| blocked(ValidationError::NoSegments))?;
    let global_time = form
        .global_time
        .ok_or_else(|| blocked(ValidationError::MissingGlobalTime))?;
    let segments = segment::validate_all(&form.segments).map_err(|errors| WizardError::Blocked {
        stage: state.stage,
        errors,
    })?;

    let recorded_on = state.recorded_on.unwrap_or(competition.start_date);
    let draft = ResultDraft {
        competition_id: competition.id.clone(),
        swimmer_id: swimmer.id.clone(),
        event_id: event.id.clone(),
        phase,
        segments,
        global_time,
        time_15m: form.time_15m,
    };
    Ok((
        draft,
        recorded_on,
        AgeCategory::on_date(swimmer.birth_date, recorded_on),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventStyle;
    use crate::types::{CompetitionId, Course, EventId, Style, SwimmerId, ValidationStatus};

    pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(super) fn competition() -> Competition {
        Competition {
            id: CompetitionId::new("spring-open").unwrap(),
            name: "Spring Open".into(),
            course: Course::Long,
            start_date: date(2025, 3, 14),
            end_date: date(2025, 3, 16),
            venue: None,
        }
    }

    pub(super) fn swimmer() -> Swimmer {
        Swimmer {
            id: SwimmerId::new("ana").unwrap(),
            full_name: "Ana Ruiz".into(),
            birth_date: date(2011, 6, 1),
        }
    }

    pub(super) fn event(style: EventStyle, distance_m: u32) -> RaceEvent {
        RaceEvent {
            id: EventId::new(format!("{distance_m}-{style}-lc").to_lowercase()).unwrap(),
            style,
            distance_m,
            course: Course::Long,
        }
    }

    pub(super) fn segment(index: i64, style: Style, time: &str) -> SegmentInput {
        SegmentInput {
            index,
            style,
            distance_m: 50,
            time: time.into(),
            stroke_count: 20,
            streamline_m: 6.0,
        }
    }

    fn step(state: &WizardState, event: WizardEvent) -> WizardState {
        transition(state, event, &CommitConfig::default())
            .unwrap()
            .state
    }

    /// A state sitting in the segments stage of a 100 m free.
    pub(super) fn at_segments() -> WizardState {
        let mut state = WizardState::new(DraftId::new("draft-1").unwrap());
        state = step(&state, WizardEvent::SelectCompetition(competition()));
        state = step(&state, WizardEvent::Advance);
        state = step(&state, WizardEvent::SelectSwimmer(swimmer()));
        state = step(&state, WizardEvent::Advance);
        state = step(&state, WizardEvent::SelectEvent(event(EventStyle::Free, 100)));
        state = step(&state, WizardEvent::SelectPhase(Phase::Final));
        step(&state, WizardEvent::Advance)
    }

    #[test]
    fn walks_all_stages_to_commit() {
        let mut state = at_segments();
        assert_eq!(state.stage, Stage::Segments);
        assert_eq!(state.form, Some(SegmentForm::default()));

        state = step(&state, WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.00")));
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::SetGlobalTime("1:00.20".into()));

        let outcome = transition(&state, WizardEvent::Advance, &CommitConfig::default()).unwrap();
        assert_eq!(outcome.state.stage, Stage::Committed);
        let [Effect::FlushAutosave(saved), Effect::Commit(result)] = outcome.effects.as_slice()
        else {
            panic!("unexpected effects: {:?}", outcome.effects);
        };
        assert_eq!(saved.stage, Stage::Segments);
        assert_eq!(result.aggregate.sum_of_splits, Time::from_centis(6000));
        assert_eq!(result.aggregate.deviation_cs, -20);
        assert_eq!(result.status, ValidationStatus::Valid);
        assert_eq!(result.recorded_on, date(2025, 3, 14));
        assert_eq!(result.category, AgeCategory::Age13To14);
        assert_eq!(result.draft.segments[0].index, 1);
    }

    #[test]
    fn negative_distance_blocks_commit() {
        let mut state = at_segments();
        let mut bad = segment(1, Style::Free, "00:29.00");
        bad.distance_m = -50;
        state = step(&state, WizardEvent::UpsertSegment(bad));
        state = step(&state, WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.00")));
        state = step(&state, WizardEvent::SetGlobalTime("01:00.00".into()));

        let err = transition(&state, WizardEvent::Advance, &CommitConfig::default()).unwrap_err();
        assert!(matches!(err, WizardError::Blocked { stage: Stage::Segments, .. }));
        assert!(!err.validation_errors().is_empty());
        assert!(err.validation_errors().contains(&ValidationError::NonPositiveDistance {
            segment: 1,
            value: -50
        }));
    }

    #[test]
    fn review_flag_does_not_block_commit() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.45")));
        state = step(&state, WizardEvent::SetGlobalTime("01:00.00".into()));

        let outcome = transition(&state, WizardEvent::Advance, &CommitConfig::default()).unwrap();
        let committed = outcome.state.committed.unwrap();
        assert!(committed.aggregate.requires_review);
        assert_eq!(committed.status, ValidationStatus::Review);
    }

    #[test]
    fn empty_stages_report_every_missing_field() {
        let state = WizardState::new(DraftId::new("d").unwrap());
        assert_eq!(validate_stage(&state), vec![ValidationError::MissingCompetition]);

        let mut at_event = state;
        at_event.stage = Stage::Event;
        assert_eq!(
            validate_stage(&at_event),
            vec![ValidationError::MissingEvent, ValidationError::MissingPhase]
        );

        let mut at_segments = at_event;
        at_segments.stage = Stage::Segments;
        assert_eq!(
            validate_stage(&at_segments),
            vec![
                ValidationError::NoSegments,
                ValidationError::MissingEvent,
                ValidationError::MissingGlobalTime
            ]
        );
    }

    #[test]
    fn recording_date_must_fall_inside_competition() {
        let mut state = WizardState::new(DraftId::new("d").unwrap());
        state = step(&state, WizardEvent::SelectCompetition(competition()));
        state = step(&state, WizardEvent::SetRecordedOn(date(2025, 3, 17)));
        assert_eq!(
            validate_stage(&state),
            vec![ValidationError::RecordedOutsideRange {
                date: date(2025, 3, 17),
                start: date(2025, 3, 14),
                end: date(2025, 3, 16),
            }]
        );
    }

    #[test]
    fn inverted_competition_dates_are_rejected() {
        let mut broken = competition();
        broken.start_date = date(2025, 3, 20);
        broken.name = "  ".into();
        let mut state = WizardState::new(DraftId::new("d").unwrap());
        state = step(&state, WizardEvent::SelectCompetition(broken));
        assert_eq!(validate_stage(&state).len(), 2);
    }

    #[test]
    fn course_must_match_competition() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::GoBack(Stage::Event));
        let mut short = event(EventStyle::Free, 100);
        short.course = Course::Short;
        state = step(&state, WizardEvent::SelectEvent(short));
        assert_eq!(
            validate_stage(&state),
            vec![ValidationError::CourseMismatch {
                event: Course::Short,
                competition: Course::Long
            }]
        );
    }

    #[test]
    fn segment_layout_must_match_event() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::UpsertSegment(segment(3, Style::Free, "00:31.00")));
        let mut long_lap = segment(4, Style::Free, "00:31.00");
        long_lap.distance_m = 100;
        state = step(&state, WizardEvent::UpsertSegment(long_lap));
        state = step(&state, WizardEvent::SetGlobalTime("01:31.00".into()));
        state = step(&state, WizardEvent::SetTime15m(Some("00:06.10".into())));

        assert_eq!(
            validate_stage(&state),
            vec![
                ValidationError::NonContiguousIndices {
                    indices: vec![1, 3, 4],
                    expected: 3
                },
                ValidationError::SegmentCountMismatch {
                    expected: 2,
                    actual: 3
                },
                ValidationError::LapDistanceMismatch {
                    segment: 4,
                    expected: 50,
                    actual: 100
                },
                ValidationError::Time15mNotAllowed { distance: 100 },
            ]
        );

        let rendered: Vec<String> = validate_stage(&state).iter().map(ToString::to_string).collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        segment indices must run 1..=3 without gaps or duplicates, got [1, 3, 4]
        expected 2 segments for this event, got 3
        segment 4: distance must be 50 m for this course, got 100 m
        a 15 m time is only allowed for 50 m events, this event is 100 m
        ");
    }

    #[test]
    fn medley_requires_stroke_order() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::GoBack(Stage::Event));
        state = step(&state, WizardEvent::SelectEvent(event(EventStyle::Medley, 200)));
        state = step(&state, WizardEvent::Advance);
        for (index, style) in [(1, Style::Fly), (2, Style::Breast), (3, Style::Back), (4, Style::Free)] {
            state = step(&state, WizardEvent::UpsertSegment(segment(index, style, "00:35.00")));
        }
        state = step(&state, WizardEvent::SetGlobalTime("02:20.00".into()));

        assert_eq!(
            validate_stage(&state),
            vec![
                ValidationError::MedleyOrder {
                    segment: 2,
                    expected: Style::Back,
                    actual: Style::Breast
                },
                ValidationError::MedleyOrder {
                    segment: 3,
                    expected: Style::Breast,
                    actual: Style::Back
                },
            ]
        );
    }

    #[test]
    fn going_back_keeps_later_data() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::GoBack(Stage::Context));
        assert_eq!(state.stage, Stage::Context);
        assert!(state.swimmer.is_some());

        state = step(&state, WizardEvent::Advance);
        state = step(&state, WizardEvent::Advance);
        state = step(&state, WizardEvent::Advance);
        assert_eq!(state.stage, Stage::Segments);
        assert_eq!(state.form.unwrap().segments.len(), 1);
    }

    #[test]
    fn back_must_target_an_earlier_stage() {
        let state = at_segments();
        let err = transition(&state, WizardEvent::GoBack(Stage::Segments), &CommitConfig::default())
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidBack { .. }));
    }

    #[test]
    fn edits_outside_their_stage_are_rejected() {
        let state = at_segments();
        let err = transition(
            &state,
            WizardEvent::SelectSwimmer(swimmer()),
            &CommitConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "cannot select swimmer during the segments stage");
    }

    #[test]
    fn bad_time_is_reported_inline_and_state_kept() {
        let state = at_segments();
        let err = transition(
            &state,
            WizardEvent::SetGlobalTime("1:75.00".into()),
            &CommitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WizardError::Format { field: "global time", .. }));
        assert_eq!(state.form.unwrap().global_time, None);
    }

    #[test]
    fn padded_time_is_not_trimmed() {
        let state = at_segments();
        let err = transition(
            &state,
            WizardEvent::SetGlobalTime(" 01:02.03 ".into()),
            &CommitConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WizardError::Format { field: "global time", .. }));
    }

    #[test]
    fn upsert_replaces_and_remove_deletes() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:28.50")));
        assert_eq!(state.form.as_ref().unwrap().segments.len(), 1);
        assert_eq!(state.form.as_ref().unwrap().segments[0].time, "00:28.50");

        state = step(&state, WizardEvent::RemoveSegment(1));
        assert!(state.form.as_ref().unwrap().segments.is_empty());
        let err = transition(&state, WizardEvent::RemoveSegment(1), &CommitConfig::default())
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownSegment(1)));
    }

    #[test]
    fn committed_is_terminal() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::UpsertSegment(segment(2, Style::Free, "00:31.00")));
        state = step(&state, WizardEvent::SetGlobalTime("01:00.00".into()));
        state = step(&state, WizardEvent::Advance);

        for event in [WizardEvent::Advance, WizardEvent::GoBack(Stage::Context)] {
            let err = transition(&state, event, &CommitConfig::default()).unwrap_err();
            assert!(matches!(err, WizardError::Committed(_)));
        }
    }

    #[test]
    fn edits_schedule_autosave_and_stage_changes_flush() {
        let state = WizardState::new(DraftId::new("d").unwrap());
        let edit = transition(
            &state,
            WizardEvent::SelectCompetition(competition()),
            &CommitConfig::default(),
        )
        .unwrap();
        assert_eq!(edit.effects, vec![Effect::ScheduleAutosave]);

        let advance = transition(&edit.state, WizardEvent::Advance, &CommitConfig::default()).unwrap();
        assert_eq!(
            advance.effects,
            vec![Effect::FlushAutosave(Box::new(advance.state.clone()))]
        );
    }

    #[test]
    fn state_survives_serde() {
        let mut state = at_segments();
        state = step(&state, WizardEvent::UpsertSegment(segment(1, Style::Free, "00:29.00")));
        state = step(&state, WizardEvent::SetGlobalTime("01:00.00".into()));
        let json = serde_json::to_string(&state).unwrap();
        let parsed: WizardState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
