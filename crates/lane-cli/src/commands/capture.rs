//! Capture command: drives the wizard from a script of steps.
//!
//! A script is a JSON array; each entry is one user action, e.g.
//! `{"action": "competition", "id": "spring-open"}` or `{"action": "advance"}`.
//! Drafts are autosaved to the database, so a failed script can be fixed and
//! resumed with `--draft-id`.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use lane_core::wizard::{CaptureWizard, Stage, SystemScheduler, WizardEvent, WizardState};
use lane_core::{CompetitionId, DraftId, EventId, Phase, ReferenceData, SegmentInput, SwimmerId};
use lane_db::Database;
use serde::Deserialize;
use uuid::Uuid;

use super::render;
use crate::Config;

/// One scripted user action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Competition { id: CompetitionId },
    RecordedOn { date: NaiveDate },
    Swimmer { id: SwimmerId },
    Event { id: EventId },
    Phase { phase: Phase },
    Segment(SegmentInput),
    RemoveSegment { index: i64 },
    GlobalTime { time: String },
    #[serde(rename = "time_15m")]
    Time15m {
        #[serde(default)]
        time: Option<String>,
    },
    Advance,
    Back { stage: Stage },
}

impl Step {
    const fn action(&self) -> &'static str {
        match self {
            Self::Competition { .. } => "competition",
            Self::RecordedOn { .. } => "recorded_on",
            Self::Swimmer { .. } => "swimmer",
            Self::Event { .. } => "event",
            Self::Phase { .. } => "phase",
            Self::Segment(_) => "segment",
            Self::RemoveSegment { .. } => "remove_segment",
            Self::GlobalTime { .. } => "global_time",
            Self::Time15m { .. } => "time_15m",
            Self::Advance => "advance",
            Self::Back { .. } => "back",
        }
    }

    /// Looks up referenced records and turns the step into a wizard event.
    fn resolve<R>(self, reference: &R) -> Result<WizardEvent>
    where
        R: ReferenceData,
    {
        Ok(match self {
            Self::Competition { id } => WizardEvent::SelectCompetition(
                reference
                    .competition(&id)?
                    .ok_or_else(|| anyhow!("unknown competition {id}"))?,
            ),
            Self::Swimmer { id } => WizardEvent::SelectSwimmer(
                reference
                    .swimmer(&id)?
                    .ok_or_else(|| anyhow!("unknown swimmer {id}"))?,
            ),
            Self::Event { id } => WizardEvent::SelectEvent(
                reference
                    .race_event(&id)?
                    .ok_or_else(|| anyhow!("unknown event {id}"))?,
            ),
            Self::RecordedOn { date } => WizardEvent::SetRecordedOn(date),
            Self::Phase { phase } => WizardEvent::SelectPhase(phase),
            Self::Segment(input) => WizardEvent::UpsertSegment(input),
            Self::RemoveSegment { index } => WizardEvent::RemoveSegment(index),
            Self::GlobalTime { time } => WizardEvent::SetGlobalTime(time),
            Self::Time15m { time } => WizardEvent::SetTime15m(time),
            Self::Advance => WizardEvent::Advance,
            Self::Back { stage } => WizardEvent::GoBack(stage),
        })
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    script: &Path,
    draft_id: Option<&str>,
    config: &Config,
) -> Result<()> {
    let content = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", script.display()))?;

    let mut events = Vec::with_capacity(steps.len());
    for (n, step) in steps.into_iter().enumerate() {
        let action = step.action();
        let event = step
            .resolve(&*db)
            .with_context(|| format!("step {} ({action})", n + 1))?;
        events.push((action, event));
    }

    let draft_id = match draft_id {
        Some(id) => DraftId::new(id)?,
        None => DraftId::new(Uuid::new_v4().to_string())?,
    };
    let state = db
        .load_draft(&draft_id)?
        .unwrap_or_else(|| WizardState::new(draft_id.clone()));
    if state.stage != Stage::Context {
        writeln!(writer, "Resuming draft {draft_id} at stage {}", state.stage)?;
    }

    let mut wizard = CaptureWizard::resume(
        state,
        &mut *db,
        SystemScheduler::new(),
        config.autosave_debounce(),
        config.commit_config(),
    );

    for (n, (action, event)) in events.into_iter().enumerate() {
        if let Err(err) = wizard.dispatch(event) {
            writeln!(writer, "Step {} ({action}) rejected: {err}", n + 1)?;
            let errors = err.validation_errors();
            if !errors.is_empty() {
                render::write_validation_errors(writer, errors)?;
            }
            for failure in wizard.close() {
                writeln!(writer, "Warning: autosave failed: {}", failure.message)?;
            }
            writeln!(writer, "Draft {draft_id} kept; fix the script and resume with --draft-id")?;
            bail!("capture stopped at step {}", n + 1);
        }
        wizard.poll();
    }

    let stage = wizard.stage();
    let committed = wizard.committed().cloned();
    let result_id = wizard.result_id();
    for failure in wizard.close() {
        writeln!(writer, "Warning: autosave failed: {}", failure.message)?;
    }

    match (committed, result_id) {
        (Some(result), Some(id)) => {
            writeln!(
                writer,
                "Committed draft {draft_id} as result {id} ({}, category {})",
                result.status, result.category
            )?;
            render::write_aggregate(writer, &result.aggregate, result.draft.global_time)?;
            if let Some(report) = &result.split_consistency {
                render::write_consistency(writer, report)?;
            }
        }
        _ => writeln!(writer, "Draft {draft_id} saved at stage {stage}")?,
    }
    Ok(())
}
