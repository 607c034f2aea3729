//! History command: one swimmer's results in one event, with pacing trends.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use lane_core::{
    ConsistencyConfig, ConsistencyReport, EventId, Phase, ReferenceData, ResultDraft, ResultId,
    SegmentAverage, SwimmerId, Time, ValidationStatus, consistency, segment_averages,
};
use lane_db::Database;
use serde::Serialize;

use super::render;

#[derive(Debug, Serialize)]
struct HistoryEntry {
    id: ResultId,
    recorded_on: NaiveDate,
    phase: Phase,
    global_time: Time,
    status: ValidationStatus,
}

/// Mean values of one split index plus how much that split varied.
#[derive(Debug, Serialize)]
struct SplitTrend {
    #[serde(flatten)]
    average: SegmentAverage,
    cv_percent: f64,
}

#[derive(Debug, Serialize)]
struct HistoryReport {
    swimmer_id: SwimmerId,
    event_id: EventId,
    results: Vec<HistoryEntry>,
    /// Present once there are two or more results.
    consistency: Option<ConsistencyReport>,
    segment_averages: Vec<SplitTrend>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    swimmer: &str,
    event: &str,
    json: bool,
    config: &ConsistencyConfig,
) -> Result<()> {
    let swimmer_id = SwimmerId::new(swimmer)?;
    let event_id = EventId::new(event)?;
    let swimmer = db
        .swimmer(&swimmer_id)?
        .ok_or_else(|| anyhow!("unknown swimmer {swimmer_id}"))?;
    let event = db
        .race_event(&event_id)?
        .ok_or_else(|| anyhow!("unknown event {event_id}"))?;

    let results = db.results_for(&swimmer_id, &event_id)?;
    let times = db.global_times_for(&swimmer_id, &event_id)?;
    let consistency = if times.len() >= 2 {
        Some(consistency::analyze_with(&times, config)?)
    } else {
        None
    };
    let drafts: Vec<ResultDraft> = results.iter().map(|(_, r)| r.draft.clone()).collect();
    let averages = split_trends(&drafts, config)?;
    tracing::debug!(results = results.len(), "loaded history");

    let entries: Vec<HistoryEntry> = results
        .iter()
        .map(|(id, result)| HistoryEntry {
            id: *id,
            recorded_on: result.recorded_on,
            phase: result.draft.phase,
            global_time: result.draft.global_time,
            status: result.status,
        })
        .collect();

    if json {
        let report = HistoryReport {
            swimmer_id,
            event_id,
            results: entries,
            consistency,
            segment_averages: averages,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "History of {} in {}", swimmer.full_name, event.name())?;
    if entries.is_empty() {
        writeln!(writer, "No results recorded.")?;
        return Ok(());
    }
    for entry in &entries {
        writeln!(
            writer,
            "  #{}  {}  {}  {}  {}",
            entry.id, entry.recorded_on, entry.phase, entry.global_time, entry.status
        )?;
    }
    if let Some(report) = &consistency {
        render::write_consistency(writer, report)?;
    }

    writeln!(writer, "Split averages:")?;
    writeln!(
        writer,
        "{:>3}  {:>9}  {:>7}  {:>10}  {:>7}  {:>6}",
        "#", "Mean time", "Strokes", "Streamline", "Samples", "CV %"
    )?;
    for SplitTrend {
        average,
        cv_percent,
    } in &averages
    {
        writeln!(
            writer,
            "{:>3}  {:>9}  {:>7.1}  {:>10.1}  {:>7}  {:>6.2}",
            average.index,
            average.mean_time.to_string(),
            average.mean_strokes,
            average.mean_streamline_m,
            average.samples,
            cv_percent
        )?;
    }
    Ok(())
}

/// Averages each split index and grades its variability across results.
fn split_trends(drafts: &[ResultDraft], config: &ConsistencyConfig) -> Result<Vec<SplitTrend>> {
    let mut split_times: BTreeMap<u32, Vec<Time>> = BTreeMap::new();
    for segment in drafts.iter().flat_map(|d| &d.segments) {
        split_times.entry(segment.index).or_default().push(segment.time);
    }
    let histories: Vec<Vec<Time>> = split_times.into_values().collect();
    let reports = consistency::analyze_batch(&histories, config);

    // Both sides are keyed by split index in ascending order.
    segment_averages(drafts)
        .into_iter()
        .zip(reports)
        .map(|(average, report)| -> Result<SplitTrend> {
            Ok(SplitTrend {
                average,
                cv_percent: report?.cv_percent,
            })
        })
        .collect()
}
