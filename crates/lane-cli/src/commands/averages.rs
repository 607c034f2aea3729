//! Averages command: squad-wide split averages, one table per event.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use lane_core::{EventId, Segment, SegmentAverage, split_averages};
use lane_db::{Database, ResultFilter};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct EventAverages {
    event_id: EventId,
    segments: Vec<SegmentAverage>,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    filter: &ResultFilter,
    json: bool,
) -> Result<()> {
    let mut by_event: BTreeMap<EventId, Vec<Segment>> = BTreeMap::new();
    for (event_id, segment) in db.segments_matching(filter)? {
        by_event.entry(event_id).or_default().push(segment);
    }
    let report: Vec<EventAverages> = by_event
        .into_iter()
        .map(|(event_id, segments)| EventAverages {
            event_id,
            segments: split_averages(&segments),
        })
        .collect();
    tracing::debug!(events = report.len(), "computed split averages");

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    if report.is_empty() {
        writeln!(writer, "No results match.")?;
        return Ok(());
    }

    for (n, event) in report.iter().enumerate() {
        if n > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", event.event_id)?;
        writeln!(
            writer,
            "{:>3}  {:>9}  {:>7}  {:>10}  {:>6}  {:>7}",
            "#", "Mean time", "Strokes", "Streamline", "Swim m", "Samples"
        )?;
        for average in &event.segments {
            writeln!(
                writer,
                "{:>3}  {:>9}  {:>7.1}  {:>10.1}  {:>6.1}  {:>7}",
                average.index,
                average.mean_time.to_string(),
                average.mean_strokes,
                average.mean_streamline_m,
                average.mean_swim_distance_m,
                average.samples
            )?;
        }
    }
    Ok(())
}
