//! Check command: validate and aggregate a draft file without storing it.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use lane_core::{
    CommitConfig, CompetitionId, ConsistencyReport, EventId, Phase, ResultAggregate, ResultDraft,
    SegmentInput, SwimmerId, ValidationStatus, aggregate, consistency, segment,
};
use serde::{Deserialize, Serialize};

use super::render;

/// A draft as written by hand or exported by another tool.
#[derive(Debug, Deserialize)]
pub struct DraftFile {
    pub competition_id: CompetitionId,
    pub swimmer_id: SwimmerId,
    pub event_id: EventId,
    pub phase: Phase,
    pub global_time: String,
    #[serde(default)]
    pub time_15m: Option<String>,
    pub segments: Vec<SegmentInput>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    status: ValidationStatus,
    aggregate: &'a ResultAggregate,
    split_consistency: Option<&'a ConsistencyReport>,
}

pub fn run<W: Write>(writer: &mut W, path: &Path, json: bool, config: &CommitConfig) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: DraftFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let global_time = lane_core::time::parse(&file.global_time).context("invalid global time")?;
    let time_15m = file
        .time_15m
        .as_deref()
        .map(lane_core::time::parse)
        .transpose()
        .context("invalid 15 m time")?;

    let segments = match segment::validate_all(&file.segments) {
        Ok(segments) => segments,
        Err(errors) => {
            render::write_validation_errors(writer, &errors)?;
            bail!("{} has {} validation error(s)", path.display(), errors.len());
        }
    };

    let draft = ResultDraft {
        competition_id: file.competition_id,
        swimmer_id: file.swimmer_id,
        event_id: file.event_id,
        phase: file.phase,
        segments,
        global_time,
        time_15m,
    };
    let aggregate = aggregate::compute_with(&draft, &config.aggregation)
        .context("segments do not form a complete race")?;
    let split_times: Vec<_> = aggregate.splits.iter().map(|s| s.time).collect();
    let split_consistency = if split_times.len() >= 2 {
        consistency::analyze_with(&split_times, &config.consistency).ok()
    } else {
        None
    };
    let status = ValidationStatus::from_review_flag(aggregate.requires_review);

    if json {
        let report = CheckReport {
            status,
            aggregate: &aggregate,
            split_consistency: split_consistency.as_ref(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Checked {} segment(s): {status}",
        draft.segments.len()
    )?;
    render::write_aggregate(writer, &aggregate, draft.global_time)?;
    if let Some(report) = &split_consistency {
        render::write_consistency(writer, report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use tempfile::TempDir;

    use super::*;

    fn write_draft(dir: &TempDir, segments: &str, global_time: &str) -> std::path::PathBuf {
        let path = dir.path().join("draft.json");
        let content = format!(
            r#"{{
                "competition_id": "spring-open",
                "swimmer_id": "ana",
                "event_id": "100-free-lc",
                "phase": "Final",
                "global_time": "{global_time}",
                "segments": {segments}
            }}"#
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    const SEGMENTS: &str = r#"[
        {"index": 1, "style": "Free", "distance_m": 50, "time": "00:29.00", "stroke_count": 20, "streamline_m": 6.0},
        {"index": 2, "style": "Free", "distance_m": 50, "time": "00:31.00", "stroke_count": 25, "streamline_m": 5.0}
    ]"#;

    #[test]
    fn check_outputs_aggregate_and_consistency() {
        let dir = TempDir::new().unwrap();
        let path = write_draft(&dir, SEGMENTS, "01:00.20");

        let mut output = Vec::new();
        run(&mut output, &path, false, &CommitConfig::default()).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output, @r"
        Checked 2 segment(s): valid
          #     Split     m/s   Swim m  m/stroke
          1  00:29.00    1.72     44.0      2.20
          2  00:31.00    1.61     45.0      1.80

        Sum of splits: 01:00.00
        Global time:   01:00.20
        Deviation:     -00:00.20 (ok)
        Distance:      100 m (89.0 m swum, 11.0 m streamline)
        Strokes:       45
        Velocity:      1.66 m/s
        Per stroke:    1.98
        Consistency:   Competitive (score 66.7, CV 3.33%, n=2)
        Mean / stdev:  3000.00 cs / 100.00 cs
        ");
    }

    #[test]
    fn check_flags_review_in_json() {
        let dir = TempDir::new().unwrap();
        let path = write_draft(&dir, SEGMENTS, "00:59.55");

        let mut output = Vec::new();
        run(&mut output, &path, true, &CommitConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["status"], "review");
        assert_eq!(value["aggregate"]["deviation_cs"], 45);
        assert_eq!(value["aggregate"]["sum_of_splits"], "01:00.00");
    }

    #[test]
    fn check_lists_every_segment_error() {
        let dir = TempDir::new().unwrap();
        let segments = r#"[
            {"index": 1, "style": "Free", "distance_m": -50, "time": "00:29.00"},
            {"index": 2, "style": "Free", "distance_m": 50, "time": "0:61.00", "stroke_count": -1}
        ]"#;
        let path = write_draft(&dir, segments, "01:00.00");

        let mut output = Vec::new();
        let err = run(&mut output, &path, false, &CommitConfig::default()).unwrap_err();
        assert!(err.to_string().ends_with("has 3 validation error(s)"));
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("3 validation error(s):\n"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn check_rejects_gapped_indices() {
        let dir = TempDir::new().unwrap();
        let segments = r#"[
            {"index": 1, "style": "Free", "distance_m": 50, "time": "00:29.00"},
            {"index": 3, "style": "Free", "distance_m": 50, "time": "00:31.00"}
        ]"#;
        let path = write_draft(&dir, segments, "01:00.00");

        let mut output = Vec::new();
        let err = run(&mut output, &path, false, &CommitConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "segments do not form a complete race");
    }
}
