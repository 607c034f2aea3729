//! Human-readable blocks shared by several commands.

use std::io::{self, Write};

use lane_core::time;
use lane_core::{ConsistencyReport, ResultAggregate, Time, ValidationError};

pub fn write_validation_errors<W: Write>(
    writer: &mut W,
    errors: &[ValidationError],
) -> io::Result<()> {
    writeln!(writer, "{} validation error(s):", errors.len())?;
    for error in errors {
        writeln!(writer, "  - {error}")?;
    }
    Ok(())
}

fn per_stroke(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |m| format!("{m:.2}"))
}

pub fn write_aggregate<W: Write>(
    writer: &mut W,
    aggregate: &ResultAggregate,
    global_time: Time,
) -> io::Result<()> {
    writeln!(
        writer,
        "{:>3}  {:>8}  {:>6}  {:>7}  {:>8}",
        "#", "Split", "m/s", "Swim m", "m/stroke"
    )?;
    for split in &aggregate.splits {
        writeln!(
            writer,
            "{:>3}  {:>8}  {:>6.2}  {:>7.1}  {:>8}",
            split.index,
            split.time.to_string(),
            split.velocity_mps,
            split.swim_distance_m,
            per_stroke(split.distance_per_stroke_m),
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "Sum of splits: {}", aggregate.sum_of_splits)?;
    writeln!(writer, "Global time:   {global_time}")?;
    writeln!(
        writer,
        "Deviation:     {} ({})",
        time::format_signed(aggregate.deviation_cs),
        if aggregate.requires_review {
            "review"
        } else {
            "ok"
        }
    )?;
    writeln!(
        writer,
        "Distance:      {} m ({:.1} m swum, {:.1} m streamline)",
        aggregate.total_distance_m, aggregate.total_swim_distance_m, aggregate.total_streamline_m
    )?;
    writeln!(writer, "Strokes:       {}", aggregate.total_strokes)?;
    writeln!(
        writer,
        "Velocity:      {:.2} m/s",
        aggregate.average_velocity_mps
    )?;
    writeln!(
        writer,
        "Per stroke:    {}",
        per_stroke(aggregate.distance_per_stroke_m)
    )?;
    for warning in &aggregate.warnings {
        writeln!(writer, "Warning: {warning}")?;
    }
    Ok(())
}

pub fn write_consistency<W: Write>(writer: &mut W, report: &ConsistencyReport) -> io::Result<()> {
    writeln!(
        writer,
        "Consistency:   {} (score {:.1}, CV {:.2}%, n={})",
        report.grade, report.score, report.cv_percent, report.samples
    )?;
    writeln!(
        writer,
        "Mean / stdev:  {:.2} cs / {:.2} cs",
        report.mean_cs, report.stdev_cs
    )?;
    if !report.outliers.is_empty() {
        let positions: Vec<String> = report.outliers.iter().map(|i| (i + 1).to_string()).collect();
        writeln!(writer, "Outliers:      #{}", positions.join(", #"))?;
    }
    Ok(())
}
