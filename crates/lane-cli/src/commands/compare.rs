//! Compare command: split-by-split difference between two results.

use std::io::Write;

use anyhow::{Result, anyhow};
use lane_core::analytics::{self, MoreRecent};
use lane_core::{CommittedResult, ResultId};
use lane_db::Database;

fn load(db: &Database, id: ResultId) -> Result<CommittedResult> {
    db.load_result(id)?.ok_or_else(|| anyhow!("result {id} not found"))
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    first: ResultId,
    second: ResultId,
    json: bool,
) -> Result<()> {
    let a = load(db, first)?;
    let b = load(db, second)?;
    let comparison = analytics::compare(&a, &b)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&comparison)?)?;
        return Ok(());
    }

    let verdict = match comparison.global_delta_cs.signum() {
        -1 => "faster",
        1 => "slower",
        _ => "unchanged",
    };
    writeln!(
        writer,
        "Result {first} ({}) -> result {second} ({})",
        a.recorded_on, b.recorded_on
    )?;
    writeln!(
        writer,
        "Global:  {} -> {}  {} ({:+.2}%) {verdict}",
        a.draft.global_time,
        b.draft.global_time,
        comparison.global_delta,
        comparison.global_delta_percent
    )?;
    writeln!(
        writer,
        "{:>3}  {:>8}  {:>8}  {:>9}  {:>7}  {:>10}",
        "#", "First", "Second", "Delta", "Strokes", "Streamline"
    )?;
    for delta in &comparison.segments {
        writeln!(
            writer,
            "{:>3}  {:>8}  {:>8}  {:>9}  {:>+7}  {:>+10.1}",
            delta.index,
            delta.first.to_string(),
            delta.second.to_string(),
            delta.delta,
            delta.stroke_delta,
            delta.streamline_delta_m
        )?;
    }
    writeln!(
        writer,
        "Splits faster: {}, slower: {}",
        comparison.improved_segments, comparison.regressed_segments
    )?;
    let latest = match comparison.more_recent {
        MoreRecent::First => first,
        MoreRecent::Second => second,
    };
    writeln!(writer, "Most recent: result {latest}")?;
    Ok(())
}
