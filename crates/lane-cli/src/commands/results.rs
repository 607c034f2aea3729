//! Results command: list committed results.

use std::io::Write;

use anyhow::Result;
use lane_core::time;
use lane_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let results = db.list_results()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&results)?)?;
        return Ok(());
    }

    if results.is_empty() {
        writeln!(writer, "No results recorded.")?;
        return Ok(());
    }

    for result in &results {
        writeln!(
            writer,
            "#{}  {}  {}  {} {}  {} ({}, {})",
            result.id,
            result.recorded_on,
            result.swimmer_name,
            result.event_id,
            result.phase,
            result.global_time,
            time::format_signed(result.deviation_cs),
            result.status
        )?;
    }
    Ok(())
}
