//! Top command: fastest committed results by global time.

use std::io::Write;

use anyhow::Result;
use lane_core::rank_by_time;
use lane_db::{Database, ResultFilter};

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    filter: &ResultFilter,
    limit: usize,
    json: bool,
) -> Result<()> {
    let results = db.results_matching(filter)?;
    let ranking = rank_by_time(results, |r| r.global_time, limit);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&ranking)?)?;
        return Ok(());
    }

    if ranking.is_empty() {
        writeln!(writer, "No results match.")?;
        return Ok(());
    }

    for place in &ranking {
        let result = &place.entry;
        writeln!(
            writer,
            "{}. {}  {}  {} {}  {}  {}",
            place.rank,
            result.global_time,
            result.swimmer_name,
            result.event_id,
            result.phase,
            result.competition_name,
            result.recorded_on
        )?;
    }
    Ok(())
}
