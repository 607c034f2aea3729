//! Status command: database location, row counts and open drafts.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use lane_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.counts()?;
    let drafts = db.list_drafts()?;

    writeln!(writer, "Lane status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(
        writer,
        "Catalog: {} competition(s), {} swimmer(s), {} event(s)",
        counts.competitions, counts.swimmers, counts.race_events
    )?;
    writeln!(writer, "Results: {}", counts.results)?;

    if drafts.is_empty() {
        writeln!(writer, "No open drafts.")?;
        return Ok(());
    }

    writeln!(writer, "Open drafts:")?;
    for draft in drafts {
        writeln!(
            writer,
            "- {} at {} (saved {})",
            draft.id, draft.stage, draft.updated_at
        )?;
    }
    Ok(())
}
