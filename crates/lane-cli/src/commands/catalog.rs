//! Catalog command: reference data import and listing.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use lane_core::{Competition, RaceEvent, Swimmer};
use lane_db::Database;
use serde::Deserialize;

/// Reference data file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub competitions: Vec<Competition>,
    pub swimmers: Vec<Swimmer>,
    pub events: Vec<RaceEvent>,
}

impl CatalogFile {
    fn check(&self) -> Result<()> {
        for competition in &self.competitions {
            if competition.start_date > competition.end_date {
                bail!(
                    "competition {} ends ({}) before it starts ({})",
                    competition.id,
                    competition.end_date,
                    competition.start_date
                );
            }
        }
        for event in &self.events {
            if event.distance_m == 0 || event.distance_m % event.lap_length() != 0 {
                bail!(
                    "event {} distance {} m is not a whole number of {} m laps",
                    event.id,
                    event.distance_m,
                    event.lap_length()
                );
            }
        }
        Ok(())
    }
}

pub fn import<W: Write>(writer: &mut W, db: &mut Database, path: &Path) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let catalog: CatalogFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    catalog.check()?;

    db.import_catalog(&catalog.competitions, &catalog.swimmers, &catalog.events)?;
    tracing::info!(
        competitions = catalog.competitions.len(),
        swimmers = catalog.swimmers.len(),
        events = catalog.events.len(),
        "catalog imported"
    );

    writeln!(
        writer,
        "Imported {} competition(s), {} swimmer(s), {} event(s)",
        catalog.competitions.len(),
        catalog.swimmers.len(),
        catalog.events.len()
    )?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    writeln!(writer, "Competitions:")?;
    for c in db.list_competitions()? {
        writeln!(
            writer,
            "  {:<16} {} ({}, {} to {})",
            c.id.as_str(),
            c.name,
            c.course,
            c.start_date,
            c.end_date
        )?;
    }
    writeln!(writer, "Swimmers:")?;
    for s in db.list_swimmers()? {
        writeln!(writer, "  {:<16} {} (born {})", s.id.as_str(), s.full_name, s.birth_date)?;
    }
    writeln!(writer, "Events:")?;
    for e in db.list_race_events()? {
        writeln!(writer, "  {:<16} {}", e.id.as_str(), e.name())?;
    }
    Ok(())
}
