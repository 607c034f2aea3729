//! Time command: conversions between `MM:SS.CC` and centiseconds.

use std::io::Write;

use anyhow::{Context, Result};
use lane_core::Time;

pub fn parse<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let time = lane_core::time::parse(value)
        .with_context(|| format!("cannot parse time {value:?}"))?;
    writeln!(writer, "{}", time.centis())?;
    Ok(())
}

pub fn format<W: Write>(writer: &mut W, centiseconds: i64) -> Result<()> {
    let time = Time::try_from_centis(centiseconds)
        .with_context(|| format!("cannot format {centiseconds} centiseconds"))?;
    writeln!(writer, "{time}")?;
    Ok(())
}
