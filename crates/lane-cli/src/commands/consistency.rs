//! Consistency command: variability of a set of times.

use std::io::Write;

use anyhow::{Context, Result};
use lane_core::{ConsistencyConfig, consistency};

use super::render;

pub fn run<W: Write>(
    writer: &mut W,
    raw_times: &[String],
    json: bool,
    config: &ConsistencyConfig,
) -> Result<()> {
    let times = raw_times
        .iter()
        .map(|raw| lane_core::time::parse(raw).with_context(|| format!("cannot parse time {raw:?}")))
        .collect::<Result<Vec<_>>>()?;
    let report = consistency::analyze_with(&times, config)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        render::write_consistency(writer, &report)?;
    }
    Ok(())
}
