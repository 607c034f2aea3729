//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lane_core::{CompetitionId, Course, EventId, EventStyle, Phase, SwimmerId};
use lane_db::ResultFilter;

/// Swim result capture.
///
/// Captures race results split by split, checks them against the global time
/// and reports pacing consistency.
#[derive(Debug, Parser)]
#[command(name = "lane", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert between `MM:SS.CC` and centiseconds.
    Time {
        #[command(subcommand)]
        action: TimeAction,
    },

    /// Validate and aggregate a standalone draft file.
    Check {
        /// JSON draft with segments and a global time.
        file: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Report consistency over a set of times.
    Consistency {
        /// Times as `MM:SS.CC`.
        #[arg(required = true)]
        times: Vec<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage reference data.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Run a capture script through the wizard.
    Capture {
        /// JSON array of wizard steps.
        script: PathBuf,

        /// Resume (or name) a draft instead of starting a fresh one.
        #[arg(long)]
        draft_id: Option<String>,
    },

    /// List committed results.
    Results {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare two results of the same swimmer and event.
    Compare {
        first: i64,
        second: i64,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a swimmer's history in one event.
    History {
        #[arg(long)]
        swimmer: String,

        #[arg(long)]
        event: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Average every split across the squad, one table per event.
    Averages {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank the fastest results by global time.
    Top {
        #[command(flatten)]
        filter: FilterArgs,

        /// Number of places to show.
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show database location, row counts and open drafts.
    Status,
}

/// Narrows team-wide reports. Every filter is optional.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub event: Option<EventId>,

    /// Event stroke: Free, Back, Breast, Fly or Medley.
    #[arg(long)]
    pub style: Option<EventStyle>,

    /// Event distance in metres.
    #[arg(long)]
    pub distance: Option<u32>,

    /// Pool length: SC or LC.
    #[arg(long)]
    pub course: Option<Course>,

    #[arg(long)]
    pub swimmer: Option<SwimmerId>,

    #[arg(long)]
    pub competition: Option<CompetitionId>,

    /// Preliminary, Semifinal or Final.
    #[arg(long)]
    pub phase: Option<Phase>,

    /// First recording date (inclusive).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last recording date (inclusive).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ResultFilter {
        ResultFilter {
            event_id: self.event.clone(),
            style: self.style,
            distance_m: self.distance,
            course: self.course,
            swimmer_id: self.swimmer.clone(),
            competition_id: self.competition.clone(),
            phase: self.phase,
            from: self.from,
            to: self.to,
        }
    }
}

/// Time conversions.
#[derive(Debug, Subcommand)]
pub enum TimeAction {
    /// Parse `M:SS.CC` or `MM:SS.CC` into centiseconds.
    Parse { value: String },

    /// Format centiseconds as `MM:SS.CC`.
    Format {
        #[arg(allow_negative_numbers = true)]
        centiseconds: i64,
    },
}

/// Reference data actions.
#[derive(Debug, Subcommand)]
pub enum CatalogAction {
    /// Load competitions, swimmers and events from a JSON file.
    Import { file: PathBuf },

    /// List reference data.
    List,
}
