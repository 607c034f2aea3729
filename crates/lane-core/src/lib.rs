//! Core domain logic for swim result capture.
//!
//! This crate contains the fundamental types and logic for:
//! - Times: centisecond values and their `MM:SS.CC` wire form
//! - Segments: per-split validation that reports every violation at once
//! - Aggregation: race totals, split metrics and the review check
//! - Consistency: variability statistics over comparable times
//! - The capture wizard: a four-stage state machine with debounced autosave

pub mod aggregate;
pub mod analytics;
pub mod catalog;
pub mod consistency;
pub mod record;
pub mod segment;
pub mod time;
pub mod types;
pub mod wizard;

pub use aggregate::{
    AggregationConfig, DomainWarning, ResultAggregate, ResultDraft, SplitMetrics, StructuralError,
};
pub use analytics::{
    CompareError, Comparison, Ranked, SegmentAverage, compare, rank_by_time, segment_averages,
    split_averages,
};
pub use catalog::{AgeCategory, Competition, EventStyle, RaceEvent, ReferenceData, Swimmer};
pub use consistency::{
    ConsistencyConfig, ConsistencyConfigError, ConsistencyError, ConsistencyReport, Grade,
};
pub use record::{CommitConfig, CommittedResult};
pub use segment::{Segment, SegmentInput};
pub use time::{DomainError, FormatError, Time};
pub use types::{
    CompetitionId, Course, DraftId, EventId, Phase, ResultId, Style, SwimmerId, ValidationError,
    ValidationStatus,
};
pub use wizard::{
    CaptureWizard, ResultStore, SaveFailure, Scheduler, Stage, SystemScheduler, VirtualScheduler,
    WizardError, WizardEvent, WizardState,
};
