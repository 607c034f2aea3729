//! Committed results handed to the persistence collaborator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, AggregationConfig, ResultAggregate, ResultDraft, StructuralError};
use crate::catalog::AgeCategory;
use crate::consistency::{self, ConsistencyConfig, ConsistencyReport};
use crate::types::{DraftId, ValidationStatus};

/// An immutable, fully validated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedResult {
    pub draft_id: DraftId,
    pub draft: ResultDraft,
    pub aggregate: ResultAggregate,
    /// `review` when the split sum deviates beyond tolerance. Does not block commit.
    pub status: ValidationStatus,
    pub category: AgeCategory,
    pub recorded_on: NaiveDate,
    /// Pacing consistency across this result's own splits (two or more).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_consistency: Option<ConsistencyReport>,
}

/// Settings applied when a capture is committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    pub aggregation: AggregationConfig,
    pub consistency: ConsistencyConfig,
}

impl CommittedResult {
    /// Aggregates an owned snapshot of a draft into a committed result.
    pub fn build(
        draft_id: DraftId,
        draft: ResultDraft,
        recorded_on: NaiveDate,
        category: AgeCategory,
        config: &CommitConfig,
    ) -> Result<Self, StructuralError> {
        let aggregate = aggregate::compute_with(&draft, &config.aggregation)?;
        let split_consistency = if draft.segments.len() >= 2 {
            let times: Vec<_> = aggregate.splits.iter().map(|s| s.time).collect();
            consistency::analyze_with(&times, &config.consistency).ok()
        } else {
            None
        };
        Ok(Self {
            draft_id,
            status: ValidationStatus::from_review_flag(aggregate.requires_review),
            draft,
            aggregate,
            category,
            recorded_on,
            split_consistency,
        })
    }
}
