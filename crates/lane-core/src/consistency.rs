//! Variability statistics over a set of comparable times.
//!
//! Uses population statistics: `variance = Σ(t - mean)² / n`.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::Time;

/// Configuration for consistency scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Ascending CV upper bounds (percent) for Elite, Competitive, Developing
    /// and Problematic. Anything above the last bound is Critical.
    /// Default: `[2.0, 4.0, 6.0, 8.0]`.
    pub breakpoints: [f64; 4],

    /// Points deducted from 100 per CV percentage point.
    /// Default: 10.0.
    pub score_weight: f64,

    /// Times further than this many standard deviations from the mean are
    /// outliers.
    /// Default: 1.5.
    pub outlier_sigma: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            breakpoints: [2.0, 4.0, 6.0, 8.0],
            score_weight: 10.0,
            outlier_sigma: 1.5,
        }
    }
}

impl ConsistencyConfig {
    /// Checks that the grade breakpoints are strictly ascending.
    pub fn validate(&self) -> Result<(), ConsistencyConfigError> {
        if self.breakpoints.windows(2).all(|pair| pair[0] < pair[1]) {
            Ok(())
        } else {
            Err(ConsistencyConfigError::BreakpointsNotAscending {
                breakpoints: self.breakpoints,
            })
        }
    }
}

/// A consistency configuration that cannot grade times sensibly.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConsistencyConfigError {
    #[error("consistency breakpoints must be strictly ascending, got {breakpoints:?}")]
    BreakpointsNotAscending { breakpoints: [f64; 4] },
}

/// Consistency grade derived from the coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Elite,
    Competitive,
    Developing,
    Problematic,
    Critical,
}

impl Grade {
    const ASCENDING: [Self; 4] = [
        Self::Elite,
        Self::Competitive,
        Self::Developing,
        Self::Problematic,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Elite => "Elite",
            Self::Competitive => "Competitive",
            Self::Developing => "Developing",
            Self::Problematic => "Problematic",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("cannot analyze an empty set of times")]
    Empty,
}

/// Variability statistics for a set of times (all in centiseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub samples: usize,
    pub mean_cs: f64,
    pub stdev_cs: f64,
    /// Coefficient of variation in percent.
    pub cv_percent: f64,
    pub grade: Grade,
    pub score: f64,
    /// Positions (0-based, input order) of outlying times.
    pub outliers: Vec<usize>,
}

/// Grades a coefficient of variation: first breakpoint it does not exceed wins.
pub fn classify(cv_percent: f64, config: &ConsistencyConfig) -> Grade {
    Grade::ASCENDING
        .into_iter()
        .zip(config.breakpoints)
        .find(|(_, limit)| cv_percent <= *limit)
        .map_or(Grade::Critical, |(grade, _)| grade)
}

/// Analyzes times with the default configuration.
pub fn analyze(times: &[Time]) -> Result<ConsistencyReport, ConsistencyError> {
    analyze_with(times, &ConsistencyConfig::default())
}

pub fn analyze_with(
    times: &[Time],
    config: &ConsistencyConfig,
) -> Result<ConsistencyReport, ConsistencyError> {
    if times.is_empty() {
        return Err(ConsistencyError::Empty);
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below 2^52"
    )]
    let n = times.len() as f64;
    let values: Vec<f64> = times.iter().map(|t| f64::from(t.centis())).collect();

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    let cv_percent = if mean > 0.0 { stdev / mean * 100.0 } else { 0.0 };
    let score = config.score_weight.mul_add(-cv_percent, 100.0).max(0.0);

    let threshold = config.outlier_sigma * stdev;
    let outliers = values
        .iter()
        .enumerate()
        .filter(|(_, v)| (*v - mean).abs() > threshold)
        .map(|(i, _)| i)
        .collect();

    let grade = classify(cv_percent, config);
    tracing::debug!(samples = times.len(), mean, stdev, cv_percent, %grade, "analyzed consistency");

    Ok(ConsistencyReport {
        samples: times.len(),
        mean_cs: mean,
        stdev_cs: stdev,
        cv_percent,
        grade,
        score,
        outliers,
    })
}

/// Analyzes many independent histories in parallel, preserving order.
pub fn analyze_batch(
    histories: &[Vec<Time>],
    config: &ConsistencyConfig,
) -> Vec<Result<ConsistencyReport, ConsistencyError>> {
    histories
        .par_iter()
        .map(|times| analyze_with(times, config))
        .collect()
}
