//! Comparisons between results, per-segment averages and time rankings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::ResultDraft;
use crate::record::CommittedResult;
use crate::segment::Segment;
use crate::time::{self, Time};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("results belong to different swimmers ({first} and {second})")]
    DifferentSwimmer { first: String, second: String },

    #[error("results belong to different events ({first} and {second})")]
    DifferentEvent { first: String, second: String },
}

/// Which of the two compared results was recorded later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoreRecent {
    First,
    Second,
}

/// Difference between the same split of two results (`second - first`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDelta {
    pub index: u32,
    pub first: Time,
    pub second: Time,
    pub delta_cs: i64,
    /// Signed `+MM:SS.CC` form of `delta_cs`.
    pub delta: String,
    pub stroke_delta: i64,
    pub streamline_delta_m: f64,
    pub improved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub global_delta_cs: i64,
    pub global_delta: String,
    /// Relative to the first result's global time.
    pub global_delta_percent: f64,
    /// The second result is faster.
    pub improved: bool,
    pub more_recent: MoreRecent,
    pub segments: Vec<SegmentDelta>,
    pub improved_segments: usize,
    pub regressed_segments: usize,
}

/// Compares two results of the same swimmer in the same event.
///
/// Only split indices present in both results are compared.
pub fn compare(
    first: &CommittedResult,
    second: &CommittedResult,
) -> Result<Comparison, CompareError> {
    let (a, b) = (&first.draft, &second.draft);
    if a.swimmer_id != b.swimmer_id {
        return Err(CompareError::DifferentSwimmer {
            first: a.swimmer_id.to_string(),
            second: b.swimmer_id.to_string(),
        });
    }
    if a.event_id != b.event_id {
        return Err(CompareError::DifferentEvent {
            first: a.event_id.to_string(),
            second: b.event_id.to_string(),
        });
    }

    let global_delta_cs = signed_delta(a.global_time, b.global_time);
    let global_delta_percent = if a.global_time == Time::ZERO {
        0.0
    } else {
        #[expect(
            clippy::cast_precision_loss,
            reason = "centisecond deltas are far below 2^52"
        )]
        let delta = global_delta_cs as f64;
        delta / f64::from(a.global_time.centis()) * 100.0
    };

    let second_by_index: BTreeMap<u32, _> = b.segments.iter().map(|s| (s.index, s)).collect();
    let mut segments: Vec<SegmentDelta> = a
        .segments
        .iter()
        .filter_map(|s1| {
            let s2 = second_by_index.get(&s1.index)?;
            let delta_cs = signed_delta(s1.time, s2.time);
            Some(SegmentDelta {
                index: s1.index,
                first: s1.time,
                second: s2.time,
                delta_cs,
                delta: time::format_signed(delta_cs),
                stroke_delta: i64::from(s2.stroke_count) - i64::from(s1.stroke_count),
                streamline_delta_m: s2.streamline_m - s1.streamline_m,
                improved: delta_cs < 0,
            })
        })
        .collect();
    segments.sort_by_key(|d| d.index);

    let improved_segments = segments.iter().filter(|d| d.delta_cs < 0).count();
    let regressed_segments = segments.iter().filter(|d| d.delta_cs > 0).count();

    // Ties on the date go to the second result, matching input order.
    let more_recent = if first.recorded_on > second.recorded_on {
        MoreRecent::First
    } else {
        MoreRecent::Second
    };

    Ok(Comparison {
        global_delta_cs,
        global_delta: time::format_signed(global_delta_cs),
        global_delta_percent,
        improved: global_delta_cs < 0,
        more_recent,
        segments,
        improved_segments,
        regressed_segments,
    })
}

fn signed_delta(from: Time, to: Time) -> i64 {
    i64::from(to.centis()) - i64::from(from.centis())
}

/// Mean values of one split index across many results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAverage {
    pub index: u32,
    /// Rounded to the nearest centisecond.
    pub mean_time: Time,
    pub mean_strokes: f64,
    pub mean_streamline_m: f64,
    pub mean_swim_distance_m: f64,
    pub samples: usize,
}

#[derive(Default)]
struct Totals {
    time_cs: u64,
    strokes: u64,
    streamline_m: f64,
    swim_distance_m: f64,
    samples: usize,
}

/// Averages each split index across `drafts`, ordered by index.
pub fn segment_averages(drafts: &[ResultDraft]) -> Vec<SegmentAverage> {
    split_averages(drafts.iter().flat_map(|d| &d.segments))
}

/// Averages loose segments by split index, e.g. every split a squad swam
/// in one event.
pub fn split_averages<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Vec<SegmentAverage> {
    let mut by_index: BTreeMap<u32, Totals> = BTreeMap::new();
    for segment in segments {
        let totals = by_index.entry(segment.index).or_default();
        totals.time_cs += u64::from(segment.time.centis());
        totals.strokes += u64::from(segment.stroke_count);
        totals.streamline_m += segment.streamline_m;
        totals.swim_distance_m += segment.swim_distance_m();
        totals.samples += 1;
    }

    by_index
        .into_iter()
        .map(|(index, totals)| {
            #[expect(
                clippy::cast_precision_loss,
                reason = "sums of centiseconds and strokes are far below 2^52"
            )]
            let (n, time_cs, strokes) = (
                totals.samples as f64,
                totals.time_cs as f64,
                totals.strokes as f64,
            );
            SegmentAverage {
                index,
                mean_time: Time::from_seconds(time_cs / n / 100.0).unwrap_or_default(),
                mean_strokes: strokes / n,
                mean_streamline_m: totals.streamline_m / n,
                mean_swim_distance_m: totals.swim_distance_m / n,
                samples: totals.samples,
            }
        })
        .collect()
}

/// An entry's position in a time ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: T,
}

/// Orders `entries` fastest first and keeps the first `limit`.
///
/// Equal times share the rank of the first of them (1, 2, 2, 4) and keep
/// their input order.
pub fn rank_by_time<T, F>(
    entries: impl IntoIterator<Item = T>,
    time_of: F,
    limit: usize,
) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> Time,
{
    let mut entries: Vec<T> = entries.into_iter().collect();
    entries.sort_by_key(&time_of);

    let mut ranked = Vec::with_capacity(limit.min(entries.len()));
    let mut previous = None;
    let mut rank = 0;
    for (position, entry) in entries.into_iter().take(limit).enumerate() {
        let time = time_of(&entry);
        if previous != Some(time) {
            rank = position + 1;
            previous = Some(time);
        }
        ranked.push(Ranked { rank, entry });
    }
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::catalog::AgeCategory;
    use crate::record::CommitConfig;
    use crate::types::{CompetitionId, DraftId, EventId, Phase, Style, SwimmerId};

    fn draft(swimmer: &str, event: &str, splits: &[(u32, u32)], global_cs: u32) -> ResultDraft {
        ResultDraft {
            competition_id: CompetitionId::new("c1").unwrap(),
            swimmer_id: SwimmerId::new(swimmer).unwrap(),
            event_id: EventId::new(event).unwrap(),
            phase: Phase::Final,
            segments: splits
                .iter()
                .zip(1..)
                .map(|(&(cs, strokes), index)| Segment {
                    index,
                    style: Style::Free,
                    distance_m: 50,
                    time: Time::from_centis(cs),
                    stroke_count: strokes,
                    streamline_m: 6.0,
                })
                .collect(),
            global_time: Time::from_centis(global_cs),
            time_15m: None,
        }
    }

    fn committed(d: ResultDraft, day: u32) -> CommittedResult {
        CommittedResult::build(
            DraftId::new(format!("d{day}")).unwrap(),
            d,
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            AgeCategory::Open,
            &CommitConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn compares_global_and_split_times() {
        let first = committed(draft("s1", "100-free", &[(2900, 20), (3100, 24)], 6000), 1);
        let second = committed(draft("s1", "100-free", &[(2850, 21), (3150, 24)], 5950), 5);

        let cmp = compare(&first, &second).unwrap();
        assert_eq!(cmp.global_delta_cs, -50);
        assert_eq!(cmp.global_delta, "-00:00.50");
        assert!(cmp.improved);
        assert_eq!(cmp.more_recent, MoreRecent::Second);
        assert!((cmp.global_delta_percent + 50.0 / 60.0).abs() < 1e-9);

        assert_eq!(cmp.segments.len(), 2);
        assert_eq!(cmp.segments[0].delta, "-00:00.50");
        assert_eq!(cmp.segments[0].stroke_delta, 1);
        assert!(cmp.segments[0].improved);
        assert_eq!(cmp.segments[1].delta, "+00:00.50");
        assert_eq!(cmp.improved_segments, 1);
        assert_eq!(cmp.regressed_segments, 1);
    }

    #[test]
    fn unchanged_split_is_neither_improved_nor_regressed() {
        let first = committed(draft("s1", "50-free", &[(2900, 20)], 2900), 1);
        let second = committed(draft("s1", "50-free", &[(2900, 20)], 2900), 1);
        let cmp = compare(&first, &second).unwrap();
        assert_eq!(cmp.segments[0].delta, "00:00.00");
        assert_eq!(cmp.improved_segments, 0);
        assert_eq!(cmp.regressed_segments, 0);
    }

    #[test]
    fn refuses_different_swimmers_or_events() {
        let base = committed(draft("s1", "100-free", &[(2900, 20)], 2900), 1);
        let other_swimmer = committed(draft("s2", "100-free", &[(2900, 20)], 2900), 1);
        let other_event = committed(draft("s1", "100-back", &[(2900, 20)], 2900), 1);
        assert!(matches!(
            compare(&base, &other_swimmer),
            Err(CompareError::DifferentSwimmer { .. })
        ));
        assert!(matches!(
            compare(&base, &other_event),
            Err(CompareError::DifferentEvent { .. })
        ));
    }

    #[test]
    fn averages_each_split_index() {
        let drafts = vec![
            draft("s1", "100-free", &[(2900, 20), (3100, 24)], 6000),
            draft("s2", "100-free", &[(2801, 22), (3000, 26)], 5801),
            draft("s3", "50-free", &[(2700, 18)], 2700),
        ];
        let averages = segment_averages(&drafts);
        assert_eq!(averages.len(), 2);

        assert_eq!(averages[0].index, 1);
        assert_eq!(averages[0].samples, 3);
        assert_eq!(averages[0].mean_time, Time::from_centis(2800));
        assert!((averages[0].mean_strokes - 20.0).abs() < 1e-9);
        assert!((averages[0].mean_swim_distance_m - 44.0).abs() < 1e-9);

        assert_eq!(averages[1].samples, 2);
        assert_eq!(averages[1].mean_time, Time::from_centis(3050));
    }

    #[test]
    fn split_averages_accept_segments_from_many_swimmers() {
        let squad = [
            draft("s1", "100-free", &[(2900, 20), (3100, 24)], 6000),
            draft("s2", "100-free", &[(3000, 22), (3200, 26)], 6200),
        ];
        let averages = split_averages(squad.iter().flat_map(|d| &d.segments));
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].mean_time, Time::from_centis(2950));
        assert_eq!(averages[1].mean_time, Time::from_centis(3150));
        assert!((averages[1].mean_strokes - 25.0).abs() < 1e-9);
        assert_eq!(averages[1].samples, 2);

        assert!(split_averages(std::iter::empty()).is_empty());
    }

    #[test]
    fn ranking_shares_places_on_equal_times() {
        let swims = [("ana", 6100), ("bea", 5990), ("cris", 6100), ("dana", 6300), ("eva", 5900)];
        let ranked = rank_by_time(swims, |&(_, cs)| Time::from_centis(cs), 4);
        let places: Vec<_> = ranked.iter().map(|r| (r.rank, r.entry.0)).collect();
        assert_eq!(places, vec![(1, "eva"), (2, "bea"), (3, "ana"), (3, "cris")]);
    }

    #[test]
    fn ranking_serializes_entry_fields_inline() {
        #[derive(Serialize)]
        struct Entry {
            swimmer: &'static str,
            time: Time,
        }
        let ranked = rank_by_time(
            [Entry { swimmer: "ana", time: Time::from_centis(5930) }],
            |e| e.time,
            5,
        );
        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"rank": 1, "swimmer": "ana", "time": "00:59.30"}])
        );
    }
}
