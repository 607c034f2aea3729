//! Shared database fixtures for command tests.

use chrono::NaiveDate;
use lane_core::{
    AgeCategory, CommitConfig, CommittedResult, Competition, CompetitionId, Course, DraftId,
    EventId, EventStyle, Phase, RaceEvent, ResultDraft, Segment, Style, Swimmer, SwimmerId, Time,
};
use lane_db::Database;

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

/// In-memory database holding `spring-open`, `ana` and `100-free-lc`.
pub fn seeded_database() -> Database {
    let mut db = Database::open_in_memory().unwrap();
    db.upsert_competition(&Competition {
        id: CompetitionId::new("spring-open").unwrap(),
        name: "Spring Open".into(),
        course: Course::Long,
        start_date: date(14),
        end_date: date(16),
        venue: None,
    })
    .unwrap();
    db.upsert_swimmer(&Swimmer {
        id: SwimmerId::new("ana").unwrap(),
        full_name: "Ana Ruiz".into(),
        birth_date: NaiveDate::from_ymd_opt(2011, 6, 1).unwrap(),
    })
    .unwrap();
    db.upsert_race_event(&RaceEvent {
        id: EventId::new("100-free-lc").unwrap(),
        style: EventStyle::Free,
        distance_m: 100,
        course: Course::Long,
    })
    .unwrap();
    db
}

/// A 100 m free final for `ana` with 22 strokes and 7.5 m streamline per lap.
pub fn committed(draft_id: &str, day: u32, splits: [u32; 2], global_cs: u32) -> CommittedResult {
    let draft = ResultDraft {
        competition_id: CompetitionId::new("spring-open").unwrap(),
        swimmer_id: SwimmerId::new("ana").unwrap(),
        event_id: EventId::new("100-free-lc").unwrap(),
        phase: Phase::Final,
        segments: splits
            .iter()
            .zip(1..)
            .map(|(&cs, index)| Segment {
                index,
                style: Style::Free,
                distance_m: 50,
                time: Time::from_centis(cs),
                stroke_count: 22,
                streamline_m: 7.5,
            })
            .collect(),
        global_time: Time::from_centis(global_cs),
        time_15m: None,
    };
    CommittedResult::build(
        DraftId::new(draft_id).unwrap(),
        draft,
        date(day),
        AgeCategory::Age13To14,
        &CommitConfig::default(),
    )
    .unwrap()
}

/// Seeded database with two results: 01:00.00 on day 14, 00:59.30 on day 15.
pub fn database_with_history() -> Database {
    let mut db = seeded_database();
    db.commit_result(&committed("d1", 14, [2900, 3100], 6000))
        .unwrap();
    db.commit_result(&committed("d2", 15, [2880, 3050], 5930))
        .unwrap();
    db
}
