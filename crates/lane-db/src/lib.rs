//! Storage layer for swim result capture.
//!
//! Provides persistence for reference data, in-progress drafts and committed
//! results using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can move between threads but must not be shared without a `Mutex`.
//!
//! # Schema
//!
//! Dates are stored as TEXT `YYYY-MM-DD`; timestamps as RFC 3339 UTC with
//! millisecond precision. Times are INTEGER centiseconds.
//!
//! Drafts and results keep their full JSON snapshot in a `data` column next to
//! the summary columns used for filtering and ordering. Segments are stored
//! relationally as well so split-level queries do not need to parse JSON.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, SecondsFormat, Utc};
use lane_core::wizard::{ResultStore, WizardState};
use lane_core::{
    CommittedResult, Competition, CompetitionId, Course, DraftId, EventId, EventStyle, Phase,
    RaceEvent, ReferenceData, ResultId, Segment, Swimmer, SwimmerId, Time, ValidationStatus,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value could not be decoded.
    #[error("invalid {table} row {id}: {message}")]
    InvalidData {
        table: &'static str,
        id: String,
        message: String,
    },
    /// A snapshot could not be encoded as JSON.
    #[error("failed to encode {what}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The same swimmer already has a result for this event, phase and day.
    #[error(
        "result already recorded for swimmer {swimmer_id} in event {event_id} ({phase}) at {competition_id} on {recorded_on}"
    )]
    DuplicateResult {
        swimmer_id: SwimmerId,
        competition_id: CompetitionId,
        event_id: EventId,
        phase: Phase,
        recorded_on: NaiveDate,
    },
    /// The draft was already committed as another result.
    #[error("draft {draft_id} was already committed as result {result_id}")]
    DraftAlreadyCommitted { draft_id: DraftId, result_id: ResultId },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Listing entry for a saved draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSummary {
    pub id: String,
    pub stage: String,
    pub updated_at: String,
}

/// Listing entry for a committed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub id: ResultId,
    pub competition_id: String,
    pub swimmer_id: String,
    pub swimmer_name: String,
    pub competition_name: String,
    pub event_id: String,
    pub phase: Phase,
    pub recorded_on: NaiveDate,
    pub global_time: Time,
    pub deviation_cs: i64,
    pub status: ValidationStatus,
}

/// Narrows team-wide queries over committed results.
///
/// Unset fields match everything; set fields must all match. Date bounds
/// are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub event_id: Option<EventId>,
    pub style: Option<EventStyle>,
    pub distance_m: Option<u32>,
    pub course: Option<Course>,
    pub swimmer_id: Option<SwimmerId>,
    pub competition_id: Option<CompetitionId>,
    pub phase: Option<Phase>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ResultFilter {
    /// SQL conditions over `results r` joined with `race_events e`.
    fn conditions(&self) -> (String, Vec<Value>) {
        let from = self.from.map(|date| date.to_string());
        let to = self.to.map(|date| date.to_string());
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        let mut text = |clause: &'static str, value: Option<&str>| {
            if let Some(value) = value {
                clauses.push(clause);
                values.push(Value::Text(value.to_string()));
            }
        };
        text("r.event_id = ?", self.event_id.as_ref().map(EventId::as_str));
        text("e.style = ?", self.style.as_ref().map(EventStyle::as_str));
        text("e.course = ?", self.course.as_ref().map(Course::as_str));
        text("r.swimmer_id = ?", self.swimmer_id.as_ref().map(SwimmerId::as_str));
        text(
            "r.competition_id = ?",
            self.competition_id.as_ref().map(CompetitionId::as_str),
        );
        text("r.phase = ?", self.phase.as_ref().map(Phase::as_str));
        text("r.recorded_on >= ?", from.as_deref());
        text("r.recorded_on <= ?", to.as_deref());
        if let Some(distance) = self.distance_m {
            clauses.push("e.distance_m = ?");
            values.push(Value::Integer(i64::from(distance)));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub competitions: i64,
    pub swimmers: i64,
    pub race_events: i64,
    pub drafts: i64,
    pub results: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS competitions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                course TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                venue TEXT
            );

            CREATE TABLE IF NOT EXISTS swimmers (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                birth_date TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS race_events (
                id TEXT PRIMARY KEY,
                style TEXT NOT NULL,
                distance_m INTEGER NOT NULL,
                course TEXT NOT NULL
            );

            -- Drafts: autosaved wizard snapshots, removed on commit
            -- data: JSON-encoded wizard state
            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                stage TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_drafts_updated ON drafts(updated_at);

            -- Results: one row per committed capture
            -- data: JSON-encoded committed result including the aggregate
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                draft_id TEXT NOT NULL UNIQUE,
                competition_id TEXT NOT NULL,
                swimmer_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                phase TEXT NOT NULL,
                recorded_on TEXT NOT NULL,
                global_time_cs INTEGER NOT NULL,
                sum_of_splits_cs INTEGER NOT NULL,
                deviation_cs INTEGER NOT NULL,
                status TEXT NOT NULL,
                category TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (swimmer_id, competition_id, event_id, phase, recorded_on),
                FOREIGN KEY (competition_id) REFERENCES competitions(id),
                FOREIGN KEY (swimmer_id) REFERENCES swimmers(id),
                FOREIGN KEY (event_id) REFERENCES race_events(id)
            );

            CREATE INDEX IF NOT EXISTS idx_results_history ON results(swimmer_id, event_id, recorded_on);

            CREATE TABLE IF NOT EXISTS segments (
                result_id INTEGER NOT NULL,
                idx INTEGER NOT NULL,
                style TEXT NOT NULL,
                distance_m INTEGER NOT NULL,
                time_cs INTEGER NOT NULL,
                stroke_count INTEGER NOT NULL,
                streamline_m REAL NOT NULL,
                PRIMARY KEY (result_id, idx),
                FOREIGN KEY (result_id) REFERENCES results(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts or updates a competition.
    pub fn upsert_competition(&mut self, competition: &Competition) -> Result<(), DbError> {
        upsert_competition(&self.conn, competition)
    }

    /// Inserts or updates a swimmer.
    pub fn upsert_swimmer(&mut self, swimmer: &Swimmer) -> Result<(), DbError> {
        upsert_swimmer(&self.conn, swimmer)
    }

    /// Inserts or updates a catalog event.
    pub fn upsert_race_event(&mut self, event: &RaceEvent) -> Result<(), DbError> {
        upsert_race_event(&self.conn, event)
    }

    /// Upserts a whole catalog in one transaction: if any record fails,
    /// none of them are written.
    pub fn import_catalog(
        &mut self,
        competitions: &[Competition],
        swimmers: &[Swimmer],
        events: &[RaceEvent],
    ) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        for competition in competitions {
            upsert_competition(&tx, competition)?;
        }
        for swimmer in swimmers {
            upsert_swimmer(&tx, swimmer)?;
        }
        for event in events {
            upsert_race_event(&tx, event)?;
        }
        tx.commit()?;
        tracing::debug!(
            competitions = competitions.len(),
            swimmers = swimmers.len(),
            events = events.len(),
            "catalog imported"
        );
        Ok(())
    }

    /// Lists competitions, most recent first.
    pub fn list_competitions(&self) -> Result<Vec<Competition>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, course, start_date, end_date, venue
            FROM competitions
            ORDER BY start_date DESC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], CompetitionRow::from_row)?;
        let mut competitions = Vec::new();
        for row in rows {
            competitions.push(row?.into_competition()?);
        }
        Ok(competitions)
    }

    /// Lists swimmers ordered by name.
    pub fn list_swimmers(&self) -> Result<Vec<Swimmer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, birth_date FROM swimmers ORDER BY full_name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], SwimmerRow::from_row)?;
        let mut swimmers = Vec::new();
        for row in rows {
            swimmers.push(row?.into_swimmer()?);
        }
        Ok(swimmers)
    }

    /// Lists catalog events ordered by ID.
    pub fn list_race_events(&self) -> Result<Vec<RaceEvent>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, style, distance_m, course FROM race_events ORDER BY id ASC")?;
        let rows = stmt.query_map([], EventRow::from_row)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Writes the latest snapshot of a draft, replacing any earlier one.
    pub fn save_draft(&mut self, state: &WizardState) -> Result<(), DbError> {
        let data = serde_json::to_string(state).map_err(|source| DbError::Encode {
            what: "draft",
            source,
        })?;
        self.conn.execute(
            "
            INSERT INTO drafts (id, stage, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                stage = excluded.stage,
                data = excluded.data,
                updated_at = excluded.updated_at
            ",
            params![
                state.draft_id.as_str(),
                state.stage.as_str(),
                data,
                now_timestamp(),
            ],
        )?;
        Ok(())
    }

    /// Loads a saved draft snapshot.
    pub fn load_draft(&self, id: &DraftId) -> Result<Option<WizardState>, DbError> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM drafts WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|data| decode_json("drafts", id.as_str(), &data))
            .transpose()
    }

    /// Lists drafts, most recently saved first.
    pub fn list_drafts(&self) -> Result<Vec<DraftSummary>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, stage, updated_at FROM drafts ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DraftSummary {
                id: row.get(0)?,
                stage: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        let mut drafts = Vec::new();
        for row in rows {
            drafts.push(row?);
        }
        Ok(drafts)
    }

    /// Deletes a draft. Returns whether one existed.
    pub fn delete_draft(&mut self, id: &DraftId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM drafts WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    /// Stores a committed result with its segments and removes its draft.
    ///
    /// Runs in a single transaction: either everything is written or nothing.
    pub fn commit_result(&mut self, result: &CommittedResult) -> Result<ResultId, DbError> {
        let draft = &result.draft;
        let data = serde_json::to_string(result).map_err(|source| DbError::Encode {
            what: "result",
            source,
        })?;
        let recorded_on = result.recorded_on.to_string();

        let tx = self.conn.transaction()?;
        let reused: Option<ResultId> = tx
            .query_row(
                "SELECT id FROM results WHERE draft_id = ?",
                [result.draft_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(result_id) = reused {
            return Err(DbError::DraftAlreadyCommitted {
                draft_id: result.draft_id.clone(),
                result_id,
            });
        }
        let existing: Option<i64> = tx
            .query_row(
                "
                SELECT id FROM results
                WHERE swimmer_id = ? AND competition_id = ? AND event_id = ? AND phase = ? AND recorded_on = ?
                ",
                params![
                    draft.swimmer_id.as_str(),
                    draft.competition_id.as_str(),
                    draft.event_id.as_str(),
                    draft.phase.as_str(),
                    recorded_on,
                ],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(DbError::DuplicateResult {
                swimmer_id: draft.swimmer_id.clone(),
                competition_id: draft.competition_id.clone(),
                event_id: draft.event_id.clone(),
                phase: draft.phase,
                recorded_on: result.recorded_on,
            });
        }

        tx.execute(
            "
            INSERT INTO results
            (draft_id, competition_id, swimmer_id, event_id, phase, recorded_on,
             global_time_cs, sum_of_splits_cs, deviation_cs, status, category, data, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                result.draft_id.as_str(),
                draft.competition_id.as_str(),
                draft.swimmer_id.as_str(),
                draft.event_id.as_str(),
                draft.phase.as_str(),
                recorded_on,
                draft.global_time.centis(),
                result.aggregate.sum_of_splits.centis(),
                result.aggregate.deviation_cs,
                result.status.as_str(),
                result.category.as_str(),
                data,
                now_timestamp(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO segments
                (result_id, idx, style, distance_m, time_cs, stroke_count, streamline_m)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for segment in &draft.segments {
                stmt.execute(params![
                    id,
                    segment.index,
                    segment.style.as_str(),
                    segment.distance_m,
                    segment.time.centis(),
                    segment.stroke_count,
                    segment.streamline_m,
                ])?;
            }
        }
        tx.execute(
            "DELETE FROM drafts WHERE id = ?",
            [result.draft_id.as_str()],
        )?;
        tx.commit()?;

        tracing::debug!(result_id = id, draft_id = %result.draft_id, "result stored");
        Ok(id)
    }

    /// Lists committed results ordered by recording date then ID.
    pub fn list_results(&self) -> Result<Vec<ResultSummary>, DbError> {
        self.results_matching(&ResultFilter::default())
    }

    /// Committed results passing `filter`, ordered by recording date then ID.
    pub fn results_matching(&self, filter: &ResultFilter) -> Result<Vec<ResultSummary>, DbError> {
        let (conditions, values) = filter.conditions();
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT r.id, r.competition_id, r.swimmer_id, s.full_name, c.name, r.event_id,
                   r.phase, r.recorded_on, r.global_time_cs, r.deviation_cs, r.status
            FROM results r
            JOIN swimmers s ON s.id = r.swimmer_id
            JOIN competitions c ON c.id = r.competition_id
            JOIN race_events e ON e.id = r.event_id
            {conditions}
            ORDER BY r.recorded_on ASC, r.id ASC
            "
        ))?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(ResultRow {
                id: row.get(0)?,
                competition_id: row.get(1)?,
                swimmer_id: row.get(2)?,
                swimmer_name: row.get(3)?,
                competition_name: row.get(4)?,
                event_id: row.get(5)?,
                phase: row.get(6)?,
                recorded_on: row.get(7)?,
                global_time_cs: row.get(8)?,
                deviation_cs: row.get(9)?,
                status: row.get(10)?,
            })
        })?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?.into_summary()?);
        }
        Ok(results)
    }

    /// Splits of every committed result passing `filter`, paired with the
    /// result's event and ordered by event, result and split index.
    pub fn segments_matching(
        &self,
        filter: &ResultFilter,
    ) -> Result<Vec<(EventId, Segment)>, DbError> {
        let (conditions, values) = filter.conditions();
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT g.result_id, r.event_id, g.idx, g.style, g.distance_m, g.time_cs,
                   g.stroke_count, g.streamline_m
            FROM segments g
            JOIN results r ON r.id = g.result_id
            JOIN race_events e ON e.id = r.event_id
            {conditions}
            ORDER BY r.event_id ASC, g.result_id ASC, g.idx ASC
            "
        ))?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(SegmentRow {
                result_id: row.get(0)?,
                event_id: row.get(1)?,
                index: row.get(2)?,
                style: row.get(3)?,
                distance_m: row.get(4)?,
                time_cs: row.get(5)?,
                stroke_count: row.get(6)?,
                streamline_m: row.get(7)?,
            })
        })?;
        let mut segments = Vec::new();
        for row in rows {
            segments.push(row?.into_segment()?);
        }
        Ok(segments)
    }

    /// Loads the full committed result.
    pub fn load_result(&self, id: ResultId) -> Result<Option<CommittedResult>, DbError> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM results WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        data.map(|data| decode_json("results", &id.to_string(), &data))
            .transpose()
    }

    /// Results of one swimmer in one event, oldest first.
    pub fn results_for(
        &self,
        swimmer_id: &SwimmerId,
        event_id: &EventId,
    ) -> Result<Vec<(ResultId, CommittedResult)>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, data FROM results
            WHERE swimmer_id = ? AND event_id = ?
            ORDER BY recorded_on ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([swimmer_id.as_str(), event_id.as_str()], |row| {
            let id: i64 = row.get(0)?;
            let data: String = row.get(1)?;
            Ok((id, data))
        })?;
        let mut results = Vec::new();
        for row in rows {
            let (id, data) = row?;
            results.push((id, decode_json("results", &id.to_string(), &data)?));
        }
        Ok(results)
    }

    /// Global times of one swimmer in one event, oldest first.
    pub fn global_times_for(
        &self,
        swimmer_id: &SwimmerId,
        event_id: &EventId,
    ) -> Result<Vec<Time>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, global_time_cs FROM results
            WHERE swimmer_id = ? AND event_id = ?
            ORDER BY recorded_on ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([swimmer_id.as_str(), event_id.as_str()], |row| {
            let id: i64 = row.get(0)?;
            let centis: i64 = row.get(1)?;
            Ok((id, centis))
        })?;
        let mut times = Vec::new();
        for row in rows {
            let (id, centis) = row?;
            times.push(decode_time("results", id, centis)?);
        }
        Ok(times)
    }

    /// Number of rows in each table.
    pub fn counts(&self) -> Result<TableCounts, DbError> {
        let count = |table: &str| -> Result<i64, DbError> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            competitions: count("competitions")?,
            swimmers: count("swimmers")?,
            race_events: count("race_events")?,
            drafts: count("drafts")?,
            results: count("results")?,
        })
    }
}

impl ReferenceData for Database {
    type Error = DbError;

    fn competition(&self, id: &CompetitionId) -> Result<Option<Competition>, DbError> {
        self.conn
            .query_row(
                "SELECT id, name, course, start_date, end_date, venue FROM competitions WHERE id = ?",
                [id.as_str()],
                CompetitionRow::from_row,
            )
            .optional()?
            .map(CompetitionRow::into_competition)
            .transpose()
    }

    fn swimmer(&self, id: &SwimmerId) -> Result<Option<Swimmer>, DbError> {
        self.conn
            .query_row(
                "SELECT id, full_name, birth_date FROM swimmers WHERE id = ?",
                [id.as_str()],
                SwimmerRow::from_row,
            )
            .optional()?
            .map(SwimmerRow::into_swimmer)
            .transpose()
    }

    fn race_event(&self, id: &EventId) -> Result<Option<RaceEvent>, DbError> {
        self.conn
            .query_row(
                "SELECT id, style, distance_m, course FROM race_events WHERE id = ?",
                [id.as_str()],
                EventRow::from_row,
            )
            .optional()?
            .map(EventRow::into_event)
            .transpose()
    }
}

impl ResultStore for Database {
    type Error = DbError;

    fn save_draft(&mut self, snapshot: &WizardState) -> Result<(), DbError> {
        Self::save_draft(self, snapshot)
    }

    fn commit(&mut self, result: &CommittedResult) -> Result<ResultId, DbError> {
        self.commit_result(result)
    }
}

struct CompetitionRow {
    id: String,
    name: String,
    course: String,
    start_date: String,
    end_date: String,
    venue: Option<String>,
}

impl CompetitionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            course: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            venue: row.get(5)?,
        })
    }

    fn into_competition(self) -> Result<Competition, DbError> {
        const TABLE: &str = "competitions";
        Ok(Competition {
            id: decode(TABLE, &self.id, &self.id)?,
            course: decode(TABLE, &self.id, &self.course)?,
            start_date: decode(TABLE, &self.id, &self.start_date)?,
            end_date: decode(TABLE, &self.id, &self.end_date)?,
            name: self.name,
            venue: self.venue,
        })
    }
}

struct SwimmerRow {
    id: String,
    full_name: String,
    birth_date: String,
}

impl SwimmerRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            full_name: row.get(1)?,
            birth_date: row.get(2)?,
        })
    }

    fn into_swimmer(self) -> Result<Swimmer, DbError> {
        const TABLE: &str = "swimmers";
        Ok(Swimmer {
            id: decode(TABLE, &self.id, &self.id)?,
            birth_date: decode(TABLE, &self.id, &self.birth_date)?,
            full_name: self.full_name,
        })
    }
}

struct EventRow {
    id: String,
    style: String,
    distance_m: u32,
    course: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            style: row.get(1)?,
            distance_m: row.get(2)?,
            course: row.get(3)?,
        })
    }

    fn into_event(self) -> Result<RaceEvent, DbError> {
        const TABLE: &str = "race_events";
        Ok(RaceEvent {
            id: decode(TABLE, &self.id, &self.id)?,
            style: decode(TABLE, &self.id, &self.style)?,
            course: decode(TABLE, &self.id, &self.course)?,
            distance_m: self.distance_m,
        })
    }
}

struct ResultRow {
    id: i64,
    competition_id: String,
    swimmer_id: String,
    swimmer_name: String,
    competition_name: String,
    event_id: String,
    phase: String,
    recorded_on: String,
    global_time_cs: i64,
    deviation_cs: i64,
    status: String,
}

impl ResultRow {
    fn into_summary(self) -> Result<ResultSummary, DbError> {
        const TABLE: &str = "results";
        let key = self.id.to_string();
        Ok(ResultSummary {
            id: self.id,
            phase: decode(TABLE, &key, &self.phase)?,
            recorded_on: decode(TABLE, &key, &self.recorded_on)?,
            global_time: decode_time(TABLE, self.id, self.global_time_cs)?,
            status: decode(TABLE, &key, &self.status)?,
            deviation_cs: self.deviation_cs,
            competition_id: self.competition_id,
            swimmer_id: self.swimmer_id,
            swimmer_name: self.swimmer_name,
            competition_name: self.competition_name,
            event_id: self.event_id,
        })
    }
}

struct SegmentRow {
    result_id: i64,
    event_id: String,
    index: u32,
    style: String,
    distance_m: u32,
    time_cs: i64,
    stroke_count: u32,
    streamline_m: f64,
}

impl SegmentRow {
    fn into_segment(self) -> Result<(EventId, Segment), DbError> {
        const TABLE: &str = "segments";
        let key = format!("{}/{}", self.result_id, self.index);
        let segment = Segment {
            index: self.index,
            style: decode(TABLE, &key, &self.style)?,
            distance_m: self.distance_m,
            time: decode_time(TABLE, self.result_id, self.time_cs)?,
            stroke_count: self.stroke_count,
            streamline_m: self.streamline_m,
        };
        Ok((decode(TABLE, &key, &self.event_id)?, segment))
    }
}

fn upsert_competition(conn: &Connection, competition: &Competition) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO competitions (id, name, course, start_date, end_date, venue)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            course = excluded.course,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            venue = excluded.venue
        ",
        params![
            competition.id.as_str(),
            competition.name,
            competition.course.as_str(),
            competition.start_date.to_string(),
            competition.end_date.to_string(),
            competition.venue,
        ],
    )?;
    Ok(())
}

fn upsert_swimmer(conn: &Connection, swimmer: &Swimmer) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO swimmers (id, full_name, birth_date)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            birth_date = excluded.birth_date
        ",
        params![
            swimmer.id.as_str(),
            swimmer.full_name,
            swimmer.birth_date.to_string(),
        ],
    )?;
    Ok(())
}

fn upsert_race_event(conn: &Connection, event: &RaceEvent) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO race_events (id, style, distance_m, course)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            style = excluded.style,
            distance_m = excluded.distance_m,
            course = excluded.course
        ",
        params![
            event.id.as_str(),
            event.style.as_str(),
            event.distance_m,
            event.course.as_str(),
        ],
    )?;
    Ok(())
}

fn decode<T>(table: &'static str, id: &str, value: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|err: T::Err| DbError::InvalidData {
        table,
        id: id.to_string(),
        message: err.to_string(),
    })
}

fn decode_time(table: &'static str, id: i64, centis: i64) -> Result<Time, DbError> {
    Time::try_from_centis(centis).map_err(|err| DbError::InvalidData {
        table,
        id: id.to_string(),
        message: err.to_string(),
    })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    table: &'static str,
    id: &str,
    data: &str,
) -> Result<T, DbError> {
    serde_json::from_str(data).map_err(|err| DbError::InvalidData {
        table,
        id: id.to_string(),
        message: err.to_string(),
    })
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
