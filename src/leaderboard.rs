use crate::session::SessionSummary;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 64;
pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("invalid score entry: {0}")]
    InvalidEntry(String),

    #[error("leaderboard storage failed: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored date is not ISO-8601: {0}")]
    BadDate(#[from] chrono::ParseError),

    #[error("leaderboard I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub date: DateTime<Utc>,
}

impl ScoreEntry {
    /// Build an entry, trimming the name and capping it at 64 characters.
    pub fn new(name: &str, score: u32, date: DateTime<Utc>) -> Result<Self> {
        let name: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
        if name.is_empty() {
            return Err(LeaderboardError::InvalidEntry("name is required".into()));
        }
        Ok(Self { name, score, date })
    }
}

/// Append-only score storage.
///
/// Appends may be retried; every submission is an independent row.
pub trait ScoreStore {
    /// Append an entry and return the retained leaderboard, best first.
    fn submit_score(&mut self, entry: &ScoreEntry) -> Result<Vec<ScoreEntry>>;

    /// All retained entries, best first
    fn list_scores(&self) -> Result<Vec<ScoreEntry>>;
}

/// In-process store, useful for tests and throwaway games
#[derive(Debug, Clone)]
pub struct MemoryScoreStore {
    entries: Vec<ScoreEntry>,
    capacity: usize,
}

impl MemoryScoreStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ScoreStore for MemoryScoreStore {
    fn submit_score(&mut self, entry: &ScoreEntry) -> Result<Vec<ScoreEntry>> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.push(entry.clone());
        // stable sort keeps earlier submissions ahead on ties
        self.entries = entries
            .into_iter()
            .sorted_by(|a, b| b.score.cmp(&a.score))
            .take(self.capacity)
            .collect();
        Ok(self.entries.clone())
    }

    fn list_scores(&self) -> Result<Vec<ScoreEntry>> {
        Ok(self.entries.clone())
    }
}

/// SQLite-backed leaderboard
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
    capacity: usize,
}

impl SqliteScoreStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?, capacity)
    }

    pub fn open_in_memory(capacity: usize) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, capacity)
    }

    fn from_connection(conn: Connection, capacity: usize) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                score INTEGER NOT NULL,
                date TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC, id ASC)",
            [],
        )?;

        Ok(SqliteScoreStore { conn, capacity })
    }

    fn query_ranked(conn: &Connection) -> Result<Vec<ScoreEntry>> {
        let mut stmt =
            conn.prepare("SELECT name, score, date FROM scores ORDER BY score DESC, id ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, score, date) = row?;
            let date = DateTime::parse_from_rfc3339(&date)?.with_timezone(&Utc);
            entries.push(ScoreEntry { name, score, date });
        }
        Ok(entries)
    }
}

impl ScoreStore for SqliteScoreStore {
    fn submit_score(&mut self, entry: &ScoreEntry) -> Result<Vec<ScoreEntry>> {
        // IMMEDIATE takes the write lock up front so concurrent writers queue
        // instead of interleaving the insert and the trim.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO scores (name, score, date) VALUES (?1, ?2, ?3)",
            params![entry.name, entry.score, entry.date.to_rfc3339()],
        )?;

        let trimmed = tx.execute(
            r#"
            DELETE FROM scores WHERE id NOT IN (
                SELECT id FROM scores ORDER BY score DESC, id ASC LIMIT ?1
            )
            "#,
            params![self.capacity as i64],
        )?;

        let entries = Self::query_ranked(&tx)?;
        tx.commit()?;

        tracing::info!(
            name = %entry.name,
            score = entry.score,
            retained = entries.len(),
            trimmed,
            "score submitted"
        );
        Ok(entries)
    }

    fn list_scores(&self) -> Result<Vec<ScoreEntry>> {
        Self::query_ranked(&self.conn)
    }
}

/// The entry that was just stored and the board it landed on
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub entry: ScoreEntry,
    pub ranked: Vec<ScoreEntry>,
}

impl Submission {
    /// 1-based rank of the stored entry, `None` if it fell off the board.
    ///
    /// Equal rows rank by arrival, so the newest match is the one just stored.
    pub fn rank(&self) -> Option<usize> {
        self.ranked
            .iter()
            .rposition(|e| e == &self.entry)
            .map(|i| i + 1)
    }
}

/// Hands finished sessions to a score store
#[derive(Debug)]
pub struct LeaderboardClient<S: ScoreStore> {
    store: S,
}

impl<S: ScoreStore> LeaderboardClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn submit(&mut self, name: &str, summary: &SessionSummary) -> Result<Submission> {
        let entry = ScoreEntry::new(name, summary.total_score, Utc::now())?;
        let ranked = self.store.submit_score(&entry)?;
        Ok(Submission { entry, ranked })
    }

    pub fn submit_entry(&mut self, entry: &ScoreEntry) -> Result<Vec<ScoreEntry>> {
        self.store.submit_score(entry)
    }

    pub fn list(&self) -> Result<Vec<ScoreEntry>> {
        self.store.list_scores()
    }

    /// Write the leaderboard as `rank,name,score,date` rows
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["rank", "name", "score", "date"])?;
        for (i, entry) in self.list()?.iter().enumerate() {
            csv.write_record([
                (i + 1).to_string(),
                entry.name.clone(),
                entry.score.to_string(),
                entry.date.to_rfc3339(),
            ])?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn entry(name: &str, score: u32) -> ScoreEntry {
        let date = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        ScoreEntry::new(name, score, date).unwrap()
    }

    #[test]
    fn test_entry_truncates_long_names() {
        let long = "x".repeat(100);
        let e = entry(&long, 10);
        assert_eq!(e.name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_entry_truncates_on_char_boundary() {
        let long = "é".repeat(70);
        let e = entry(&long, 10);
        assert_eq!(e.name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_entry_requires_name() {
        assert_matches!(
            ScoreEntry::new("   ", 10, Utc::now()),
            Err(LeaderboardError::InvalidEntry(_))
        );
    }

    #[test]
    fn test_memory_store_sorts_descending() {
        let mut store = MemoryScoreStore::default();
        store.submit_score(&entry("ann", 1200)).unwrap();
        store.submit_score(&entry("bob", 2500)).unwrap();
        let ranked = store.submit_score(&entry("cat", 300)).unwrap();

        let names: Vec<_> = ranked.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "ann", "cat"]);
        assert_eq!(store.list_scores().unwrap(), ranked);
    }

    #[test]
    fn test_memory_store_keeps_top_entries() {
        let mut store = MemoryScoreStore::new(2);
        store.submit_score(&entry("low", 100)).unwrap();
        store.submit_score(&entry("high", 900)).unwrap();
        let ranked = store.submit_score(&entry("mid", 500)).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "high");
        assert_eq!(ranked[1].name, "mid");
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let mut store = SqliteScoreStore::open_in_memory(DEFAULT_CAPACITY).unwrap();
        let e = entry("dana", 1750);
        store.submit_score(&e).unwrap();

        let listed = store.list_scores().unwrap();
        assert_eq!(listed, vec![e]);
    }

    #[test]
    fn test_sqlite_store_ranks_and_breaks_ties_by_arrival() {
        let mut store = SqliteScoreStore::open_in_memory(DEFAULT_CAPACITY).unwrap();
        store.submit_score(&entry("first", 800)).unwrap();
        store.submit_score(&entry("top", 2000)).unwrap();
        store.submit_score(&entry("second", 800)).unwrap();

        let names: Vec<_> = store
            .list_scores()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_sqlite_store_trims_to_capacity() {
        let mut store = SqliteScoreStore::open_in_memory(3).unwrap();
        for (i, score) in [50, 400, 10, 300, 200].into_iter().enumerate() {
            store.submit_score(&entry(&format!("p{i}"), score)).unwrap();
        }

        let scores: Vec<_> = store
            .list_scores()
            .unwrap()
            .into_iter()
            .map(|e| e.score)
            .collect();
        assert_eq!(scores, vec![400, 300, 200]);
    }

    #[test]
    fn test_sqlite_store_resubmission_adds_rows() {
        let mut store = SqliteScoreStore::open_in_memory(DEFAULT_CAPACITY).unwrap();
        let e = entry("retry", 900);
        store.submit_score(&e).unwrap();
        let ranked = store.submit_score(&e).unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_sqlite_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.db");

        {
            let mut store = SqliteScoreStore::open(&path, DEFAULT_CAPACITY).unwrap();
            store.submit_score(&entry("eve", 1500)).unwrap();
        }

        let store = SqliteScoreStore::open(&path, DEFAULT_CAPACITY).unwrap();
        let listed = store.list_scores().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "eve");
    }

    fn summary(total_score: u32) -> SessionSummary {
        SessionSummary {
            total_score,
            rounds_total: 5,
            results: Vec::new(),
        }
    }

    #[test]
    fn test_submission_rank_counts_newest_tie_last() {
        let mut client = LeaderboardClient::new(SqliteScoreStore::open_in_memory(200).unwrap());
        client.submit_entry(&entry("zed", 900)).unwrap();
        let first = client.submit("ann", &summary(500)).unwrap();
        let second = client.submit("ann", &summary(500)).unwrap();

        assert_eq!(first.rank(), Some(2));
        assert_eq!(second.rank(), Some(3));
        assert_eq!(second.ranked.len(), 3);
    }

    #[test]
    fn test_submission_rank_with_truncated_name() {
        let mut client = LeaderboardClient::new(MemoryScoreStore::default());
        let long = "x".repeat(70);
        let submission = client.submit(&long, &summary(1200)).unwrap();

        assert_eq!(submission.entry.name.chars().count(), MAX_NAME_CHARS);
        assert_eq!(submission.rank(), Some(1));
    }

    #[test]
    fn test_submission_rank_when_trimmed_off() {
        let mut client = LeaderboardClient::new(MemoryScoreStore::new(1));
        client.submit_entry(&entry("top", 2500)).unwrap();
        let submission = client.submit("late", &summary(100)).unwrap();

        assert_eq!(submission.rank(), None);
        assert_eq!(submission.ranked.len(), 1);
    }

    #[test]
    fn test_export_csv() {
        let mut client = LeaderboardClient::new(MemoryScoreStore::default());
        client.submit_entry(&entry("ann", 1200)).unwrap();
        client.submit_entry(&entry("bob", 2500)).unwrap();

        let mut out = Vec::new();
        client.export_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "rank,name,score,date");
        assert_eq!(lines[1], "1,bob,2500,2025-03-14T09:30:00+00:00");
        assert_eq!(lines[2], "2,ann,1200,2025-03-14T09:30:00+00:00");
    }
}
