use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use directories::ProjectDirs;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::achievements::AchievementStats;
use crate::session::TestRecord;

/// Durable, append-only store of finished tests plus the unlocked-achievement
/// set. Also the source of the lifetime counters the evaluator consumes.
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn new() -> Result<Self> {
        let db_path = Self::default_path().unwrap_or_else(|| PathBuf::from("typewave.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("failed to create directory: {e}")),
                )
            })?;
        }

        let conn = Connection::open(path.as_ref())?;
        debug!("history db at {}", path.as_ref().display());

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                wpm REAL NOT NULL,
                error_rate REAL NOT NULL,
                duration_secs REAL NOT NULL,
                error_count INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_timestamp ON results(timestamp)",
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS achievements (
                id TEXT PRIMARY KEY,
                unlocked_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }

    /// Database file under the platform state directory.
    fn default_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("typewave");
            Some(state_dir.join("history.db"))
        } else {
            ProjectDirs::from("", "", "typewave")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("history.db"))
        }
    }

    /// Append one finished test, most-recent-last.
    pub fn record_result(&self, record: &TestRecord) -> Result<()> {
        self.record_result_at(record, Local::now())
    }

    pub fn record_result_at(&self, record: &TestRecord, at: DateTime<Local>) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO results (timestamp, wpm, error_rate, duration_secs, error_count)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                at.to_rfc3339(),
                record.wpm,
                record.error_rate,
                record.duration_secs,
                record.error_count as i64,
            ],
        )?;
        Ok(())
    }

    /// Most recent results, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<(DateTime<Local>, TestRecord)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, wpm, error_rate, duration_secs, error_count
            FROM results ORDER BY id DESC LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let timestamp: String = row.get(0)?;
            let record = TestRecord {
                wpm: row.get(1)?,
                error_rate: row.get(2)?,
                duration_secs: row.get(3)?,
                error_count: row.get::<_, i64>(4)? as usize,
            };
            Ok((timestamp, record))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (timestamp, record) = row?;
            match DateTime::parse_from_rfc3339(&timestamp) {
                Ok(dt) => results.push((dt.with_timezone(&Local), record)),
                Err(err) => warn!("skipping result with bad timestamp {timestamp:?}: {err}"),
            }
        }
        Ok(results)
    }

    pub fn total_tests(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn best_wpm(&self) -> Result<f64> {
        let best: Option<f64> =
            self.conn
                .query_row("SELECT MAX(wpm) FROM results", [], |row| row.get(0))
                .optional()?
                .flatten();
        Ok(best.unwrap_or(0.0))
    }

    /// Total minutes typed on `day`.
    pub fn minutes_on(&self, day: NaiveDate) -> Result<f64> {
        let prefix = format!("{}%", day.format("%Y-%m-%d"));
        let secs: Option<f64> = self
            .conn
            .query_row(
                "SELECT SUM(duration_secs) FROM results WHERE timestamp LIKE ?1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(secs.unwrap_or(0.0) / 60.0)
    }

    /// Consecutive practice days ending on `today` (or yesterday when today
    /// has no test yet).
    pub fn daily_streak(&self, today: NaiveDate) -> Result<u32> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(timestamp, 1, 10) FROM results ORDER BY 1 DESC",
        )?;
        let days: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_>>()?;

        let mut streak = 0u32;
        let mut expected = today;
        for day in days {
            let Ok(date) = NaiveDate::parse_from_str(&day, "%Y-%m-%d") else {
                continue;
            };
            if streak == 0 && date == today.pred_opt().unwrap_or(today) {
                // No test yet today: the streak still stands from yesterday.
                expected = date;
            }
            if date == expected {
                streak += 1;
                expected = match expected.pred_opt() {
                    Some(prev) => prev,
                    None => break,
                };
            } else if date < expected {
                break;
            }
        }
        Ok(streak)
    }

    pub fn unlocked(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT id FROM achievements")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<String>>>()?;
        Ok(ids)
    }

    pub fn mark_unlocked(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO achievements (id, unlocked_at) VALUES (?1, ?2)",
            params![id, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Assemble the evaluator snapshot: session fields from `record`, the
    /// rest from history. Call after `record_result` so lifetime counters
    /// include the test being scored.
    pub fn snapshot(&self, record: &TestRecord, bonus_time_uses: u64) -> Result<AchievementStats> {
        let today = Local::now().date_naive();
        Ok(AchievementStats {
            wpm: record.wpm,
            error_rate: record.error_rate,
            duration_secs: record.duration_secs,
            tests_completed: self.total_tests()?,
            best_wpm: self.best_wpm()?,
            daily_streak: self.daily_streak(today)?,
            minutes_today: self.minutes_on(today)?,
            bonus_time_uses,
        })
    }
}
