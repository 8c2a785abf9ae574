//! History store — the append-only log of past review generations.
//!
//! Backed by SQLite with an explicit schema version so the storage format
//! can migrate without shape-sniffing stored JSON. Entries are never
//! mutated after insertion; the only deletion is oldest-first eviction once
//! the store exceeds its cap.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::quiz::{GenerationResult, Question};
use crate::models::settings::{GenerationSettings, Mode};

/// Bump when the stored row shape changes.
pub const SCHEMA_VERSION: i64 = 1;
/// The store retains at most this many entries, evicting the oldest.
pub const HISTORY_CAP: i64 = 50;

/// One recorded generation. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique, time-derived id: epoch-millis prefix plus a short suffix to
    /// disambiguate same-millisecond inserts.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub mode: Mode,
    pub settings: GenerationSettings,
    pub data: GenerationResult,
}

impl HistoryEntry {
    pub fn new(
        subject: String,
        mode: Mode,
        settings: GenerationSettings,
        data: GenerationResult,
    ) -> Self {
        let timestamp = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}", timestamp.timestamp_millis(), &suffix[..8]);
        Self {
            id,
            timestamp,
            subject,
            mode,
            settings,
            data,
        }
    }
}

/// Selection strategy for re-quizzing from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStrategy {
    /// Questions from the newest entries first (entry timestamp descending).
    Latest,
    /// Uniform random permutation of every matching question.
    Random,
    /// Original entry order, flattened.
    All,
}

/// How many questions to select: a number, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCount {
    All,
    Limit(usize),
}

impl Default for ReviewCount {
    fn default() -> Self {
        ReviewCount::All
    }
}

impl<'de> Deserialize<'de> for ReviewCount {
    /// Accepts a number, a numeric string, or the literal `"all"`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(usize),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ReviewCount::Limit(n)),
            Raw::Text(s) if s == "all" => Ok(ReviewCount::All),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(ReviewCount::Limit)
                .map_err(|_| serde::de::Error::custom("count must be a number or \"all\"")),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    recorded_at: String,
    subject: String,
    mode: String,
    settings: String,
    data: String,
}

impl HistoryRow {
    fn into_entry(self) -> Result<HistoryEntry> {
        Ok(HistoryEntry {
            timestamp: DateTime::parse_from_rfc3339(&self.recorded_at)
                .with_context(|| format!("bad timestamp in history row {}", self.id))?
                .with_timezone(&Utc),
            mode: Mode::parse(&self.mode)
                .ok_or_else(|| anyhow!("unknown mode '{}' in history row {}", self.mode, self.id))?,
            settings: serde_json::from_str(&self.settings)
                .with_context(|| format!("bad settings JSON in history row {}", self.id))?,
            data: serde_json::from_str(&self.data)
                .with_context(|| format!("bad data JSON in history row {}", self.id))?,
            id: self.id,
            subject: self.subject,
        })
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_meta (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM schema_meta LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        match version {
            None => {
                sqlx::query("INSERT INTO schema_meta (version) VALUES (?)")
                    .bind(SCHEMA_VERSION)
                    .execute(&self.pool)
                    .await?;
            }
            Some(v) if v != SCHEMA_VERSION => {
                // Migration hook; v1 is the only shape so far.
                warn!("履歴スキーマのバージョンが異なります: stored={v}, expected={SCHEMA_VERSION}");
            }
            Some(_) => {}
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history_entries (
                id TEXT PRIMARY KEY,
                recorded_at TEXT NOT NULL,
                subject TEXT NOT NULL,
                mode TEXT NOT NULL,
                settings TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("履歴ストア初期化完了 (schema v{SCHEMA_VERSION})");
        Ok(())
    }

    /// Appends an entry, registering its subject (first appearance keeps its
    /// insertion position), then evicts the oldest entries beyond the cap.
    pub async fn record(&self, entry: &HistoryEntry) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO subjects (name) VALUES (?)")
            .bind(&entry.subject)
            .execute(&self.pool)
            .await?;

        let settings_json = serde_json::to_string(&entry.settings)?;
        let data_json = serde_json::to_string(&entry.data)?;
        sqlx::query(
            r#"
            INSERT INTO history_entries (id, recorded_at, subject, mode, settings, data)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.timestamp.to_rfc3339())
        .bind(&entry.subject)
        .bind(entry.mode.as_str())
        .bind(settings_json)
        .bind(data_json)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM history_entries
            WHERE rowid NOT IN (
                SELECT rowid FROM history_entries ORDER BY rowid DESC LIMIT ?
            )
            "#,
        )
        .bind(HISTORY_CAP)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Distinct subject names in insertion order of first appearance.
    pub async fn list_subjects(&self) -> Result<Vec<String>> {
        Ok(
            sqlx::query_scalar("SELECT name FROM subjects ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Every retained entry for `subject`, in append order.
    pub async fn list_by_subject(&self, subject: &str) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, recorded_at, subject, mode, settings, data
            FROM history_entries
            WHERE subject = ?
            ORDER BY rowid
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(HistoryRow::into_entry).collect()
    }

    /// Selects questions for a review session. Empty when the subject has no
    /// history — callers present that as "nothing to review", not an error.
    pub async fn select_for_review(
        &self,
        subject: &str,
        strategy: ReviewStrategy,
        count: ReviewCount,
    ) -> Result<Vec<Question>> {
        let entries = self.list_by_subject(subject).await?;
        Ok(select_questions(entries, strategy, count))
    }

    /// Number of retained entries across all subjects.
    #[allow(dead_code)]
    pub async fn len(&self) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM history_entries")
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

/// Pure selection step over already-loaded entries.
fn select_questions(
    mut entries: Vec<HistoryEntry>,
    strategy: ReviewStrategy,
    count: ReviewCount,
) -> Vec<Question> {
    let mut questions: Vec<Question> = match strategy {
        ReviewStrategy::Latest => {
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            flatten(&entries)
        }
        ReviewStrategy::All => flatten(&entries),
        ReviewStrategy::Random => {
            let mut questions = flatten(&entries);
            questions.shuffle(&mut rand::thread_rng());
            questions
        }
    };

    if let ReviewCount::Limit(n) = count {
        questions.truncate(n);
    }
    questions
}

fn flatten(entries: &[HistoryEntry]) -> Vec<Question> {
    entries
        .iter()
        .flat_map(|e| e.data.questions().iter().cloned())
        .collect()
}
