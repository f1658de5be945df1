#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use decision_journal_core::{
    best_emotional_state, correlation_report, emotional_patterns, format_rfc3339, now_utc,
    parse_rfc3339_utc, summarize, CorrelationReport, Decision, DecisionId, DecisionInput,
    DecisionStatus, EmotionalPattern, InsightsSummary, Outcome, UserId,
};
use rusqlite::{params, Connection};
use ulid::Ulid;

const JOURNAL_MIGRATION_VERSION: i64 = 1;

const SCHEMA_DECISIONS_V1: &str = r"
CREATE TABLE IF NOT EXISTS decisions (
  decision_seq INTEGER PRIMARY KEY AUTOINCREMENT,
  decision_id TEXT NOT NULL UNIQUE,
  user_id TEXT NOT NULL,
  title TEXT NOT NULL,
  confidence_level INTEGER NOT NULL CHECK (confidence_level BETWEEN 1 AND 5),
  outcome TEXT NOT NULL CHECK (outcome IN ('better', 'same', 'worse', 'unknown')),
  status TEXT NOT NULL CHECK (status IN ('draft', 'deliberating', 'decided', 'reviewed')),
  emotional_state TEXT,
  recorded_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS trg_decisions_reviewed_immutable
BEFORE UPDATE ON decisions
WHEN OLD.status = 'reviewed'
BEGIN
  SELECT RAISE(FAIL, 'reviewed decisions are immutable');
END;

CREATE INDEX IF NOT EXISTS idx_decisions_user_seq
  ON decisions(user_id, decision_seq);
CREATE INDEX IF NOT EXISTS idx_decisions_user_status
  ON decisions(user_id, status);
";

pub struct SqliteDecisionStore {
    conn: Connection,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SeedReport {
    pub user_id: UserId,
    pub inserted: usize,
}

impl SqliteDecisionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to configure sqlite pragmas")?;

        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                );",
            )
            .context("failed to ensure schema_migrations exists")?;

        self.conn
            .execute_batch(SCHEMA_DECISIONS_V1)
            .context("failed to apply decision journal schema")?;

        let now = format_rfc3339(now_utc()).map_err(|err| anyhow!(err.to_string()))?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![JOURNAL_MIGRATION_VERSION, now],
            )
            .context("failed to register decision journal schema migration")?;

        Ok(())
    }

    pub fn insert_decision(&mut self, input: &DecisionInput) -> Result<Decision> {
        input
            .validate()
            .map_err(|err| anyhow!("decision validation failed: {err}"))?;

        let decision_id = match input.decision_id {
            Some(value) => DecisionId(value),
            None => DecisionId(Ulid::new()),
        };

        let tx = self
            .conn
            .transaction()
            .context("failed to start decision transaction")?;

        tx.execute(
            "INSERT INTO decisions(
                decision_id, user_id, title, confidence_level,
                outcome, status, emotional_state, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                decision_id.to_string(),
                input.user_id.to_string(),
                input.title,
                i64::from(input.confidence_level),
                input.outcome.as_str(),
                input.status.as_str(),
                input.emotional_state,
                format_rfc3339(input.recorded_at).map_err(|err| anyhow!(err.to_string()))?,
            ],
        )
        .context("failed to insert decision")?;

        let decision_seq = tx.last_insert_rowid();
        tx.commit().context("failed to commit decision transaction")?;

        Ok(Decision {
            decision_seq,
            decision_id,
            user_id: input.user_id,
            title: input.title.clone(),
            confidence_level: input.confidence_level,
            outcome: input.outcome,
            status: input.status,
            emotional_state: input.emotional_state.clone(),
            recorded_at: input.recorded_at,
        })
    }

    /// Fetches the user's current decision snapshot in one query, so
    /// downstream report computations never observe a torn read.
    pub fn list_decisions_for_user(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Decision>> {
        let mut query = "SELECT
                decision_seq, decision_id, user_id, title, confidence_level,
                outcome, status, emotional_state, recorded_at
             FROM decisions
             WHERE user_id = ?1
             ORDER BY decision_seq ASC"
            .to_string();

        if let Some(raw_limit) = limit {
            query.push_str(" LIMIT ");
            query.push_str(&raw_limit.to_string());
        }

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params![user_id.to_string()], parse_decision_row)?;

        collect_rows(rows)
    }

    pub fn correlation_report(&self, user_id: UserId) -> Result<CorrelationReport> {
        let decisions = self.list_decisions_for_user(user_id, None)?;
        correlation_report(&decisions)
            .map_err(|err| anyhow!("failed computing correlation report for {user_id}: {err}"))
    }

    pub fn insights_summary(&self, user_id: UserId) -> Result<InsightsSummary> {
        let decisions = self.list_decisions_for_user(user_id, None)?;
        Ok(summarize(&decisions))
    }

    pub fn emotional_patterns(&self, user_id: UserId) -> Result<Vec<EmotionalPattern>> {
        let decisions = self.list_decisions_for_user(user_id, None)?;
        Ok(emotional_patterns(&decisions))
    }

    pub fn best_emotional_state(&self, user_id: UserId) -> Result<Option<EmotionalPattern>> {
        let patterns = self.emotional_patterns(user_id)?;
        Ok(best_emotional_state(&patterns).cloned())
    }

    /// Inserts the canonical confidence/outcome fixture for one user:
    /// low tier 2/4, medium tier 2/3, high tier 4/4, all reviewed.
    pub fn seed_canonical_decisions(&mut self, user_id: UserId) -> Result<SeedReport> {
        let recorded_at = now_utc();
        let mut inserted = 0_usize;

        for (title, emotional_state, confidence_level, outcome) in CANONICAL_SEED {
            let input = DecisionInput {
                decision_id: None,
                user_id,
                title: title.to_string(),
                confidence_level,
                outcome,
                status: DecisionStatus::Reviewed,
                emotional_state: Some(emotional_state.to_string()),
                recorded_at,
            };
            let _ = self.insert_decision(&input)?;
            inserted += 1;
        }

        Ok(SeedReport { user_id, inserted })
    }

    #[cfg(test)]
    fn connection(&self) -> &Connection {
        &self.conn
    }
}

const CANONICAL_SEED: [(&str, &str, u8, Outcome); 11] = [
    ("Low confidence seed #1", "uncertain", 1, Outcome::Worse),
    ("Low confidence seed #2", "anxious", 2, Outcome::Worse),
    ("Low confidence seed #3", "uncertain", 2, Outcome::Better),
    ("Low confidence seed #4", "neutral", 1, Outcome::Better),
    ("Medium confidence seed #1", "neutral", 3, Outcome::Worse),
    ("Medium confidence seed #2", "calm", 3, Outcome::Better),
    ("Medium confidence seed #3", "neutral", 3, Outcome::Better),
    ("High confidence seed #1", "confident", 5, Outcome::Better),
    ("High confidence seed #2", "confident", 4, Outcome::Better),
    ("High confidence seed #3", "confident", 5, Outcome::Better),
    ("High confidence seed #4", "confident", 4, Outcome::Better),
];

fn parse_decision_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Decision> {
    let decision_id_raw: String = row.get(1)?;
    let user_id_raw: String = row.get(2)?;
    let confidence_i64: i64 = row.get(4)?;
    let outcome_raw: String = row.get(5)?;
    let status_raw: String = row.get(6)?;

    let decision_id = DecisionId(parse_ulid(1, &decision_id_raw)?);
    let user_id = UserId(parse_ulid(2, &user_id_raw)?);

    let confidence_level = u8::try_from(confidence_i64).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Integer,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid confidence_level: {confidence_i64}"),
            )),
        )
    })?;

    let outcome = Outcome::parse(&outcome_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid outcome: {outcome_raw}"),
            )),
        )
    })?;

    let status = DecisionStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid status: {status_raw}"),
            )),
        )
    })?;

    let recorded_at = parse_rfc3339_utc(&row.get::<_, String>(8)?).map_err(to_sql_error)?;

    Ok(Decision {
        decision_seq: row.get(0)?,
        decision_id,
        user_id,
        title: row.get(3)?,
        confidence_level,
        outcome,
        status,
        emotional_state: row.get(7)?,
        recorded_at,
    })
}

fn parse_ulid(column: usize, raw: &str) -> rusqlite::Result<Ulid> {
    Ulid::from_string(raw).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid ULID: {raw}"),
            )),
        )
    })
}

#[allow(clippy::needless_pass_by_value)]
fn to_sql_error(err: decision_journal_core::InsightsError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}

fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

pub fn parse_user_id(raw: &str) -> Result<UserId> {
    let parsed = Ulid::from_string(raw).with_context(|| format!("invalid ULID user_id: {raw}"))?;
    Ok(UserId(parsed))
}
