//! Local SQLite storage for the voting core
//!
//! Backs every storage port with a single connection. Statements are
//! serialized by the connection mutex; duplicate votes and judges are
//! rejected by the unique indexes created in [`SCHEMA`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::address::normalize_address;
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::{
    Event, EventStage, JudgeWhitelistEntry, NewJudge, NewVote, Sponsor, Sponsorship, Submission,
    Vote, VoterType,
};
use crate::store::{
    EventStore, JudgeStore, SponsorStore, SponsorshipStore, StoreResult, SubmissionStore,
    VoteStore, JUDGES_UNIQUE_INDEX, VOTES_UNIQUE_INDEX,
};
use crate::tally::TallyRow;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    current_stage TEXT NOT NULL DEFAULT 'registration',
    voting_start_time TEXT,
    voting_end_time TEXT,
    allow_sponsor_voting INTEGER NOT NULL DEFAULT 0,
    allow_public_voting INTEGER NOT NULL DEFAULT 0,
    organizer_address TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL,
    title TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sponsors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sponsorships (
    id INTEGER PRIMARY KEY,
    event_id INTEGER NOT NULL,
    sponsor_id INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    voting_power REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS event_judges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL,
    address TEXT NOT NULL,
    weight REAL NOT NULL DEFAULT 1,
    max_votes INTEGER NOT NULL DEFAULT 100,
    created_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_event_judge_address ON event_judges (event_id, address);

CREATE TABLE IF NOT EXISTS votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL,
    submission_id INTEGER NOT NULL,
    voter_address TEXT NOT NULL,
    voter_type TEXT NOT NULL,
    weight REAL NOT NULL DEFAULT 1,
    reason TEXT NOT NULL DEFAULT '',
    signature TEXT NOT NULL DEFAULT '',
    offchain_proof TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_vote_submission_voter
    ON votes (event_id, submission_id, voter_address, voter_type);
CREATE INDEX IF NOT EXISTS idx_votes_event ON votes (event_id);
CREATE INDEX IF NOT EXISTS idx_votes_submission ON votes (submission_id);
"#;

const VOTE_COLUMNS: &str = "id, event_id, submission_id, voter_address, voter_type, weight, \
                            reason, signature, offchain_proof, created_at";

const JUDGE_COLUMNS: &str = "id, event_id, address, weight, max_votes, created_at";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    // Fixed width so that ORDER BY on the text column is chronological
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}

fn parse_enum<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        current_stage: parse_enum(2, &row.get::<_, String>(2)?)?,
        voting_start_time: parse_opt_ts(3, row.get(3)?)?,
        voting_end_time: parse_opt_ts(4, row.get(4)?)?,
        allow_sponsor_voting: row.get(5)?,
        allow_public_voting: row.get(6)?,
        organizer_address: row.get(7)?,
    })
}

fn judge_from_row(row: &Row<'_>) -> rusqlite::Result<JudgeWhitelistEntry> {
    Ok(JudgeWhitelistEntry {
        id: row.get(0)?,
        event_id: row.get(1)?,
        address: row.get(2)?,
        weight: row.get(3)?,
        max_votes: row.get(4)?,
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
    })
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    Ok(Vote {
        id: row.get(0)?,
        event_id: row.get(1)?,
        submission_id: row.get(2)?,
        voter_address: row.get(3)?,
        voter_type: parse_enum(4, &row.get::<_, String>(4)?)?,
        weight: row.get(5)?,
        reason: row.get(6)?,
        signature: row.get(7)?,
        offchain_proof: row.get(8)?,
        created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
    })
}

impl SqliteStorage {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.run_migrations()?;
        info!("Opened SQLite storage at {}", path.display());
        Ok(storage)
    }

    /// Open the file at `sqlite_path`
    pub fn from_config(db: &DatabaseConfig) -> Result<Self> {
        Self::new(&db.sqlite_path)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // SEEDING (collaborator-owned tables)
    // ========================================================================

    /// Insert an event with the given id
    pub fn insert_event(&self, event: &Event) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO events (id, name, current_stage, voting_start_time, voting_end_time,
                                 allow_sponsor_voting, allow_public_voting, organizer_address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.id,
                event.name,
                event.current_stage.as_str(),
                event.voting_start_time.as_ref().map(format_ts),
                event.voting_end_time.as_ref().map(format_ts),
                event.allow_sponsor_voting,
                event.allow_public_voting,
                event.organizer_address,
            ],
        )?;
        Ok(())
    }

    pub fn set_event_stage(&self, event_id: i64, stage: EventStage) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE events SET current_stage = ?1 WHERE id = ?2",
            params![stage.as_str(), event_id],
        )?;
        Ok(())
    }

    pub fn insert_submission(&self, submission: &Submission) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO submissions (id, event_id, title) VALUES (?1, ?2, ?3)",
            params![submission.id, submission.event_id, submission.title],
        )?;
        Ok(())
    }

    /// Insert a sponsor; the address is stored normalized
    pub fn insert_sponsor(&self, sponsor: &Sponsor) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sponsors (id, name, address) VALUES (?1, ?2, ?3)",
            params![sponsor.id, sponsor.name, normalize_address(&sponsor.address)],
        )?;
        Ok(())
    }

    pub fn insert_sponsorship(&self, sponsorship: &Sponsorship) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sponsorships (id, event_id, sponsor_id, status, voting_power)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sponsorship.id,
                sponsorship.event_id,
                sponsorship.sponsor_id,
                sponsorship.status.as_str(),
                sponsorship.voting_power,
            ],
        )?;
        Ok(())
    }

    // ========================================================================
    // READS
    // ========================================================================

    fn event(&self, id: i64) -> StoreResult<Option<Event>> {
        let conn = self.conn.lock();
        let event = conn
            .query_row(
                "SELECT id, name, current_stage, voting_start_time, voting_end_time,
                        allow_sponsor_voting, allow_public_voting, organizer_address
                 FROM events WHERE id = ?1",
                params![id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    fn submission(&self, id: i64) -> StoreResult<Option<Submission>> {
        let conn = self.conn.lock();
        let submission = conn
            .query_row(
                "SELECT id, event_id, title FROM submissions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Submission {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        title: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(submission)
    }

    fn sponsor_by_address(&self, address: &str) -> StoreResult<Option<Sponsor>> {
        let conn = self.conn.lock();
        let sponsor = conn
            .query_row(
                "SELECT id, name, address FROM sponsors WHERE address = ?1",
                params![address],
                |row| {
                    Ok(Sponsor {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        address: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(sponsor)
    }

    fn sponsorships(&self, event_id: i64, sponsor_id: i64) -> StoreResult<Vec<Sponsorship>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, event_id, sponsor_id, status, voting_power
             FROM sponsorships WHERE event_id = ?1 AND sponsor_id = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![event_id, sponsor_id], |row| {
                Ok(Sponsorship {
                    id: row.get(0)?,
                    event_id: row.get(1)?,
                    sponsor_id: row.get(2)?,
                    status: parse_enum(3, &row.get::<_, String>(3)?)?,
                    voting_power: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ========================================================================
    // JUDGE WHITELIST
    // ========================================================================

    fn insert_judge(&self, judge: &NewJudge) -> StoreResult<JudgeWhitelistEntry> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO event_judges (event_id, address, weight, max_votes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                judge.event_id,
                judge.address,
                judge.weight,
                judge.max_votes,
                format_ts(&judge.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(JudgeWhitelistEntry {
                id: conn.last_insert_rowid(),
                event_id: judge.event_id,
                address: judge.address.clone(),
                weight: judge.weight,
                max_votes: judge.max_votes,
                created_at: judge.created_at,
            }),
            Err(e) if is_unique_violation(&e) => {
                debug!("Judge {} already whitelisted", judge.address);
                Err(StoreError::UniqueViolation(JUDGES_UNIQUE_INDEX))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn judges_by_event(&self, event_id: i64) -> StoreResult<Vec<JudgeWhitelistEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM event_judges WHERE event_id = ?1 ORDER BY id ASC",
            JUDGE_COLUMNS
        ))?;
        let judges = stmt
            .query_map(params![event_id], judge_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(judges)
    }

    fn judge_by_event_and_address(
        &self,
        event_id: i64,
        address: &str,
    ) -> StoreResult<Option<JudgeWhitelistEntry>> {
        let conn = self.conn.lock();
        let judge = conn
            .query_row(
                &format!(
                    "SELECT {} FROM event_judges WHERE event_id = ?1 AND address = ?2",
                    JUDGE_COLUMNS
                ),
                params![event_id, address],
                judge_from_row,
            )
            .optional()?;
        Ok(judge)
    }

    fn judge_by_id(&self, id: i64) -> StoreResult<Option<JudgeWhitelistEntry>> {
        let conn = self.conn.lock();
        let judge = conn
            .query_row(
                &format!("SELECT {} FROM event_judges WHERE id = ?1", JUDGE_COLUMNS),
                params![id],
                judge_from_row,
            )
            .optional()?;
        Ok(judge)
    }

    fn remove_judge(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM event_judges WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ========================================================================
    // VOTE LEDGER
    // ========================================================================

    fn insert_vote(&self, vote: &NewVote) -> StoreResult<Vote> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO votes (event_id, submission_id, voter_address, voter_type, weight,
                                reason, signature, offchain_proof, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                vote.event_id,
                vote.submission_id,
                vote.voter_address,
                vote.voter_type.as_str(),
                vote.weight,
                vote.reason,
                vote.signature,
                vote.offchain_proof,
                format_ts(&vote.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(Vote {
                id: conn.last_insert_rowid(),
                event_id: vote.event_id,
                submission_id: vote.submission_id,
                voter_address: vote.voter_address.clone(),
                voter_type: vote.voter_type,
                weight: vote.weight,
                reason: vote.reason.clone(),
                signature: vote.signature.clone(),
                offchain_proof: vote.offchain_proof.clone(),
                created_at: vote.created_at,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::UniqueViolation(VOTES_UNIQUE_INDEX))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn vote_by_id(&self, id: i64) -> StoreResult<Option<Vote>> {
        let conn = self.conn.lock();
        let vote = conn
            .query_row(
                &format!("SELECT {} FROM votes WHERE id = ?1", VOTE_COLUMNS),
                params![id],
                vote_from_row,
            )
            .optional()?;
        Ok(vote)
    }

    fn votes_where(&self, column: &str, value: i64) -> StoreResult<Vec<Vote>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM votes WHERE {} = ?1 ORDER BY created_at DESC, id DESC",
            VOTE_COLUMNS, column
        ))?;
        let votes = stmt
            .query_map(params![value], vote_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(votes)
    }

    fn remove_vote(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM votes WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn count_votes(
        &self,
        column: &str,
        value: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM votes WHERE {} = ?1 AND voter_address = ?2 AND voter_type = ?3",
                column
            ),
            params![value, address, voter_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn tally_rows(&self, event_id: i64) -> StoreResult<Vec<TallyRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT votes.submission_id, submissions.title, votes.voter_type, votes.weight
             FROM votes
             JOIN submissions ON submissions.id = votes.submission_id
             WHERE votes.event_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![event_id], |row| {
                Ok(TallyRow {
                    submission_id: row.get(0)?,
                    submission_title: row.get(1)?,
                    voter_type: parse_enum(2, &row.get::<_, String>(2)?)?,
                    weight: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl EventStore for SqliteStorage {
    async fn get_event_by_id(&self, id: i64) -> StoreResult<Option<Event>> {
        self.event(id)
    }
}

#[async_trait]
impl SubmissionStore for SqliteStorage {
    async fn get_submission_by_id(&self, id: i64) -> StoreResult<Option<Submission>> {
        self.submission(id)
    }
}

#[async_trait]
impl SponsorStore for SqliteStorage {
    async fn get_sponsor_by_address(&self, address: &str) -> StoreResult<Option<Sponsor>> {
        self.sponsor_by_address(address)
    }
}

#[async_trait]
impl SponsorshipStore for SqliteStorage {
    async fn get_sponsorships_by_event_and_sponsor(
        &self,
        event_id: i64,
        sponsor_id: i64,
    ) -> StoreResult<Vec<Sponsorship>> {
        self.sponsorships(event_id, sponsor_id)
    }
}

#[async_trait]
impl JudgeStore for SqliteStorage {
    async fn create_judge(&self, judge: &NewJudge) -> StoreResult<JudgeWhitelistEntry> {
        self.insert_judge(judge)
    }

    async fn list_judges_by_event(&self, event_id: i64) -> StoreResult<Vec<JudgeWhitelistEntry>> {
        self.judges_by_event(event_id)
    }

    async fn get_judge_by_event_and_address(
        &self,
        event_id: i64,
        address: &str,
    ) -> StoreResult<Option<JudgeWhitelistEntry>> {
        self.judge_by_event_and_address(event_id, address)
    }

    async fn get_judge_by_id(&self, id: i64) -> StoreResult<Option<JudgeWhitelistEntry>> {
        self.judge_by_id(id)
    }

    async fn delete_judge(&self, id: i64) -> StoreResult<()> {
        self.remove_judge(id)
    }
}

#[async_trait]
impl VoteStore for SqliteStorage {
    async fn create_vote(&self, vote: &NewVote) -> StoreResult<Vote> {
        self.insert_vote(vote)
    }

    async fn get_vote_by_id(&self, id: i64) -> StoreResult<Option<Vote>> {
        self.vote_by_id(id)
    }

    async fn list_votes_by_event(&self, event_id: i64) -> StoreResult<Vec<Vote>> {
        self.votes_where("event_id", event_id)
    }

    async fn list_votes_by_submission(&self, submission_id: i64) -> StoreResult<Vec<Vote>> {
        self.votes_where("submission_id", submission_id)
    }

    async fn delete_vote(&self, id: i64) -> StoreResult<()> {
        self.remove_vote(id)
    }

    async fn count_by_event_and_voter(
        &self,
        event_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64> {
        self.count_votes("event_id", event_id, address, voter_type)
    }

    async fn count_by_submission_and_voter(
        &self,
        submission_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64> {
        self.count_votes("submission_id", submission_id, address, voter_type)
    }

    async fn summary_rows_by_event(&self, event_id: i64) -> StoreResult<Vec<TallyRow>> {
        self.tally_rows(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_vote(submission_id: i64, address: &str, voter_type: VoterType) -> NewVote {
        NewVote {
            event_id: 1,
            submission_id,
            voter_address: address.to_string(),
            voter_type,
            weight: 1.0,
            reason: String::new(),
            signature: String::new(),
            offchain_proof: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_storage_in_memory() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage
            .insert_event(&Event {
                id: 1,
                name: "Hack Week".to_string(),
                current_stage: EventStage::Voting,
                voting_start_time: None,
                voting_end_time: Some(Utc::now()),
                allow_sponsor_voting: true,
                allow_public_voting: false,
                organizer_address: "0xorg".to_string(),
            })
            .unwrap();

        let event = storage.event(1).unwrap().unwrap();
        assert_eq!(event.current_stage, EventStage::Voting);
        assert!(event.allow_sponsor_voting);
        assert!(!event.allow_public_voting);
        assert!(event.voting_end_time.is_some());
        assert!(storage.event(2).unwrap().is_none());
    }

    #[test]
    fn test_storage_from_config_path() {
        let path = std::env::temp_dir().join(format!(
            "hackathon-voting-test-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let db = DatabaseConfig {
            sqlite_path: path.to_string_lossy().into_owned(),
            ..Default::default()
        };

        {
            let storage = SqliteStorage::from_config(&db).unwrap();
            storage
                .insert_vote(&new_vote(10, "0xaaa", VoterType::Public))
                .unwrap();
        }

        // Reopening the same file keeps the ledger
        let reopened = SqliteStorage::from_config(&db).unwrap();
        assert_eq!(reopened.votes_where("event_id", 1).unwrap().len(), 1);
        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_vote_unique_index() {
        let storage = SqliteStorage::in_memory().unwrap();

        storage
            .insert_vote(&new_vote(10, "0xaaa", VoterType::Public))
            .unwrap();
        let dup = storage.insert_vote(&new_vote(10, "0xaaa", VoterType::Public));
        assert!(matches!(
            dup,
            Err(StoreError::UniqueViolation(VOTES_UNIQUE_INDEX))
        ));

        // Same voter under a different class is a different ledger row
        storage
            .insert_vote(&new_vote(10, "0xaaa", VoterType::Judge))
            .unwrap();
        assert_eq!(
            storage
                .count_votes("event_id", 1, "0xaaa", VoterType::Public)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_votes_newest_first() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = storage
            .insert_vote(&new_vote(10, "0xaaa", VoterType::Public))
            .unwrap();
        let second = storage
            .insert_vote(&new_vote(11, "0xaaa", VoterType::Public))
            .unwrap();

        let votes = storage.votes_where("event_id", 1).unwrap();
        assert_eq!(votes[0].id, second.id);
        assert_eq!(votes[1].id, first.id);
    }

    #[test]
    fn test_judge_unique_index() {
        let storage = SqliteStorage::in_memory().unwrap();
        let judge = NewJudge {
            event_id: 1,
            address: "0xbbb".to_string(),
            weight: 2.5,
            max_votes: 1,
            created_at: Utc::now(),
        };

        let entry = storage.insert_judge(&judge).unwrap();
        assert!(matches!(
            storage.insert_judge(&judge),
            Err(StoreError::UniqueViolation(JUDGES_UNIQUE_INDEX))
        ));

        storage.remove_judge(entry.id).unwrap();
        let again = storage.insert_judge(&judge).unwrap();
        assert_ne!(again.id, entry.id);
    }
}
