//! PostgreSQL Storage for the voting core
//!
//! Production backend for every storage port. Connects with DATABASE_URL;
//! the unique indexes from the embedded migrations reject duplicate votes
//! and judges across concurrent connections.

use anyhow::Result;
use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, PoolError, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use crate::address::normalize_address;
use crate::config::{Config as VotingConfig, DatabaseConfig};
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

const VOTE_COLUMNS: &str = "id, event_id, submission_id, voter_address, voter_type, weight, \
                            reason, signature, offchain_proof, created_at";

const JUDGE_COLUMNS: &str = "id, event_id, address, weight, max_votes, created_at";

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        StoreError::Backend(err.into())
    }
}

fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn event_from_row(r: &Row) -> Result<Event> {
    Ok(Event {
        id: r.get(0),
        name: r.get(1),
        current_stage: r.get::<_, String>(2).parse()?,
        voting_start_time: r.get(3),
        voting_end_time: r.get(4),
        allow_sponsor_voting: r.get(5),
        allow_public_voting: r.get(6),
        organizer_address: r.get(7),
    })
}

/// BIGINT quota column back to `u32`; out-of-range values are an error,
/// never "no quota"
fn max_votes_from_db(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow::anyhow!("judge max_votes out of range: {}", value))
}

fn judge_from_row(r: &Row) -> Result<JudgeWhitelistEntry> {
    Ok(JudgeWhitelistEntry {
        id: r.get(0),
        event_id: r.get(1),
        address: r.get(2),
        weight: r.get(3),
        max_votes: max_votes_from_db(r.get(4))?,
        created_at: r.get(5),
    })
}

fn vote_from_row(r: &Row) -> Result<Vote> {
    Ok(Vote {
        id: r.get(0),
        event_id: r.get(1),
        submission_id: r.get(2),
        voter_address: r.get(3),
        voter_type: r.get::<_, String>(4).parse()?,
        weight: r.get(5),
        reason: r.get(6),
        signature: r.get(7),
        offchain_proof: r.get(8),
        created_at: r.get(9),
    })
}

// ============================================================================
// PG STORAGE
// ============================================================================

#[derive(Clone)]
pub struct PgStorage {
    pool: Pool,
}

impl PgStorage {
    /// Create storage from a database URL
    pub async fn new(database_url: &str, db: &DatabaseConfig) -> Result<Self> {
        use deadpool_postgres::{ManagerConfig, PoolConfig, RecyclingMethod};
        use std::time::Duration;

        let mut config = Config::new();
        config.url = Some(database_url.to_string());

        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        config.pool = Some(PoolConfig {
            max_size: db.pool_max_size,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(db.query_timeout_secs)),
                create: Some(Duration::from_secs(10)),
                recycle: Some(Duration::from_secs(30)),
            },
            ..Default::default()
        });

        let pool = config.create_pool(Some(Runtime::Tokio1), NoTls)?;

        // Test connection
        let client = pool.get().await?;
        client
            .execute(
                &format!("SET statement_timeout = '{}s'", db.query_timeout_secs),
                &[],
            )
            .await?;

        info!(
            "Connected to PostgreSQL (pool_size: {}, query_timeout: {}s)",
            db.pool_max_size, db.query_timeout_secs
        );

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create storage from DATABASE_URL with the pool settings of `config`
    pub async fn from_config(config: &VotingConfig) -> Result<Self> {
        let url = config
            .database_url()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL not set"))?;
        Self::new(&url, &config.database).await
    }

    /// Run embedded migrations
    async fn run_migrations(&self) -> Result<()> {
        let client = self.pool.get().await?;

        let exists: bool = client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_name = 'schema_migrations')",
                &[],
            )
            .await?
            .get(0);

        if !exists {
            let migration_sql = include_str!("../migrations/001_schema.sql");
            client.batch_execute(migration_sql).await?;
            info!("Applied migration 001_schema");
        }

        Ok(())
    }

    // ========================================================================
    // SEEDING (collaborator-owned tables)
    // ========================================================================

    /// Insert an event with the given id
    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO events (id, name, current_stage, voting_start_time, voting_end_time,
                                     allow_sponsor_voting, allow_public_voting, organizer_address)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &event.id,
                    &event.name,
                    &event.current_stage.as_str(),
                    &event.voting_start_time,
                    &event.voting_end_time,
                    &event.allow_sponsor_voting,
                    &event.allow_public_voting,
                    &event.organizer_address,
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn set_event_stage(&self, event_id: i64, stage: EventStage) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "UPDATE events SET current_stage = $1 WHERE id = $2",
                &[&stage.as_str(), &event_id],
            )
            .await?;
        Ok(())
    }

    pub async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO submissions (id, event_id, title) VALUES ($1, $2, $3)",
                &[&submission.id, &submission.event_id, &submission.title],
            )
            .await?;
        Ok(())
    }

    /// Insert a sponsor; the address is stored normalized
    pub async fn insert_sponsor(&self, sponsor: &Sponsor) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO sponsors (id, name, address) VALUES ($1, $2, $3)",
                &[
                    &sponsor.id,
                    &sponsor.name,
                    &normalize_address(&sponsor.address),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn insert_sponsorship(&self, sponsorship: &Sponsorship) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO sponsorships (id, event_id, sponsor_id, status, voting_power)
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &sponsorship.id,
                    &sponsorship.event_id,
                    &sponsorship.sponsor_id,
                    &sponsorship.status.as_str(),
                    &sponsorship.voting_power,
                ],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for PgStorage {
    async fn get_event_by_id(&self, id: i64) -> StoreResult<Option<Event>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, current_stage, voting_start_time, voting_end_time,
                        allow_sponsor_voting, allow_public_voting, organizer_address
                 FROM events WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(event_from_row).transpose()?)
    }
}

#[async_trait]
impl SubmissionStore for PgStorage {
    async fn get_submission_by_id(&self, id: i64) -> StoreResult<Option<Submission>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, event_id, title FROM submissions WHERE id = $1",
                &[&id],
            )
            .await?;

        Ok(row.map(|r| Submission {
            id: r.get(0),
            event_id: r.get(1),
            title: r.get(2),
        }))
    }
}

#[async_trait]
impl SponsorStore for PgStorage {
    async fn get_sponsor_by_address(&self, address: &str) -> StoreResult<Option<Sponsor>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, address FROM sponsors WHERE address = $1",
                &[&address],
            )
            .await?;

        Ok(row.map(|r| Sponsor {
            id: r.get(0),
            name: r.get(1),
            address: r.get(2),
        }))
    }
}

#[async_trait]
impl SponsorshipStore for PgStorage {
    async fn get_sponsorships_by_event_and_sponsor(
        &self,
        event_id: i64,
        sponsor_id: i64,
    ) -> StoreResult<Vec<Sponsorship>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, event_id, sponsor_id, status, voting_power
                 FROM sponsorships WHERE event_id = $1 AND sponsor_id = $2 ORDER BY id",
                &[&event_id, &sponsor_id],
            )
            .await?;

        let sponsorships = rows
            .iter()
            .map(|r| -> Result<Sponsorship> {
                Ok(Sponsorship {
                    id: r.get(0),
                    event_id: r.get(1),
                    sponsor_id: r.get(2),
                    status: r.get::<_, String>(3).parse()?,
                    voting_power: r.get(4),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(sponsorships)
    }
}

#[async_trait]
impl JudgeStore for PgStorage {
    async fn create_judge(&self, judge: &NewJudge) -> StoreResult<JudgeWhitelistEntry> {
        let client = self.pool.get().await?;
        let result = client
            .query_one(
                &format!(
                    "INSERT INTO event_judges (event_id, address, weight, max_votes, created_at)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING {}",
                    JUDGE_COLUMNS
                ),
                &[
                    &judge.event_id,
                    &judge.address,
                    &judge.weight,
                    &i64::from(judge.max_votes),
                    &judge.created_at,
                ],
            )
            .await;

        match result {
            Ok(row) => Ok(judge_from_row(&row)?),
            Err(e) if is_unique_violation(&e) => {
                debug!("Judge {} already whitelisted", judge.address);
                Err(StoreError::UniqueViolation(JUDGES_UNIQUE_INDEX))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_judges_by_event(&self, event_id: i64) -> StoreResult<Vec<JudgeWhitelistEntry>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM event_judges WHERE event_id = $1 ORDER BY id ASC",
                    JUDGE_COLUMNS
                ),
                &[&event_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(judge_from_row)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn get_judge_by_event_and_address(
        &self,
        event_id: i64,
        address: &str,
    ) -> StoreResult<Option<JudgeWhitelistEntry>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM event_judges WHERE event_id = $1 AND address = $2",
                    JUDGE_COLUMNS
                ),
                &[&event_id, &address],
            )
            .await?;

        Ok(row.as_ref().map(judge_from_row).transpose()?)
    }

    async fn get_judge_by_id(&self, id: i64) -> StoreResult<Option<JudgeWhitelistEntry>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM event_judges WHERE id = $1", JUDGE_COLUMNS),
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(judge_from_row).transpose()?)
    }

    async fn delete_judge(&self, id: i64) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM event_judges WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VoteStore for PgStorage {
    async fn create_vote(&self, vote: &NewVote) -> StoreResult<Vote> {
        let client = self.pool.get().await?;
        let result = client
            .query_one(
                &format!(
                    "INSERT INTO votes (event_id, submission_id, voter_address, voter_type, weight,
                                        reason, signature, offchain_proof, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                     RETURNING {}",
                    VOTE_COLUMNS
                ),
                &[
                    &vote.event_id,
                    &vote.submission_id,
                    &vote.voter_address,
                    &vote.voter_type.as_str(),
                    &vote.weight,
                    &vote.reason,
                    &vote.signature,
                    &vote.offchain_proof,
                    &vote.created_at,
                ],
            )
            .await;

        match result {
            Ok(row) => Ok(vote_from_row(&row)?),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::UniqueViolation(VOTES_UNIQUE_INDEX))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_vote_by_id(&self, id: i64) -> StoreResult<Option<Vote>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM votes WHERE id = $1", VOTE_COLUMNS),
                &[&id],
            )
            .await?;

        Ok(row.as_ref().map(vote_from_row).transpose()?)
    }

    async fn list_votes_by_event(&self, event_id: i64) -> StoreResult<Vec<Vote>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM votes WHERE event_id = $1 ORDER BY created_at DESC, id DESC",
                    VOTE_COLUMNS
                ),
                &[&event_id],
            )
            .await?;

        Ok(rows.iter().map(vote_from_row).collect::<Result<Vec<_>>>()?)
    }

    async fn list_votes_by_submission(&self, submission_id: i64) -> StoreResult<Vec<Vote>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM votes WHERE submission_id = $1 ORDER BY created_at DESC, id DESC",
                    VOTE_COLUMNS
                ),
                &[&submission_id],
            )
            .await?;

        Ok(rows.iter().map(vote_from_row).collect::<Result<Vec<_>>>()?)
    }

    async fn delete_vote(&self, id: i64) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM votes WHERE id = $1", &[&id])
            .await?;
        Ok(())
    }

    async fn count_by_event_and_voter(
        &self,
        event_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let count: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM votes
                 WHERE event_id = $1 AND voter_address = $2 AND voter_type = $3",
                &[&event_id, &address, &voter_type.as_str()],
            )
            .await?
            .get(0);
        Ok(count as u64)
    }

    async fn count_by_submission_and_voter(
        &self,
        submission_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let count: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM votes
                 WHERE submission_id = $1 AND voter_address = $2 AND voter_type = $3",
                &[&submission_id, &address, &voter_type.as_str()],
            )
            .await?
            .get(0);
        Ok(count as u64)
    }

    async fn summary_rows_by_event(&self, event_id: i64) -> StoreResult<Vec<TallyRow>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT votes.submission_id, submissions.title, votes.voter_type, votes.weight
                 FROM votes
                 JOIN submissions ON submissions.id = votes.submission_id
                 WHERE votes.event_id = $1",
                &[&event_id],
            )
            .await?;

        let tally = rows
            .iter()
            .map(|r| -> Result<TallyRow> {
                Ok(TallyRow {
                    submission_id: r.get(0),
                    submission_title: r.get(1),
                    voter_type: r.get::<_, String>(2).parse()?,
                    weight: r.get(3),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(tally)
    }
}
