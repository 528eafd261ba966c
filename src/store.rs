//! Storage ports
//!
//! The voting core reads events, submissions, sponsors and sponsorships
//! through these traits and owns the judge whitelist and vote ledger.
//! Implementations must enforce the unique indexes atomically:
//! - votes: (event_id, submission_id, voter_address, voter_type)
//! - judges: (event_id, address)

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    Event, JudgeWhitelistEntry, NewJudge, NewVote, Sponsor, Sponsorship, Submission, Vote,
    VoterType,
};
use crate::tally::TallyRow;

pub type StoreResult<T> = Result<T, StoreError>;

pub const VOTES_UNIQUE_INDEX: &str = "idx_vote_submission_voter";
pub const JUDGES_UNIQUE_INDEX: &str = "idx_event_judge_address";

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get_event_by_id(&self, id: i64) -> StoreResult<Option<Event>>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get_submission_by_id(&self, id: i64) -> StoreResult<Option<Submission>>;
}

#[async_trait]
pub trait SponsorStore: Send + Sync {
    /// `address` is already normalized
    async fn get_sponsor_by_address(&self, address: &str) -> StoreResult<Option<Sponsor>>;
}

#[async_trait]
pub trait SponsorshipStore: Send + Sync {
    async fn get_sponsorships_by_event_and_sponsor(
        &self,
        event_id: i64,
        sponsor_id: i64,
    ) -> StoreResult<Vec<Sponsorship>>;
}

#[async_trait]
pub trait JudgeStore: Send + Sync {
    /// Fails with `UniqueViolation` when (event_id, address) exists
    async fn create_judge(&self, judge: &NewJudge) -> StoreResult<JudgeWhitelistEntry>;

    /// Insertion order
    async fn list_judges_by_event(&self, event_id: i64) -> StoreResult<Vec<JudgeWhitelistEntry>>;

    async fn get_judge_by_event_and_address(
        &self,
        event_id: i64,
        address: &str,
    ) -> StoreResult<Option<JudgeWhitelistEntry>>;

    async fn get_judge_by_id(&self, id: i64) -> StoreResult<Option<JudgeWhitelistEntry>>;

    async fn delete_judge(&self, id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Fails with `UniqueViolation` when the voter already voted on the
    /// submission with the same class
    async fn create_vote(&self, vote: &NewVote) -> StoreResult<Vote>;

    async fn get_vote_by_id(&self, id: i64) -> StoreResult<Option<Vote>>;

    /// Newest first
    async fn list_votes_by_event(&self, event_id: i64) -> StoreResult<Vec<Vote>>;

    /// Newest first
    async fn list_votes_by_submission(&self, submission_id: i64) -> StoreResult<Vec<Vote>>;

    async fn delete_vote(&self, id: i64) -> StoreResult<()>;

    async fn count_by_event_and_voter(
        &self,
        event_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64>;

    async fn count_by_submission_and_voter(
        &self,
        submission_id: i64,
        address: &str,
        voter_type: VoterType,
    ) -> StoreResult<u64>;

    /// One row per vote of the event, joined with its submission title
    async fn summary_rows_by_event(&self, event_id: i64) -> StoreResult<Vec<TallyRow>>;
}

/// A backend that serves every port, like the bundled SQLite and
/// PostgreSQL adapters
pub trait VotingStore:
    EventStore + SubmissionStore + SponsorStore + SponsorshipStore + JudgeStore + VoteStore
{
}

impl<T> VotingStore for T where
    T: EventStore + SubmissionStore + SponsorStore + SponsorshipStore + JudgeStore + VoteStore
{
}
