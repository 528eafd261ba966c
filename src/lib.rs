//! Hackathon Voting - weighted voting and leaderboard tally for hackathon events
//!
//! Three constituencies vote on an event's submissions, each with its own
//! weight and limits.
//!
//! # How it works
//!
//! 1. The organizer whitelists judges with a weight and a vote quota
//! 2. Once the event enters its voting stage, votes are cast per submission
//! 3. Judges vote with their whitelist weight, sponsors with the voting
//!    power of their approved or deposited sponsorships, the public with
//!    weight 1 (or a positive hint)
//! 4. The leaderboard sums weights per submission, split by voter class
//!
//! # Anti-abuse measures
//!
//! - One vote per (event, submission, voter, class), enforced by a unique index
//! - Judges are capped at `max_votes` votes per event
//! - Public voters may vote on at most 3 submissions per event
//! - Only the organizer can manage judges or delete votes

pub mod address;
pub mod config;
pub mod error;
pub mod judges;
pub mod logging;
pub mod models;
pub mod pg_storage;
pub mod service;
pub mod sponsor_power;
pub mod storage;
pub mod store;
pub mod tally;
pub mod weight;

pub use address::normalize_address;
pub use config::{
    Config, DatabaseConfig, VotingPolicy, DEFAULT_JUDGE_MAX_VOTES, DEFAULT_JUDGE_WEIGHT,
    DEFAULT_SPONSOR_WEIGHT, MAX_PUBLIC_VOTES_PER_EVENT,
};
pub use error::{ErrorKind, StoreError, VoteError};
pub use models::{
    AddJudgeRequest, CastVoteRequest, Event, EventStage, JudgeWhitelistEntry, Sponsor,
    Sponsorship, SponsorshipStatus, Submission, Vote, VoterType,
};
pub use pg_storage::PgStorage;
pub use service::VotingService;
pub use storage::SqliteStorage;
pub use tally::VoteSummary;
