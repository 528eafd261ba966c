//! Vote admissibility and weight
//!
//! Rules per voter class:
//! - judge: must be whitelisted; weight from the whitelist; quota of
//!   `max_votes` votes per event
//! - sponsor: event must allow sponsor voting; weight from sponsorships
//! - public: event must allow public voting; one vote per submission and
//!   `max_public_votes_per_event` per event; weight from the request hint
//!   or 1
//!
//! Vote counts read here are advisory. Duplicates racing past them are
//! rejected by the ledger's unique index.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::VotingPolicy;
use crate::error::VoteError;
use crate::judges::JudgeWhitelist;
use crate::models::{Event, EventStage, VoterType};
use crate::sponsor_power::SponsorPowerResolver;
use crate::store::VoteStore;

/// Weight of a public vote without a usable hint
pub const DEFAULT_PUBLIC_WEIGHT: f64 = 1.0;

/// Check the event accepts votes at `now`
pub fn check_voting_open(event: &Event, now: DateTime<Utc>) -> Result<(), VoteError> {
    if event.current_stage != EventStage::Voting {
        return Err(VoteError::invalid_state("event is not in voting stage"));
    }

    if let Some(start) = event.voting_start_time {
        if now < start {
            return Err(VoteError::invalid_state("voting has not started yet"));
        }
    }

    if let Some(end) = event.voting_end_time {
        if now > end {
            return Err(VoteError::invalid_state("voting has already ended"));
        }
    }

    Ok(())
}

/// Public weight: the caller's hint when positive and finite
pub fn public_weight(hint: Option<f64>) -> f64 {
    match hint {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => DEFAULT_PUBLIC_WEIGHT,
    }
}

#[derive(Clone)]
pub struct WeightEngine {
    whitelist: JudgeWhitelist,
    sponsors: SponsorPowerResolver,
    votes: Arc<dyn VoteStore>,
    policy: VotingPolicy,
}

impl WeightEngine {
    pub fn new(
        whitelist: JudgeWhitelist,
        sponsors: SponsorPowerResolver,
        votes: Arc<dyn VoteStore>,
        policy: VotingPolicy,
    ) -> Self {
        Self {
            whitelist,
            sponsors,
            votes,
            policy,
        }
    }

    /// Parse the voter class and compute the weight of its vote.
    ///
    /// `address` must already be normalized. Nothing is written.
    pub async fn weigh(
        &self,
        voter_type: &str,
        event: &Event,
        submission_id: i64,
        address: &str,
        hint: Option<f64>,
    ) -> Result<(VoterType, f64), VoteError> {
        let voter_type: VoterType = voter_type
            .parse()
            .map_err(|_| VoteError::invalid_input("unsupported voter type"))?;

        let weight = match voter_type {
            VoterType::Judge => self.judge_weight(event, address).await?,
            VoterType::Sponsor => self.sponsor_weight(event, address).await?,
            VoterType::Public => self.public_weight(event, submission_id, address, hint).await?,
        };

        Ok((voter_type, weight))
    }

    async fn judge_weight(&self, event: &Event, address: &str) -> Result<f64, VoteError> {
        let judge = match self.whitelist.lookup(event.id, address).await {
            Ok(judge) => judge,
            Err(VoteError::NotFound(msg)) => return Err(VoteError::Forbidden(msg)),
            Err(e) => return Err(e),
        };

        if judge.weight <= 0.0 {
            return Err(VoteError::invalid_state(
                "judge weight must be greater than zero",
            ));
        }

        if judge.max_votes > 0 {
            let cast = self
                .votes
                .count_by_event_and_voter(event.id, address, VoterType::Judge)
                .await?;
            if cast >= u64::from(judge.max_votes) {
                return Err(VoteError::LimitExceeded(format!(
                    "judge vote limit ({}) reached",
                    judge.max_votes
                )));
            }
        }

        Ok(judge.weight)
    }

    async fn sponsor_weight(&self, event: &Event, address: &str) -> Result<f64, VoteError> {
        if !event.allow_sponsor_voting {
            return Err(VoteError::invalid_state(
                "sponsor voting is disabled for this event",
            ));
        }

        self.sponsors.resolve(event.id, address).await
    }

    async fn public_weight(
        &self,
        event: &Event,
        submission_id: i64,
        address: &str,
        hint: Option<f64>,
    ) -> Result<f64, VoteError> {
        if !event.allow_public_voting {
            return Err(VoteError::invalid_state(
                "public voting is disabled for this event",
            ));
        }

        let on_submission = self
            .votes
            .count_by_submission_and_voter(submission_id, address, VoterType::Public)
            .await?;
        if on_submission > 0 {
            return Err(VoteError::conflict(
                "public voters can only vote once per submission",
            ));
        }

        let in_event = self
            .votes
            .count_by_event_and_voter(event.id, address, VoterType::Public)
            .await?;
        if in_event >= u64::from(self.policy.max_public_votes_per_event) {
            return Err(VoteError::LimitExceeded(format!(
                "public voters can only vote {} times per event",
                self.policy.max_public_votes_per_event
            )));
        }

        Ok(public_weight(hint))
    }
}
