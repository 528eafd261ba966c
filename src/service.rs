//! Voting service
//!
//! Entry point for the nine voting operations. Storage is injected through
//! the port traits; the service itself holds no mutable state.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info};

use crate::address::{normalize_address, short};
use crate::config::VotingPolicy;
use crate::error::{StoreError, VoteError};
use crate::judges::JudgeWhitelist;
use crate::models::{AddJudgeRequest, CastVoteRequest, JudgeWhitelistEntry, NewVote, Vote};
use crate::sponsor_power::SponsorPowerResolver;
use crate::store::{
    EventStore, JudgeStore, SponsorStore, SponsorshipStore, SubmissionStore, VoteStore,
    VotingStore,
};
use crate::tally::{summarize, VoteSummary};
use crate::weight::{check_voting_open, WeightEngine};

#[derive(Clone)]
pub struct VotingService {
    events: Arc<dyn EventStore>,
    submissions: Arc<dyn SubmissionStore>,
    votes: Arc<dyn VoteStore>,
    whitelist: JudgeWhitelist,
    engine: WeightEngine,
}

impl VotingService {
    pub fn new(
        events: Arc<dyn EventStore>,
        submissions: Arc<dyn SubmissionStore>,
        sponsors: Arc<dyn SponsorStore>,
        sponsorships: Arc<dyn SponsorshipStore>,
        judges: Arc<dyn JudgeStore>,
        votes: Arc<dyn VoteStore>,
        policy: VotingPolicy,
    ) -> Self {
        let whitelist = JudgeWhitelist::new(events.clone(), judges, policy.clone());
        let resolver =
            SponsorPowerResolver::new(sponsors, sponsorships, policy.default_sponsor_weight);
        let engine = WeightEngine::new(whitelist.clone(), resolver, votes.clone(), policy);

        Self {
            events,
            submissions,
            votes,
            whitelist,
            engine,
        }
    }

    /// Wire every port to one backend
    pub fn with_store<S>(store: Arc<S>, policy: VotingPolicy) -> Self
    where
        S: VotingStore + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            policy,
        )
    }

    // ========================================================================
    // CAST VOTE
    // ========================================================================

    pub async fn cast_vote(&self, req: &CastVoteRequest) -> Result<Vote, VoteError> {
        self.cast_vote_at(req, Utc::now()).await
    }

    /// Cast a vote as of `now`
    pub async fn cast_vote_at(
        &self,
        req: &CastVoteRequest,
        now: DateTime<Utc>,
    ) -> Result<Vote, VoteError> {
        let result = self.try_cast_vote(req, now).await;
        if let Err(e) = &result {
            debug!(
                "Rejected {} vote from {} on submission {}: {}",
                req.voter_type,
                short(req.voter_address.trim()),
                req.submission_id,
                e
            );
        }
        result
    }

    async fn try_cast_vote(
        &self,
        req: &CastVoteRequest,
        now: DateTime<Utc>,
    ) -> Result<Vote, VoteError> {
        // Ledger timestamps carry microsecond precision
        let now = now.trunc_subsecs(6);

        let address = normalize_address(&req.voter_address);
        if address.is_empty() {
            return Err(VoteError::invalid_input("invalid voter address"));
        }

        let event = self
            .events
            .get_event_by_id(req.event_id)
            .await?
            .ok_or_else(|| VoteError::not_found("event not found"))?;

        check_voting_open(&event, now)?;

        let submission = self
            .submissions
            .get_submission_by_id(req.submission_id)
            .await?
            .ok_or_else(|| VoteError::not_found("submission not found"))?;

        if submission.event_id != event.id {
            return Err(VoteError::invalid_input(
                "submission does not belong to this event",
            ));
        }

        let (voter_type, weight) = self
            .engine
            .weigh(&req.voter_type, &event, submission.id, &address, req.weight)
            .await?;

        let new_vote = NewVote {
            event_id: event.id,
            submission_id: submission.id,
            voter_address: address,
            voter_type,
            weight,
            reason: req.reason.clone().unwrap_or_default(),
            signature: req.signature.clone().unwrap_or_default(),
            offchain_proof: req.offchain_proof.clone().unwrap_or_default(),
            created_at: now,
        };

        let vote = match self.votes.create_vote(&new_vote).await {
            Ok(vote) => vote,
            Err(StoreError::UniqueViolation(_)) => {
                return Err(VoteError::conflict("you already voted for this submission"))
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Recorded {} vote #{} from {} on submission {} (weight {})",
            vote.voter_type,
            vote.id,
            short(&vote.voter_address),
            vote.submission_id,
            vote.weight
        );
        Ok(vote)
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    pub async fn list_votes_by_event(&self, event_id: i64) -> Result<Vec<Vote>, VoteError> {
        Ok(self.votes.list_votes_by_event(event_id).await?)
    }

    pub async fn list_votes_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<Vote>, VoteError> {
        Ok(self.votes.list_votes_by_submission(submission_id).await?)
    }

    pub async fn get_vote(&self, id: i64) -> Result<Vote, VoteError> {
        self.votes
            .get_vote_by_id(id)
            .await?
            .ok_or_else(|| VoteError::not_found("vote not found"))
    }

    /// Delete a vote; only the organizer of the vote's event may do this
    pub async fn delete_vote(&self, id: i64, organizer_address: &str) -> Result<(), VoteError> {
        if normalize_address(organizer_address).is_empty() {
            return Err(VoteError::invalid_input("organizer_address is required"));
        }

        let vote = self.get_vote(id).await?;

        let event = self
            .events
            .get_event_by_id(vote.event_id)
            .await?
            .ok_or_else(|| VoteError::not_found("event not found"))?;

        if !event.is_organizer(organizer_address) {
            return Err(VoteError::forbidden("only the organizer can delete votes"));
        }

        self.votes.delete_vote(id).await?;

        info!(
            "Deleted {} vote #{} from {} on submission {}",
            vote.voter_type,
            vote.id,
            short(&vote.voter_address),
            vote.submission_id
        );
        Ok(())
    }

    /// Leaderboard for the event, highest total weight first
    pub async fn get_event_summary(&self, event_id: i64) -> Result<Vec<VoteSummary>, VoteError> {
        let rows = self.votes.summary_rows_by_event(event_id).await?;
        Ok(summarize(rows))
    }

    // ========================================================================
    // JUDGES
    // ========================================================================

    pub async fn add_judge(
        &self,
        event_id: i64,
        req: &AddJudgeRequest,
    ) -> Result<JudgeWhitelistEntry, VoteError> {
        self.whitelist.add_judge(event_id, req).await
    }

    pub async fn list_judges(&self, event_id: i64) -> Result<Vec<JudgeWhitelistEntry>, VoteError> {
        self.whitelist.list_judges(event_id).await
    }

    pub async fn remove_judge(
        &self,
        event_id: i64,
        judge_id: i64,
        organizer_address: &str,
    ) -> Result<(), VoteError> {
        self.whitelist
            .remove_judge(event_id, judge_id, organizer_address)
            .await
    }
}
