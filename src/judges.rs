//! Judge whitelist
//!
//! Per-event allow-list of judge addresses with a vote weight and a vote
//! quota. Only the event organizer may add or remove entries.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::address::{normalize_address, short};
use crate::config::VotingPolicy;
use crate::error::{StoreError, VoteError};
use crate::models::{AddJudgeRequest, Event, JudgeWhitelistEntry, NewJudge};
use crate::store::{EventStore, JudgeStore};

const NOT_ORGANIZER: &str = "only the organizer can manage judges";

/// Weight to store for a judge: the requested one when it is positive
pub fn effective_judge_weight(requested: Option<f64>, policy: &VotingPolicy) -> f64 {
    match requested {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => policy.default_judge_weight,
    }
}

/// Quota to store for a judge: the requested one when it is positive
pub fn effective_max_votes(requested: Option<i64>, policy: &VotingPolicy) -> u32 {
    match requested {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => policy.default_judge_max_votes,
    }
}

#[derive(Clone)]
pub struct JudgeWhitelist {
    events: Arc<dyn EventStore>,
    judges: Arc<dyn JudgeStore>,
    policy: VotingPolicy,
}

impl JudgeWhitelist {
    pub fn new(
        events: Arc<dyn EventStore>,
        judges: Arc<dyn JudgeStore>,
        policy: VotingPolicy,
    ) -> Self {
        Self {
            events,
            judges,
            policy,
        }
    }

    /// Load the event and check the caller is its organizer
    async fn organized_event(
        &self,
        event_id: i64,
        organizer_address: &str,
    ) -> Result<Event, VoteError> {
        if normalize_address(organizer_address).is_empty() {
            return Err(VoteError::invalid_input("organizer_address is required"));
        }

        let event = self
            .events
            .get_event_by_id(event_id)
            .await?
            .ok_or_else(|| VoteError::not_found("event not found"))?;

        if !event.is_organizer(organizer_address) {
            return Err(VoteError::forbidden(NOT_ORGANIZER));
        }

        Ok(event)
    }

    pub async fn add_judge(
        &self,
        event_id: i64,
        req: &AddJudgeRequest,
    ) -> Result<JudgeWhitelistEntry, VoteError> {
        self.organized_event(event_id, &req.organizer_address).await?;

        let address = normalize_address(&req.address);
        if address.is_empty() {
            return Err(VoteError::invalid_input("invalid address"));
        }

        let judge = NewJudge {
            event_id,
            address,
            weight: effective_judge_weight(req.weight, &self.policy),
            max_votes: effective_max_votes(req.max_votes, &self.policy),
            created_at: Utc::now(),
        };

        let entry = match self.judges.create_judge(&judge).await {
            Ok(entry) => entry,
            Err(StoreError::UniqueViolation(_)) => {
                return Err(VoteError::conflict(
                    "address already exists in judge whitelist",
                ))
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Whitelisted judge {} for event {} (weight {}, max votes {})",
            short(&entry.address),
            event_id,
            entry.weight,
            entry.max_votes
        );
        Ok(entry)
    }

    pub async fn list_judges(&self, event_id: i64) -> Result<Vec<JudgeWhitelistEntry>, VoteError> {
        Ok(self.judges.list_judges_by_event(event_id).await?)
    }

    pub async fn remove_judge(
        &self,
        event_id: i64,
        judge_id: i64,
        organizer_address: &str,
    ) -> Result<(), VoteError> {
        self.organized_event(event_id, organizer_address).await?;

        let judge = self
            .judges
            .get_judge_by_id(judge_id)
            .await?
            .filter(|j| j.event_id == event_id)
            .ok_or_else(|| VoteError::not_found("judge does not belong to this event"))?;

        self.judges.delete_judge(judge.id).await?;

        info!(
            "Removed judge {} from event {}",
            short(&judge.address),
            event_id
        );
        Ok(())
    }

    /// Whitelist entry for an already normalized address
    pub async fn lookup(
        &self,
        event_id: i64,
        address: &str,
    ) -> Result<JudgeWhitelistEntry, VoteError> {
        self.judges
            .get_judge_by_event_and_address(event_id, address)
            .await?
            .ok_or_else(|| VoteError::not_found("address is not on the judge whitelist"))
    }
}
