//! Domain records shared by the voting core and its storage adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// EXTERNAL ENTITIES (read only)
// ============================================================================

/// Lifecycle stage of an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStage {
    Registration,
    #[serde(rename = "checkin")]
    CheckIn,
    Submission,
    Voting,
    Awards,
    Ended,
}

impl EventStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStage::Registration => "registration",
            EventStage::CheckIn => "checkin",
            EventStage::Submission => "submission",
            EventStage::Voting => "voting",
            EventStage::Awards => "awards",
            EventStage::Ended => "ended",
        }
    }
}

impl FromStr for EventStage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(EventStage::Registration),
            "checkin" => Ok(EventStage::CheckIn),
            "submission" => Ok(EventStage::Submission),
            "voting" => Ok(EventStage::Voting),
            "awards" => Ok(EventStage::Awards),
            "ended" => Ok(EventStage::Ended),
            other => Err(UnknownVariant::new("event stage", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub current_stage: EventStage,
    pub voting_start_time: Option<DateTime<Utc>>,
    pub voting_end_time: Option<DateTime<Utc>>,
    pub allow_sponsor_voting: bool,
    pub allow_public_voting: bool,
    pub organizer_address: String,
}

impl Event {
    /// Whether `address` is this event's organizer, compared normalized
    pub fn is_organizer(&self, address: &str) -> bool {
        crate::address::same_address(&self.organizer_address, address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub event_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: i64,
    pub name: String,
    pub address: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorshipStatus {
    Pending,
    Approved,
    Rejected,
    Deposited,
}

impl SponsorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SponsorshipStatus::Pending => "pending",
            SponsorshipStatus::Approved => "approved",
            SponsorshipStatus::Rejected => "rejected",
            SponsorshipStatus::Deposited => "deposited",
        }
    }

    /// Approved and deposited sponsorships carry voting power
    pub fn grants_voting_power(&self) -> bool {
        matches!(
            self,
            SponsorshipStatus::Approved | SponsorshipStatus::Deposited
        )
    }
}

impl FromStr for SponsorshipStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SponsorshipStatus::Pending),
            "approved" => Ok(SponsorshipStatus::Approved),
            "rejected" => Ok(SponsorshipStatus::Rejected),
            "deposited" => Ok(SponsorshipStatus::Deposited),
            other => Err(UnknownVariant::new("sponsorship status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sponsorship {
    pub id: i64,
    pub event_id: i64,
    pub sponsor_id: i64,
    pub status: SponsorshipStatus,
    pub voting_power: f64,
}

// ============================================================================
// JUDGE WHITELIST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeWhitelistEntry {
    pub id: i64,
    pub event_id: i64,
    pub address: String,
    pub weight: f64,
    pub max_votes: u32,
    pub created_at: DateTime<Utc>,
}

/// Whitelist row before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewJudge {
    pub event_id: i64,
    pub address: String,
    pub weight: f64,
    pub max_votes: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddJudgeRequest {
    pub address: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub max_votes: Option<i64>,
    pub organizer_address: String,
}

// ============================================================================
// VOTES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoterType {
    Judge,
    Sponsor,
    Public,
}

impl VoterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoterType::Judge => "judge",
            VoterType::Sponsor => "sponsor",
            VoterType::Public => "public",
        }
    }
}

impl fmt::Display for VoterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoterType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "judge" => Ok(VoterType::Judge),
            "sponsor" => Ok(VoterType::Sponsor),
            "public" => Ok(VoterType::Public),
            other => Err(UnknownVariant::new("voter type", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub event_id: i64,
    pub submission_id: i64,
    pub voter_address: String,
    pub voter_type: VoterType,
    pub weight: f64,
    pub reason: String,
    pub signature: String,
    pub offchain_proof: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger row before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewVote {
    pub event_id: i64,
    pub submission_id: i64,
    pub voter_address: String,
    pub voter_type: VoterType,
    pub weight: f64,
    pub reason: String,
    pub signature: String,
    pub offchain_proof: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for casting a vote.
///
/// `voter_type` stays a raw string so an unknown class is rejected by the
/// weight engine with the other policy errors. `weight` is only honored for
/// public voters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastVoteRequest {
    pub event_id: i64,
    pub submission_id: i64,
    pub voter_address: String,
    pub voter_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub offchain_proof: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl CastVoteRequest {
    pub fn new(
        event_id: i64,
        submission_id: i64,
        voter_address: impl Into<String>,
        voter_type: VoterType,
    ) -> Self {
        Self {
            event_id,
            submission_id,
            voter_address: voter_address.into(),
            voter_type: voter_type.as_str().to_string(),
            reason: None,
            signature: None,
            offchain_proof: None,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voter_type_roundtrip_names() {
        for vt in [VoterType::Judge, VoterType::Sponsor, VoterType::Public] {
            assert_eq!(vt.as_str().parse::<VoterType>().unwrap(), vt);
        }
        assert!("organizer".parse::<VoterType>().is_err());
        assert!("Judge".parse::<VoterType>().is_err());
    }

    #[test]
    fn test_stage_serde_names() {
        let json = serde_json::to_string(&EventStage::CheckIn).unwrap();
        assert_eq!(json, "\"checkin\"");
        let stage: EventStage = serde_json::from_str("\"voting\"").unwrap();
        assert_eq!(stage, EventStage::Voting);
    }

    #[test]
    fn test_sponsorship_power_statuses() {
        assert!(SponsorshipStatus::Approved.grants_voting_power());
        assert!(SponsorshipStatus::Deposited.grants_voting_power());
        assert!(!SponsorshipStatus::Pending.grants_voting_power());
        assert!(!SponsorshipStatus::Rejected.grants_voting_power());
    }

    #[test]
    fn test_cast_vote_request_from_json() {
        let req: CastVoteRequest = serde_json::from_str(
            r#"{"event_id":1,"submission_id":10,"voter_address":"0xAAA","voter_type":"public"}"#,
        )
        .unwrap();
        assert_eq!(req.voter_type, "public");
        assert!(req.weight.is_none());
        assert!(req.reason.is_none());
    }
}
