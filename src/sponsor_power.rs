//! Sponsor voting power
//!
//! A sponsor votes with the summed power of its approved or deposited
//! sponsorships for the event. When nothing qualifies the sponsor still
//! gets `default_weight`.

use std::sync::Arc;

use tracing::debug;

use crate::address::short;
use crate::error::VoteError;
use crate::models::Sponsorship;
use crate::store::{SponsorStore, SponsorshipStore};

/// Sum the positive power of sponsorships that grant voting power
pub fn qualifying_power(sponsorships: &[Sponsorship]) -> f64 {
    sponsorships
        .iter()
        .filter(|s| s.status.grants_voting_power() && s.voting_power > 0.0)
        .map(|s| s.voting_power)
        .sum()
}

#[derive(Clone)]
pub struct SponsorPowerResolver {
    sponsors: Arc<dyn SponsorStore>,
    sponsorships: Arc<dyn SponsorshipStore>,
    default_weight: f64,
}

impl SponsorPowerResolver {
    pub fn new(
        sponsors: Arc<dyn SponsorStore>,
        sponsorships: Arc<dyn SponsorshipStore>,
        default_weight: f64,
    ) -> Self {
        Self {
            sponsors,
            sponsorships,
            default_weight,
        }
    }

    /// Effective weight of the sponsor at `address` (already normalized)
    pub async fn resolve(&self, event_id: i64, address: &str) -> Result<f64, VoteError> {
        let sponsor = self
            .sponsors
            .get_sponsor_by_address(address)
            .await?
            .ok_or_else(|| VoteError::not_found("sponsor with this address not found"))?;

        let sponsorships = self
            .sponsorships
            .get_sponsorships_by_event_and_sponsor(event_id, sponsor.id)
            .await?;

        let power = qualifying_power(&sponsorships);
        if power == 0.0 {
            debug!(
                "Sponsor {} has no qualifying power for event {}, using default weight {}",
                short(address),
                event_id,
                self.default_weight
            );
            return Ok(self.default_weight);
        }

        Ok(power)
    }
}
