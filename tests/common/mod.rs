#![allow(dead_code)]

use std::sync::Arc;

use hackathon_voting::{
    logging, Event, EventStage, Sponsor, Sponsorship, SponsorshipStatus, SqliteStorage,
    Submission, VotingPolicy, VotingService,
};

pub const ORGANIZER: &str = "0xORG";
pub const VOTING_EVENT: i64 = 1;
pub const CLOSED_EVENT: i64 = 2;
pub const CLOSED_SUBMISSION: i64 = 20;

pub struct Fixture {
    pub storage: Arc<SqliteStorage>,
    pub service: Arc<VotingService>,
}

pub fn event(id: i64, stage: EventStage) -> Event {
    Event {
        id,
        name: format!("Hackathon {}", id),
        current_stage: stage,
        voting_start_time: None,
        voting_end_time: None,
        allow_sponsor_voting: true,
        allow_public_voting: true,
        organizer_address: ORGANIZER.to_string(),
    }
}

pub fn submission(id: i64, event_id: i64) -> Submission {
    Submission {
        id,
        event_id,
        title: format!("Project {}", id),
    }
}

/// Event 1 in voting with submissions 10-13, event 2 still collecting
/// submissions with submission 20
pub fn fixture() -> Fixture {
    fixture_with(event(VOTING_EVENT, EventStage::Voting))
}

pub fn fixture_with(voting_event: Event) -> Fixture {
    let _ = logging::init("warn");

    let storage = Arc::new(SqliteStorage::in_memory().unwrap());
    storage.insert_event(&voting_event).unwrap();
    storage
        .insert_event(&event(CLOSED_EVENT, EventStage::Submission))
        .unwrap();

    for id in 10..=13 {
        storage.insert_submission(&submission(id, VOTING_EVENT)).unwrap();
    }
    storage
        .insert_submission(&submission(CLOSED_SUBMISSION, CLOSED_EVENT))
        .unwrap();

    let service = Arc::new(VotingService::with_store(
        storage.clone(),
        VotingPolicy::default(),
    ));

    Fixture { storage, service }
}

pub fn add_sponsor(storage: &SqliteStorage, id: i64, address: &str, powers: &[(SponsorshipStatus, f64)]) {
    storage
        .insert_sponsor(&Sponsor {
            id,
            name: format!("Sponsor {}", id),
            address: address.to_string(),
        })
        .unwrap();

    for (i, (status, power)) in powers.iter().enumerate() {
        storage
            .insert_sponsorship(&Sponsorship {
                id: id * 100 + i as i64,
                event_id: VOTING_EVENT,
                sponsor_id: id,
                status: *status,
                voting_power: *power,
            })
            .unwrap();
    }
}
