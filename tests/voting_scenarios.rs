mod common;

use chrono::{Duration, SubsecRound, Utc};
use hackathon_voting::{
    AddJudgeRequest, CastVoteRequest, ErrorKind, EventStage, SponsorshipStatus, VoteError,
    VoterType,
};

use common::{
    add_sponsor, event, fixture, fixture_with, CLOSED_EVENT, CLOSED_SUBMISSION, ORGANIZER,
    VOTING_EVENT,
};

fn whitelist(weight: f64, max_votes: i64) -> AddJudgeRequest {
    AddJudgeRequest {
        address: "0xBBB".to_string(),
        weight: Some(weight),
        max_votes: Some(max_votes),
        organizer_address: ORGANIZER.to_string(),
    }
}

fn assert_kind<T: std::fmt::Debug>(result: Result<T, VoteError>, kind: ErrorKind) -> VoteError {
    let err = result.unwrap_err();
    assert_eq!(err.kind(), kind, "unexpected error: {}", err);
    err
}

#[tokio::test]
async fn test_scenarios_a_to_d() {
    let f = fixture();
    let svc = &f.service;

    // A: public vote without hint
    let public = svc
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
        .await
        .unwrap();
    assert_eq!(public.weight, 1.0);
    assert_eq!(public.voter_address, "0xaaa");

    // B: judge weight 2.5, quota 1
    svc.add_judge(VOTING_EVENT, &whitelist(2.5, 1)).await.unwrap();
    let judge = svc
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xBBB", VoterType::Judge))
        .await
        .unwrap();
    assert_eq!(judge.weight, 2.5);
    assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 11, "0xBBB", VoterType::Judge))
            .await,
        ErrorKind::LimitExceeded,
    );

    // C: sponsor with one deposited sponsorship of power 4
    add_sponsor(&f.storage, 1, "0xCCC", &[(SponsorshipStatus::Deposited, 4.0)]);
    let sponsor = svc
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xCCC", VoterType::Sponsor))
        .await
        .unwrap();
    assert_eq!(sponsor.weight, 4.0);

    let summary = svc.get_event_summary(VOTING_EVENT).await.unwrap();
    assert_eq!(summary.len(), 1);
    let s10 = &summary[0];
    assert_eq!(s10.submission_id, 10);
    assert_eq!(s10.submission_title, "Project 10");
    assert!((s10.total_weight - 7.5).abs() < 1e-9);
    assert!((s10.public_weight - 1.0).abs() < 1e-9);
    assert!((s10.judge_weight - 2.5).abs() < 1e-9);
    assert!((s10.sponsor_weight - 4.0).abs() < 1e-9);
    assert_eq!(s10.vote_count, 3);

    // D: only the organizer may delete the judge's vote
    assert_kind(
        svc.delete_vote(judge.id, "0xAAA").await,
        ErrorKind::Forbidden,
    );
    svc.delete_vote(judge.id, "  0xorg ").await.unwrap();
    assert_kind(svc.get_vote(judge.id).await, ErrorKind::NotFound);

    let summary = svc.get_event_summary(VOTING_EVENT).await.unwrap();
    assert!((summary[0].total_weight - 5.0).abs() < 1e-9);
    assert_eq!(summary[0].vote_count, 2);
}

#[tokio::test]
async fn test_closed_stage_rejects_every_class() {
    let f = fixture();
    f.service
        .add_judge(
            CLOSED_EVENT,
            &AddJudgeRequest {
                address: "0xBBB".to_string(),
                weight: None,
                max_votes: None,
                organizer_address: ORGANIZER.to_string(),
            },
        )
        .await
        .unwrap();
    add_sponsor(&f.storage, 1, "0xCCC", &[(SponsorshipStatus::Approved, 2.0)]);

    for (address, voter_type) in [
        ("0xBBB", VoterType::Judge),
        ("0xCCC", VoterType::Sponsor),
        ("0xAAA", VoterType::Public),
    ] {
        let err = assert_kind(
            f.service
                .cast_vote(&CastVoteRequest::new(
                    CLOSED_EVENT,
                    CLOSED_SUBMISSION,
                    address,
                    voter_type,
                ))
                .await,
            ErrorKind::InvalidState,
        );
        assert_eq!(err.to_string(), "event is not in voting stage");
    }

    for stage in [EventStage::Awards, EventStage::Ended] {
        f.storage.set_event_stage(VOTING_EVENT, stage).unwrap();
        assert_kind(
            f.service
                .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
                .await,
            ErrorKind::InvalidState,
        );
    }
    assert!(f.service.list_votes_by_event(VOTING_EVENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_voting_window() {
    let now = Utc::now();
    let mut e = event(VOTING_EVENT, EventStage::Voting);
    e.voting_start_time = Some(now - Duration::hours(1));
    e.voting_end_time = Some(now + Duration::hours(1));
    let f = fixture_with(e);
    let req = CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public);

    let err = assert_kind(
        f.service.cast_vote_at(&req, now - Duration::hours(2)).await,
        ErrorKind::InvalidState,
    );
    assert_eq!(err.to_string(), "voting has not started yet");

    let err = assert_kind(
        f.service.cast_vote_at(&req, now + Duration::hours(2)).await,
        ErrorKind::InvalidState,
    );
    assert_eq!(err.to_string(), "voting has already ended");

    let vote = f.service.cast_vote_at(&req, now).await.unwrap();
    assert_eq!(vote.created_at, now.trunc_subsecs(6));
}

#[tokio::test]
async fn test_returned_vote_matches_stored() {
    let f = fixture();
    let vote = f
        .service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
        .await
        .unwrap();

    let stored = f.service.get_vote(vote.id).await.unwrap();
    assert_eq!(stored.created_at, vote.created_at);
    assert_eq!(stored.weight, vote.weight);
    assert_eq!(stored.voter_address, vote.voter_address);
}

#[tokio::test]
async fn test_request_validation_order() {
    let f = fixture();
    let svc = &f.service;

    let err = assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "   ", VoterType::Public))
            .await,
        ErrorKind::InvalidInput,
    );
    assert_eq!(err.to_string(), "invalid voter address");

    assert_kind(
        svc.cast_vote(&CastVoteRequest::new(99, 10, "0xAAA", VoterType::Public))
            .await,
        ErrorKind::NotFound,
    );

    assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 999, "0xAAA", VoterType::Public))
            .await,
        ErrorKind::NotFound,
    );

    let err = assert_kind(
        svc.cast_vote(&CastVoteRequest::new(
            VOTING_EVENT,
            CLOSED_SUBMISSION,
            "0xAAA",
            VoterType::Public,
        ))
        .await,
        ErrorKind::InvalidInput,
    );
    assert_eq!(err.to_string(), "submission does not belong to this event");

    let mut req = CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public);
    req.voter_type = "organizer".to_string();
    let err = assert_kind(svc.cast_vote(&req).await, ErrorKind::InvalidInput);
    assert_eq!(err.to_string(), "unsupported voter type");
}

#[tokio::test]
async fn test_unknown_judge_is_forbidden() {
    let f = fixture();
    let err = assert_kind(
        f.service
            .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xDDD", VoterType::Judge))
            .await,
        ErrorKind::Forbidden,
    );
    assert_eq!(err.to_string(), "address is not on the judge whitelist");
}

#[tokio::test]
async fn test_judge_quota_spans_submissions() {
    let f = fixture();
    let svc = &f.service;
    svc.add_judge(VOTING_EVENT, &whitelist(1.5, 2)).await.unwrap();

    for submission_id in [10, 11] {
        let vote = svc
            .cast_vote(&CastVoteRequest::new(
                VOTING_EVENT,
                submission_id,
                "0xbbb",
                VoterType::Judge,
            ))
            .await
            .unwrap();
        assert_eq!(vote.weight, 1.5);
    }

    let err = assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 12, "0xBBB", VoterType::Judge))
            .await,
        ErrorKind::LimitExceeded,
    );
    assert_eq!(err.to_string(), "judge vote limit (2) reached");
}

#[tokio::test]
async fn test_judge_ignores_weight_hint() {
    let f = fixture();
    f.service
        .add_judge(VOTING_EVENT, &whitelist(2.0, 5))
        .await
        .unwrap();
    let vote = f
        .service
        .cast_vote(
            &CastVoteRequest::new(VOTING_EVENT, 10, "0xBBB", VoterType::Judge).with_weight(50.0),
        )
        .await
        .unwrap();
    assert_eq!(vote.weight, 2.0);
}

#[tokio::test]
async fn test_public_cap_of_three() {
    let f = fixture();
    let svc = &f.service;

    for submission_id in [10, 11, 12] {
        svc.cast_vote(&CastVoteRequest::new(
            VOTING_EVENT,
            submission_id,
            "0xAAA",
            VoterType::Public,
        ))
        .await
        .unwrap();
    }

    let err = assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 13, "0xAAA", VoterType::Public))
            .await,
        ErrorKind::LimitExceeded,
    );
    assert_eq!(err.to_string(), "public voters can only vote 3 times per event");

    // Another voter is unaffected
    svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 13, "0xEEE", VoterType::Public))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_public_weight_hint_and_repeat() {
    let f = fixture();
    let svc = &f.service;

    let vote = svc
        .cast_vote(
            &CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public)
                .with_weight(2.0)
                .with_reason("great demo"),
        )
        .await
        .unwrap();
    assert_eq!(vote.weight, 2.0);
    assert_eq!(vote.reason, "great demo");

    let err = assert_kind(
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xaaa ", VoterType::Public))
            .await,
        ErrorKind::Conflict,
    );
    assert_eq!(
        err.to_string(),
        "public voters can only vote once per submission"
    );
    assert_eq!(svc.list_votes_by_submission(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_vote_hits_ledger_constraint() {
    let f = fixture();
    add_sponsor(&f.storage, 1, "0xCCC", &[(SponsorshipStatus::Approved, 3.0)]);
    let req = CastVoteRequest::new(VOTING_EVENT, 10, "0xCCC", VoterType::Sponsor);

    f.service.cast_vote(&req).await.unwrap();
    let err = assert_kind(f.service.cast_vote(&req).await, ErrorKind::Conflict);
    assert_eq!(err.to_string(), "you already voted for this submission");
    assert_eq!(err.kind().http_status(), 409);

    assert_eq!(f.service.list_votes_by_event(VOTING_EVENT).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_voter_different_class() {
    let f = fixture();
    f.service
        .add_judge(VOTING_EVENT, &whitelist(3.0, 10))
        .await
        .unwrap();

    f.service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xBBB", VoterType::Judge))
        .await
        .unwrap();
    f.service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xBBB", VoterType::Public))
        .await
        .unwrap();

    let summary = f.service.get_event_summary(VOTING_EVENT).await.unwrap();
    assert!((summary[0].total_weight - 4.0).abs() < 1e-9);
    assert_eq!(summary[0].vote_count, 2);
}

#[tokio::test]
async fn test_sponsor_rules() {
    let mut e = event(VOTING_EVENT, EventStage::Voting);
    e.allow_sponsor_voting = false;
    let f = fixture_with(e);
    add_sponsor(&f.storage, 1, "0xCCC", &[(SponsorshipStatus::Deposited, 4.0)]);

    let err = assert_kind(
        f.service
            .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xCCC", VoterType::Sponsor))
            .await,
        ErrorKind::InvalidState,
    );
    assert_eq!(err.to_string(), "sponsor voting is disabled for this event");

    let f = fixture();
    add_sponsor(
        &f.storage,
        2,
        "0xFFF",
        &[
            (SponsorshipStatus::Pending, 10.0),
            (SponsorshipStatus::Rejected, 10.0),
        ],
    );
    let vote = f
        .service
        .cast_vote(
            &CastVoteRequest::new(VOTING_EVENT, 10, "0xFFF", VoterType::Sponsor).with_weight(9.0),
        )
        .await
        .unwrap();
    assert_eq!(vote.weight, 1.0);

    assert_kind(
        f.service
            .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0x999", VoterType::Sponsor))
            .await,
        ErrorKind::NotFound,
    );
}

#[tokio::test]
async fn test_public_disabled() {
    let mut e = event(VOTING_EVENT, EventStage::Voting);
    e.allow_public_voting = false;
    let f = fixture_with(e);

    let err = assert_kind(
        f.service
            .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
            .await,
        ErrorKind::InvalidState,
    );
    assert_eq!(err.to_string(), "public voting is disabled for this event");
}

#[tokio::test]
async fn test_summary_ranking_and_split() {
    let f = fixture();
    let svc = &f.service;
    svc.add_judge(VOTING_EVENT, &whitelist(5.0, 10)).await.unwrap();

    svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 11, "0xBBB", VoterType::Judge))
        .await
        .unwrap();
    for voter in ["0x01", "0x02"] {
        svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 12, voter, VoterType::Public))
            .await
            .unwrap();
    }
    svc.cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0x03", VoterType::Public))
        .await
        .unwrap();

    let summary = svc.get_event_summary(VOTING_EVENT).await.unwrap();
    let order: Vec<i64> = summary.iter().map(|s| s.submission_id).collect();
    assert_eq!(order, vec![11, 12, 10]);

    // Submission 13 has no votes and is absent
    assert!(summary.iter().all(|s| s.submission_id != 13));

    let votes = svc.list_votes_by_event(VOTING_EVENT).await.unwrap();
    for s in &summary {
        let expected: f64 = votes
            .iter()
            .filter(|v| v.submission_id == s.submission_id)
            .map(|v| v.weight)
            .sum();
        assert!((s.total_weight - expected).abs() < 1e-9);
        assert!(
            (s.judge_weight + s.sponsor_weight + s.public_weight - s.total_weight).abs() < 1e-9
        );
    }

    assert!(svc.get_event_summary(CLOSED_EVENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ledger_listing_newest_first() {
    let f = fixture();
    let svc = &f.service;
    let now = Utc::now();

    let first = svc
        .cast_vote_at(
            &CastVoteRequest::new(VOTING_EVENT, 10, "0x01", VoterType::Public),
            now - Duration::minutes(5),
        )
        .await
        .unwrap();
    let second = svc
        .cast_vote_at(
            &CastVoteRequest::new(VOTING_EVENT, 10, "0x02", VoterType::Public),
            now,
        )
        .await
        .unwrap();

    let by_submission = svc.list_votes_by_submission(10).await.unwrap();
    assert_eq!(
        by_submission.iter().map(|v| v.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    let by_event = svc.list_votes_by_event(VOTING_EVENT).await.unwrap();
    assert_eq!(by_event[0].id, second.id);

    let fetched = svc.get_vote(first.id).await.unwrap();
    assert_eq!(fetched.voter_address, "0x01");
    assert_eq!(fetched.voter_type, VoterType::Public);
}

#[tokio::test]
async fn test_delete_vote_checks() {
    let f = fixture();
    let vote = f
        .service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
        .await
        .unwrap();

    assert_kind(f.service.delete_vote(vote.id, "").await, ErrorKind::InvalidInput);
    assert_kind(f.service.delete_vote(9999, ORGANIZER).await, ErrorKind::NotFound);
    assert_kind(f.service.delete_vote(vote.id, "0xAAA").await, ErrorKind::Forbidden);

    f.service.delete_vote(vote.id, ORGANIZER).await.unwrap();
    assert!(f.service.list_votes_by_event(VOTING_EVENT).await.unwrap().is_empty());

    // The voter may vote again once the organizer removed the vote
    f.service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_vote_json_shape() {
    let f = fixture();
    let vote = f
        .service
        .cast_vote(&CastVoteRequest::new(VOTING_EVENT, 10, "0xAAA", VoterType::Public))
        .await
        .unwrap();

    let json = serde_json::to_value(&vote).unwrap();
    assert_eq!(json["voter_type"], "public");
    assert_eq!(json["voter_address"], "0xaaa");
    assert_eq!(json["submission_id"], 10);
    assert_eq!(json["offchain_proof"], "");

    let summary = f.service.get_event_summary(VOTING_EVENT).await.unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json[0]["vote_count"], 1);
    assert_eq!(json[0]["submission_title"], "Project 10");
}
