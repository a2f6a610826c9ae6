mod common;

use std::collections::HashSet;

use gifoff_storage::dto::challenge::RatingOutcome;
use gifoff_storage::models::{NewRatingSnapshot, Phase};
use gifoff_storage::services::RatingUpdate;
use gifoff_storage::{ConflictKind, LeagueStore, StorageError};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use uuid::Uuid;

use common::League;

#[tokio::test]
async fn test_close_records_winner_and_rates_everyone() {
    let league = League::new(&["ann", "bob", "cat"]).await;
    let challenge = league
        .scored_challenge("Mondays", &[("ann", 10), ("bob", 5), ("cat", 3)])
        .await;

    let mut rng = StdRng::seed_from_u64(7);
    let outcome = league
        .lifecycle
        .close(challenge.challenge_id, &mut rng)
        .await
        .unwrap();

    let ann = league.player("ann").player_id;
    assert_eq!(outcome.challenge.winner_id, Some(ann));
    assert_eq!(outcome.high_score, Decimal::from(10));
    assert_eq!(outcome.challenge.phase(Utc::now()), Phase::Complete);
    assert!(outcome.advisories.is_empty());

    let ranks: Vec<u32> = outcome.ranking.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let RatingOutcome::Applied { snapshots } = outcome.ratings else {
        panic!("expected ratings to be applied");
    };
    assert_eq!(snapshots.len(), 3);
    let mu = |id: Uuid| snapshots.iter().find(|s| s.player_id == id).unwrap().mu;
    assert!(mu(ann) > 25.0);
    assert!(mu(league.player("cat").player_id) < 25.0);
}

#[tokio::test]
async fn test_second_close_is_already_closed() {
    let league = League::new(&["ann", "bob"]).await;
    let challenge = league
        .scored_challenge("Twice", &[("ann", 4), ("bob", 4)])
        .await;

    let mut rng = StdRng::seed_from_u64(1);
    let first = league
        .lifecycle
        .close(challenge.challenge_id, &mut rng)
        .await
        .unwrap();

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let again = league.lifecycle.close(challenge.challenge_id, &mut rng).await;
        assert!(matches!(
            again,
            Err(StorageError::Conflict(ConflictKind::AlreadyClosed))
        ));
    }

    let stored = league.store.find_challenge(challenge.challenge_id).await.unwrap();
    assert_eq!(stored.winner_id, first.challenge.winner_id);
    assert_eq!(stored.phase(Utc::now()), Phase::Complete);
}

#[tokio::test]
async fn test_close_without_scores_has_no_winner() {
    let league = League::new(&["ann", "bob"]).await;
    let (challenge, prompt) = league.active_challenge("Unscored").await;
    league.enter(&prompt, "ann", None).await;
    league.enter(&prompt, "bob", Some(0)).await;

    let mut rng = StdRng::seed_from_u64(3);
    let result = league.lifecycle.close(challenge.challenge_id, &mut rng).await;
    assert!(matches!(
        result,
        Err(StorageError::Conflict(ConflictKind::NoWinner))
    ));

    let stored = league.store.find_challenge(challenge.challenge_id).await.unwrap();
    assert_eq!(stored.winner_id, None);
    assert_eq!(stored.phase(Utc::now()), Phase::Active);
    let rated = league
        .store
        .challenge_snapshots(&[challenge.challenge_id])
        .await
        .unwrap();
    assert!(rated.is_empty());
}

#[tokio::test]
async fn test_close_without_entries_has_no_winner() {
    let league = League::new(&["ann"]).await;
    let (challenge, _) = league.active_challenge("Empty").await;

    let mut rng = StdRng::seed_from_u64(3);
    let result = league.lifecycle.close(challenge.challenge_id, &mut rng).await;
    assert!(matches!(
        result,
        Err(StorageError::Conflict(ConflictKind::NoWinner))
    ));
}

#[tokio::test]
async fn test_close_missing_challenge_is_not_found() {
    let league = League::new(&["ann"]).await;
    let mut rng = StdRng::seed_from_u64(3);
    let result = league.lifecycle.close(Uuid::new_v4(), &mut rng).await;
    assert!(matches!(result, Err(StorageError::NotFound("challenge"))));
}

#[tokio::test]
async fn test_single_participant_skips_ratings() {
    let league = League::new(&["ann", "bob"]).await;
    let challenge = league.scored_challenge("Solo", &[("ann", 8)]).await;

    let mut rng = StdRng::seed_from_u64(11);
    let outcome = league
        .lifecycle
        .close(challenge.challenge_id, &mut rng)
        .await
        .unwrap();

    assert!(matches!(outcome.ratings, RatingOutcome::Skipped));
    assert_eq!(outcome.challenge.winner_id, Some(league.player("ann").player_id));
}

#[tokio::test]
async fn test_rating_failure_does_not_undo_close() {
    let league = League::new(&["ann", "bob"]).await;
    let challenge = league
        .scored_challenge("Clashing", &[("ann", 9), ("bob", 2)])
        .await;

    // A stray write already rated this challenge, so the close cannot append.
    let ann = league.player("ann").player_id;
    let latest = league
        .store
        .latest_snapshots(league.group.group_id, &[ann])
        .await
        .unwrap();
    league
        .store
        .append_snapshots(
            league.group.group_id,
            Some(challenge.challenge_id),
            &[NewRatingSnapshot {
                player_id: ann,
                mu: 26.0,
                sigma: 8.0,
                based_on: latest.get(&ann).map(|s| s.snapshot_id),
            }],
        )
        .await
        .unwrap();

    let mut rng = StdRng::seed_from_u64(5);
    let outcome = league
        .lifecycle
        .close(challenge.challenge_id, &mut rng)
        .await
        .unwrap();

    assert!(matches!(outcome.ratings, RatingOutcome::Deferred { .. }));
    let stored = league.store.find_challenge(challenge.challenge_id).await.unwrap();
    assert_eq!(stored.winner_id, Some(ann));
}

#[tokio::test]
async fn test_retry_ratings() {
    let league = League::new(&["ann", "bob"]).await;
    let open = league
        .scored_challenge("Open", &[("ann", 3), ("bob", 1)])
        .await;

    let not_closed = league.lifecycle.retry_ratings(open.challenge_id).await;
    assert!(matches!(
        not_closed,
        Err(StorageError::Conflict(ConflictKind::NoWinner))
    ));

    let mut rng = StdRng::seed_from_u64(2);
    league
        .lifecycle
        .close(open.challenge_id, &mut rng)
        .await
        .unwrap();

    let again = league.lifecycle.retry_ratings(open.challenge_id).await;
    assert!(matches!(
        again,
        Err(StorageError::Conflict(ConflictKind::RatingsAlreadyApplied))
    ));
}

#[tokio::test]
async fn test_retry_applies_deferred_ratings() {
    let league = League::new(&["ann", "bob"]).await;
    let challenge = league
        .scored_challenge("Later", &[("ann", 6), ("bob", 2)])
        .await;

    // Record the winner without rating, as a close that failed after commit would.
    let ann = league.player("ann").player_id;
    league
        .store
        .record_winner(challenge.challenge_id, ann)
        .await
        .unwrap();

    let update = league
        .lifecycle
        .retry_ratings(challenge.challenge_id)
        .await
        .unwrap();
    let RatingUpdate::Applied(snapshots) = update else {
        panic!("expected ratings to be applied");
    };
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots.iter().all(|s| s.challenge_id == Some(challenge.challenge_id)));
}

#[tokio::test]
async fn test_snapshot_history_is_append_only() {
    let league = League::new(&["ann", "bob", "cat"]).await;
    let group_id = league.group.group_id;

    let mut before: HashSet<(Uuid, i64)> = HashSet::new();
    for round in 0..4 {
        let challenge = league
            .scored_challenge(
                &format!("Round {round}"),
                &[("ann", 5 + round), ("bob", 7 - round), ("cat", 4)],
            )
            .await;
        let mut rng = StdRng::seed_from_u64(round as u64);
        league
            .lifecycle
            .close(challenge.challenge_id, &mut rng)
            .await
            .unwrap();

        let mut after = HashSet::new();
        for player in &league.players {
            for s in league
                .store
                .player_snapshots(group_id, player.player_id)
                .await
                .unwrap()
            {
                after.insert((s.snapshot_id, s.snapshot_seq));
            }
        }
        assert!(before.is_subset(&after));
        assert!(after.len() > before.len());
        before = after;
    }
}

#[tokio::test]
async fn test_repeated_winner_mu_never_drops() {
    let league = League::new(&["ann", "bob", "cat"]).await;
    let ann = league.player("ann").player_id;

    for round in 0..6 {
        let challenge = league
            .scored_challenge(
                &format!("Week {round}"),
                &[("ann", 10), ("bob", 6), ("cat", 2)],
            )
            .await;
        let mut rng = StdRng::seed_from_u64(round);
        league
            .lifecycle
            .close(challenge.challenge_id, &mut rng)
            .await
            .unwrap();
    }

    let history = league
        .store
        .player_snapshots(league.group.group_id, ann)
        .await
        .unwrap();
    assert_eq!(history.len(), 7);
    for pair in history.windows(2) {
        assert!(pair[1].mu >= pair[0].mu, "{} then {}", pair[0].mu, pair[1].mu);
        assert!(pair[1].snapshot_seq > pair[0].snapshot_seq);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_closes_in_one_group_keep_every_update() {
    let league = League::new(&["ann", "bob"]).await;
    let first = league
        .scored_challenge("Left", &[("ann", 5), ("bob", 1)])
        .await;
    let second = league
        .scored_challenge("Right", &[("ann", 1), ("bob", 5)])
        .await;

    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(2);
    let (a, b) = tokio::join!(
        league.lifecycle.close(first.challenge_id, &mut rng_a),
        league.lifecycle.close(second.challenge_id, &mut rng_b),
    );
    assert!(matches!(a.unwrap().ratings, RatingOutcome::Applied { .. }));
    assert!(matches!(b.unwrap().ratings, RatingOutcome::Applied { .. }));

    for player in &league.players {
        let history = league
            .store
            .player_snapshots(league.group.group_id, player.player_id)
            .await
            .unwrap();
        // Baseline plus one snapshot per challenge.
        assert_eq!(history.len(), 3);
    }
}

#[tokio::test]
async fn test_judge_is_previous_winner() {
    let league = League::new(&["ann", "bob"]).await;
    let first = league
        .scored_challenge("First", &[("ann", 1), ("bob", 9)])
        .await;
    assert_eq!(
        league.lifecycle.judge(&first).await.unwrap(),
        league.player("ann").player_id
    );

    let mut rng = StdRng::seed_from_u64(0);
    league
        .lifecycle
        .close(first.challenge_id, &mut rng)
        .await
        .unwrap();

    let (second, _) = league.active_challenge("Second").await;
    assert_eq!(
        league.lifecycle.judge(&second).await.unwrap(),
        league.player("bob").player_id
    );

    let detail = league
        .lifecycle
        .detail(second.challenge_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(detail.judge_id, league.player("bob").player_id);
    assert_eq!(detail.summary.phase, Phase::Active);
}

#[tokio::test]
async fn test_author_must_be_member() {
    let league = League::new(&["ann"]).await;
    let outsider = league
        .groups
        .create_player(gifoff_storage::models::NewPlayer {
            display_name: "eve".to_string(),
            email: None,
        })
        .await
        .unwrap();

    let now = Utc::now();
    let result = league
        .lifecycle
        .create_challenge(
            league.group.group_id,
            "Outsider".to_string(),
            None,
            gifoff_storage::models::TimeWindow::starting_at(now),
            outsider.player_id,
        )
        .await;
    assert!(matches!(result, Err(StorageError::Validation(_))));
}
