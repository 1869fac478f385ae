//! End-to-end acceptance flows against a live database. Run with a
//! provisioned Postgres and TEST_DATABASE_URL set:
//!
//!     cargo test -- --ignored

mod common;

use common::*;
use engine::services::acceptance::{
    accept_score, reject_score, AcceptScoreOutcome, AcceptScoreParams, RejectScoreParams,
};
use engine::services::queue::{self, sync_bracket_queue, sync_seeding_queue};
use engine::EngineError;
use infra::repos::bracket_games::{CreateBracketGame, GameStatus};
use infra::repos::game_queue::QueueStatus;
use infra::repos::score_submissions::SubmissionStatus;
use infra::repos::{bracket_games, game_queue, seeding_scores};
use serde_json::json;

fn accept(submission_id: uuid::Uuid) -> AcceptScoreParams {
    AcceptScoreParams {
        submission_id,
        force: false,
        reviewer_id: None,
    }
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_accept_seeding_score_then_double_accept_fails() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Double Accept Event", 3).await;
    let team = create_test_team(&pool, event.id, 1).await;

    let submission = create_seeding_submission(
        &pool,
        event.id,
        json!({ "team_number": 1, "round_number": 1, "score": 150.0 }),
    )
    .await;

    let outcome = accept_score(&pool, accept(submission.id))
        .await
        .expect("first acceptance should succeed");

    match outcome {
        AcceptScoreOutcome::Seeding {
            submission,
            seeding_score,
            rankings,
        } => {
            assert_eq!(submission.status, SubmissionStatus::Accepted);
            assert_eq!(submission.seeding_score_id, Some(seeding_score.id));
            assert_eq!(seeding_score.score, Some(150.0));
            assert_eq!(rankings.teams_ranked, 1);
        }
        AcceptScoreOutcome::Bracket { .. } => panic!("expected a seeding outcome"),
    }

    // Second acceptance of the same submission is refused and makes no
    // further ledger writes.
    let err = accept_score(&pool, accept(submission.id))
        .await
        .expect_err("second acceptance must fail");
    assert!(matches!(err, EngineError::BadRequest(_)));

    let scores = seeding_scores::list_by_team(&pool, team.id)
        .await
        .expect("list scores");
    assert_eq!(scores.len(), 1);
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_seeding_conflict_returns_both_values_and_force_overwrites() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Conflict Event", 3).await;
    let team = create_test_team(&pool, event.id, 1).await;

    let first = create_seeding_submission(
        &pool,
        event.id,
        json!({ "team_number": 1, "round_number": 1, "score": 100.0 }),
    )
    .await;
    accept_score(&pool, accept(first.id))
        .await
        .expect("first acceptance should succeed");

    let second = create_seeding_submission(
        &pool,
        event.id,
        json!({ "team_number": 1, "round_number": 1, "score": 120.0 }),
    )
    .await;

    let err = accept_score(&pool, accept(second.id))
        .await
        .expect_err("contending score must conflict");
    match err {
        EngineError::Conflict {
            existing,
            submitted,
            ..
        } => {
            assert_eq!(existing["score"], json!(100.0));
            assert_eq!(submitted["score"], json!(120.0));
        }
        other => panic!("expected Conflict, got {:?}", other),
    }

    accept_score(
        &pool,
        AcceptScoreParams {
            submission_id: second.id,
            force: true,
            reviewer_id: None,
        },
    )
    .await
    .expect("forced acceptance should succeed");

    let score = seeding_scores::get_by_team_round(&pool, team.id, 1)
        .await
        .expect("get score")
        .expect("score exists");
    assert_eq!(score.score, Some(120.0));
    assert_eq!(score.submission_id, Some(second.id));
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_bracket_winner_must_occupy_a_slot() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Wrong Winner Event", 3).await;
    let team_a = create_test_team(&pool, event.id, 1).await;
    let team_b = create_test_team(&pool, event.id, 2).await;
    let outsider = create_test_team(&pool, event.id, 3).await;
    let bracket = create_test_bracket(&pool, event.id, "Championship").await;

    let game = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 1,
            game_number: 1,
            team1_id: Some(team_a.id),
            team2_id: Some(team_b.id),
            status: GameStatus::Ready,
            winner_advances_to_id: None,
            winner_slot: None,
            loser_advances_to_id: None,
            loser_slot: None,
        },
    )
    .await;

    let submission = create_bracket_submission(
        &pool,
        event.id,
        game.id,
        json!({ "winner_team_id": outsider.id }),
    )
    .await;

    let err = accept_score(&pool, accept(submission.id))
        .await
        .expect_err("outsider winner must be refused");
    assert!(matches!(err, EngineError::BadRequest(_)));

    // Game untouched.
    let reloaded = bracket_games::get(&pool, game.id)
        .await
        .expect("get game")
        .expect("game exists");
    assert_eq!(reloaded.status, GameStatus::Ready);
    assert_eq!(reloaded.winner_id, None);
    assert_eq!(reloaded.loser_id, None);
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_bracket_completion_propagates_and_flips_ready() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Propagation Event", 3).await;
    let team_a = create_test_team(&pool, event.id, 1).await;
    let team_b = create_test_team(&pool, event.id, 2).await;
    let team_c = create_test_team(&pool, event.id, 3).await;
    let team_d = create_test_team(&pool, event.id, 4).await;
    let bracket = create_test_bracket(&pool, event.id, "Championship").await;

    let finals = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 2,
            game_number: 1,
            team1_id: None,
            team2_id: None,
            status: GameStatus::Pending,
            winner_advances_to_id: None,
            winner_slot: None,
            loser_advances_to_id: None,
            loser_slot: None,
        },
    )
    .await;
    let consolation = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 2,
            game_number: 2,
            team1_id: None,
            team2_id: None,
            status: GameStatus::Pending,
            winner_advances_to_id: None,
            winner_slot: None,
            loser_advances_to_id: None,
            loser_slot: None,
        },
    )
    .await;
    let semi1 = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 1,
            game_number: 1,
            team1_id: Some(team_a.id),
            team2_id: Some(team_b.id),
            status: GameStatus::Ready,
            winner_advances_to_id: Some(finals.id),
            winner_slot: Some(1),
            loser_advances_to_id: Some(consolation.id),
            loser_slot: Some(1),
        },
    )
    .await;
    let semi2 = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 1,
            game_number: 2,
            team1_id: Some(team_c.id),
            team2_id: Some(team_d.id),
            status: GameStatus::Ready,
            winner_advances_to_id: Some(finals.id),
            winner_slot: Some(2),
            loser_advances_to_id: Some(consolation.id),
            loser_slot: Some(2),
        },
    )
    .await;

    let submission = create_bracket_submission(
        &pool,
        event.id,
        semi1.id,
        json!({ "winner_team_id": team_a.id, "winner_score": 12.0, "loser_score": 3.0 }),
    )
    .await;
    accept_score(&pool, accept(submission.id))
        .await
        .expect("first semi acceptance should succeed");

    let finals_mid = bracket_games::get(&pool, finals.id)
        .await
        .expect("get finals")
        .expect("finals exists");
    assert_eq!(finals_mid.team1_id, Some(team_a.id));
    assert_eq!(finals_mid.team2_id, None);
    assert_eq!(finals_mid.status, GameStatus::Pending);

    let consolation_mid = bracket_games::get(&pool, consolation.id)
        .await
        .expect("get consolation")
        .expect("consolation exists");
    assert_eq!(consolation_mid.team1_id, Some(team_b.id));

    let submission = create_bracket_submission(
        &pool,
        event.id,
        semi2.id,
        json!({ "winner_team_number": 3, "winner_score": 9.0, "loser_score": 7.0 }),
    )
    .await;
    accept_score(&pool, accept(submission.id))
        .await
        .expect("second semi acceptance should succeed");

    // Both downstream games now have both slots and are ready.
    let finals_done = bracket_games::get(&pool, finals.id)
        .await
        .expect("get finals")
        .expect("finals exists");
    assert_eq!(finals_done.team2_id, Some(team_c.id));
    assert_eq!(finals_done.status, GameStatus::Ready);

    let consolation_done = bracket_games::get(&pool, consolation.id)
        .await
        .expect("get consolation")
        .expect("consolation exists");
    assert_eq!(consolation_done.team2_id, Some(team_d.id));
    assert_eq!(consolation_done.status, GameStatus::Ready);

    // Completed games carry completed queue items; a sync pass adds rows
    // for the newly ready games.
    let semi1_item = game_queue::get_bracket_item(&pool, semi1.id)
        .await
        .expect("get item")
        .expect("item exists");
    assert_eq!(semi1_item.status, QueueStatus::Completed);

    sync_bracket_queue(&pool, event.id)
        .await
        .expect("bracket sync should succeed");
    let finals_item = game_queue::get_bracket_item(&pool, finals.id)
        .await
        .expect("get item")
        .expect("item exists after sync");
    assert_eq!(finals_item.status, QueueStatus::Queued);

    // The per-side scores landed on the winner's side of each game.
    let semi1_done = bracket_games::get(&pool, semi1.id)
        .await
        .expect("get semi1")
        .expect("semi1 exists");
    assert_eq!(semi1_done.team1_score, Some(12.0));
    assert_eq!(semi1_done.team2_score, Some(3.0));
    let semi2_done = bracket_games::get(&pool, semi2.id)
        .await
        .expect("get semi2")
        .expect("semi2 exists");
    assert_eq!(semi2_done.team1_score, Some(9.0));
    assert_eq!(semi2_done.team2_score, Some(7.0));
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_grand_final_reset_drops_loser_on_winners_seat_win() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Reset Event", 3).await;
    let champ = create_test_team(&pool, event.id, 1).await;
    let challenger = create_test_team(&pool, event.id, 2).await;
    let bracket = create_test_bracket(&pool, event.id, "Championship").await;

    let reset_game = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 3,
            game_number: 1,
            team1_id: None,
            team2_id: None,
            status: GameStatus::Pending,
            winner_advances_to_id: None,
            winner_slot: None,
            loser_advances_to_id: None,
            loser_slot: None,
        },
    )
    .await;
    let grand_final = create_test_game(
        &pool,
        CreateBracketGame {
            bracket_id: bracket.id,
            round: 2,
            game_number: 1,
            team1_id: Some(champ.id),
            team2_id: Some(challenger.id),
            status: GameStatus::Ready,
            winner_advances_to_id: Some(reset_game.id),
            winner_slot: Some(1),
            loser_advances_to_id: Some(reset_game.id),
            loser_slot: Some(2),
        },
    )
    .await;

    let submission = create_bracket_submission(
        &pool,
        event.id,
        grand_final.id,
        json!({ "winner_team_id": champ.id }),
    )
    .await;
    accept_score(&pool, accept(submission.id))
        .await
        .expect("grand final acceptance should succeed");

    let reset_done = bracket_games::get(&pool, reset_game.id)
        .await
        .expect("get reset game")
        .expect("reset game exists");
    assert_eq!(reset_done.team1_id, Some(champ.id));
    assert_eq!(reset_done.team2_id, None);
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_sync_seeding_queue_is_idempotent() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Idempotent Sync Event", 2).await;
    create_test_team(&pool, event.id, 1).await;
    create_test_team(&pool, event.id, 2).await;

    let first = sync_seeding_queue(&pool, event.id)
        .await
        .expect("first sync should succeed");
    assert_eq!(first.created, 4);

    let second = sync_seeding_queue(&pool, event.id)
        .await
        .expect("second sync should succeed");
    assert_eq!(second.created, 0);
    assert_eq!(second.completed, 0);
    assert_eq!(second.reverted, 0);

    let items = game_queue::list_by_event(&pool, event.id)
        .await
        .expect("list queue");
    assert_eq!(items.len(), 4);
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_deleted_score_reverts_queue_item() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Reversion Event", 1).await;
    let team = create_test_team(&pool, event.id, 1).await;

    sync_seeding_queue(&pool, event.id)
        .await
        .expect("sync should succeed");

    // Operator calls the pair to a table before the score arrives.
    let item = game_queue::get_seeding_item(&pool, team.id, 1)
        .await
        .expect("get item")
        .expect("item exists");
    queue::call_item(&pool, item.id, Some(4))
        .await
        .expect("call should succeed");

    let submission = create_seeding_submission(
        &pool,
        event.id,
        json!({ "team_id": team.id, "round_number": 1, "score": 88.0 }),
    )
    .await;
    accept_score(&pool, accept(submission.id))
        .await
        .expect("acceptance should succeed");

    let item = game_queue::get_seeding_item(&pool, team.id, 1)
        .await
        .expect("get item")
        .expect("item exists");
    assert_eq!(item.status, QueueStatus::Completed);
    let original_position = item.queue_position;

    // Admin deletes the score; the next sync walks the item back.
    let score = seeding_scores::get_by_team_round(&pool, team.id, 1)
        .await
        .expect("get score")
        .expect("score exists");
    seeding_scores::delete(&pool, score.id)
        .await
        .expect("delete should succeed");

    let outcome = sync_seeding_queue(&pool, event.id)
        .await
        .expect("sync should succeed");
    assert_eq!(outcome.reverted, 1);

    let item = game_queue::get_seeding_item(&pool, team.id, 1)
        .await
        .expect("get item")
        .expect("item exists");
    assert_eq!(item.status, QueueStatus::Queued);
    assert_eq!(item.table_number, None);
    assert_eq!(item.called_at, None);
    assert_eq!(item.queue_position, original_position);
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_reject_score_is_final_without_side_effects() {
    let pool = setup_test_db().await;
    let event = create_test_event(&pool, "Rejection Event", 1).await;
    let team = create_test_team(&pool, event.id, 1).await;

    let submission = create_seeding_submission(
        &pool,
        event.id,
        json!({ "team_number": 1, "round_number": 1, "score": 55.0 }),
    )
    .await;

    let rejected = reject_score(
        &pool,
        RejectScoreParams {
            submission_id: submission.id,
            reviewer_id: None,
        },
    )
    .await
    .expect("rejection should succeed");
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert!(rejected.reviewed_at.is_some());

    // No ledger write happened.
    let score = seeding_scores::get_by_team_round(&pool, team.id, 1)
        .await
        .expect("get score");
    assert!(score.is_none());

    // And accepting it afterwards is refused.
    let err = accept_score(&pool, accept(submission.id))
        .await
        .expect_err("accepting a rejected submission must fail");
    assert!(matches!(err, EngineError::BadRequest(_)));
}

#[tokio::test]
#[ignore = "requires a Postgres database (TEST_DATABASE_URL)"]
async fn test_legacy_submission_is_refused() {
    let pool = setup_test_db().await;

    let submission = create_legacy_submission(
        &pool,
        json!({ "team_number": 1, "round_number": 1, "score": 10.0 }),
    )
    .await;

    let err = accept_score(&pool, accept(submission.id))
        .await
        .expect_err("legacy submission must be refused");
    assert!(matches!(err, EngineError::BadRequest(_)));
}
