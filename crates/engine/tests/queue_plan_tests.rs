use std::collections::HashSet;

use chrono::Utc;
use engine::services::queue::{plan_bracket_sync, plan_seeding_sync, QueueAction};
use infra::models::{BracketGameRow, EventRow, GameQueueItemRow, SeedingScoreRow, TeamRow};
use infra::repos::bracket_games::GameStatus;
use infra::repos::game_queue::QueueStatus;
use infra::repos::teams::TeamStatus;
use uuid::Uuid;

fn event(seeding_rounds: i32) -> EventRow {
    EventRow {
        id: Uuid::new_v4(),
        name: "Test Event".into(),
        seeding_rounds,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn team(event_id: Uuid, number: i32) -> TeamRow {
    TeamRow {
        id: Uuid::new_v4(),
        event_id,
        team_number: number,
        name: format!("Team {}", number),
        status: TeamStatus::CheckedIn,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn ledger_score(event_id: Uuid, team_id: Uuid, round: i32, score: Option<f64>) -> SeedingScoreRow {
    SeedingScoreRow {
        id: Uuid::new_v4(),
        event_id,
        team_id,
        round_number: round,
        score,
        submission_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn seeding_item(
    event_id: Uuid,
    team_id: Uuid,
    round: i32,
    position: i32,
    status: QueueStatus,
) -> GameQueueItemRow {
    GameQueueItemRow {
        id: Uuid::new_v4(),
        event_id,
        seeding_team_id: Some(team_id),
        seeding_round: Some(round),
        bracket_game_id: None,
        queue_position: position,
        status,
        table_number: None,
        called_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn bracket_item(
    event_id: Uuid,
    game_id: Uuid,
    position: i32,
    status: QueueStatus,
) -> GameQueueItemRow {
    GameQueueItemRow {
        id: Uuid::new_v4(),
        event_id,
        seeding_team_id: None,
        seeding_round: None,
        bracket_game_id: Some(game_id),
        queue_position: position,
        status,
        table_number: None,
        called_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn bracket_game(status: GameStatus, slots: (Option<Uuid>, Option<Uuid>)) -> BracketGameRow {
    BracketGameRow {
        id: Uuid::new_v4(),
        bracket_id: Uuid::new_v4(),
        round: 1,
        game_number: 1,
        team1_id: slots.0,
        team2_id: slots.1,
        status,
        winner_id: None,
        loser_id: None,
        team1_score: None,
        team2_score: None,
        winner_advances_to_id: None,
        winner_slot: None,
        loser_advances_to_id: None,
        loser_slot: None,
        completed_at: None,
        submission_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_seeding_sync_creates_every_pair() {
    let ev = event(2);
    let teams = vec![team(ev.id, 1), team(ev.id, 2)];

    let actions = plan_seeding_sync(&ev, &teams, &[], &HashSet::new(), &[]);

    assert_eq!(actions.len(), 4);
    assert!(actions.iter().all(|a| matches!(
        a,
        QueueAction::CreateSeeding {
            completed: false,
            ..
        }
    )));
}

#[test]
fn test_seeding_sync_marks_scored_pair_completed_on_create() {
    let ev = event(1);
    let teams = vec![team(ev.id, 1), team(ev.id, 2)];
    let scores = vec![ledger_score(ev.id, teams[0].id, 1, Some(120.0))];

    let actions = plan_seeding_sync(&ev, &teams, &scores, &HashSet::new(), &[]);

    assert!(actions.contains(&QueueAction::CreateSeeding {
        team_id: teams[0].id,
        round: 1,
        completed: true,
    }));
    assert!(actions.contains(&QueueAction::CreateSeeding {
        team_id: teams[1].id,
        round: 1,
        completed: false,
    }));
}

#[test]
fn test_seeding_sync_is_idempotent() {
    let ev = event(2);
    let teams = vec![team(ev.id, 1)];
    let scores = vec![ledger_score(ev.id, teams[0].id, 1, Some(75.0))];
    let queue = vec![
        seeding_item(ev.id, teams[0].id, 1, 1, QueueStatus::Completed),
        seeding_item(ev.id, teams[0].id, 2, 2, QueueStatus::Queued),
    ];

    let actions = plan_seeding_sync(&ev, &teams, &scores, &HashSet::new(), &queue);

    assert!(actions.is_empty());
}

#[test]
fn test_seeding_sync_forces_completion_for_existing_row() {
    let ev = event(1);
    let teams = vec![team(ev.id, 1)];
    let scores = vec![ledger_score(ev.id, teams[0].id, 1, Some(99.0))];
    let queue = vec![seeding_item(ev.id, teams[0].id, 1, 7, QueueStatus::Called)];

    let actions = plan_seeding_sync(&ev, &teams, &scores, &HashSet::new(), &queue);

    assert_eq!(
        actions,
        vec![QueueAction::ForceCompleted {
            item_id: queue[0].id
        }]
    );
}

#[test]
fn test_seeding_sync_reverts_row_without_backing_score() {
    let ev = event(1);
    let teams = vec![team(ev.id, 1)];
    let queue = vec![seeding_item(ev.id, teams[0].id, 1, 3, QueueStatus::Completed)];

    let actions = plan_seeding_sync(&ev, &teams, &[], &HashSet::new(), &queue);

    assert_eq!(
        actions,
        vec![QueueAction::RevertToQueued {
            item_id: queue[0].id
        }]
    );
}

#[test]
fn test_seeding_sync_null_ledger_score_still_backs_its_item() {
    // A ledger row with a null value exists because a submission was
    // accepted, so the pair counts as played.
    let ev = event(1);
    let teams = vec![team(ev.id, 1)];
    let scores = vec![ledger_score(ev.id, teams[0].id, 1, None)];
    let queue = vec![seeding_item(ev.id, teams[0].id, 1, 1, QueueStatus::Queued)];

    let actions = plan_seeding_sync(&ev, &teams, &scores, &HashSet::new(), &queue);

    assert_eq!(
        actions,
        vec![QueueAction::ForceCompleted {
            item_id: queue[0].id
        }]
    );
}

#[test]
fn test_seeding_sync_counts_open_submissions_as_scores() {
    let ev = event(1);
    let teams = vec![team(ev.id, 1)];
    let queue = vec![seeding_item(ev.id, teams[0].id, 1, 1, QueueStatus::Queued)];
    let open: HashSet<(Uuid, i32)> = [(teams[0].id, 1)].into_iter().collect();

    let actions = plan_seeding_sync(&ev, &teams, &[], &open, &queue);

    assert_eq!(
        actions,
        vec![QueueAction::ForceCompleted {
            item_id: queue[0].id
        }]
    );
}

#[test]
fn test_bracket_sync_rows_follow_game_state() {
    let (a, b) = (Some(Uuid::new_v4()), Some(Uuid::new_v4()));

    let ready = bracket_game(GameStatus::Ready, (a, b));
    let pending_full = bracket_game(GameStatus::Pending, (a, b));
    let pending_half = bracket_game(GameStatus::Pending, (a, None));
    let bye = bracket_game(GameStatus::Bye, (a, None));
    let completed = bracket_game(GameStatus::Completed, (a, b));

    let games = vec![
        ready.clone(),
        pending_full.clone(),
        pending_half.clone(),
        bye.clone(),
        completed.clone(),
    ];
    let actions = plan_bracket_sync(&games, &[]);

    let created: Vec<Uuid> = actions
        .iter()
        .filter_map(|a| match a {
            QueueAction::CreateBracket { game_id, .. } => Some(*game_id),
            _ => None,
        })
        .collect();

    assert!(created.contains(&ready.id));
    assert!(created.contains(&pending_full.id));
    assert!(created.contains(&completed.id));
    assert!(!created.contains(&pending_half.id));
    assert!(!created.contains(&bye.id));

    assert!(actions.contains(&QueueAction::CreateBracket {
        game_id: completed.id,
        completed: true,
    }));
}

#[test]
fn test_bracket_sync_forces_completion_and_tolerates_regression() {
    let ev = event(1);
    let (a, b) = (Some(Uuid::new_v4()), Some(Uuid::new_v4()));

    let completed = bracket_game(GameStatus::Completed, (a, b));
    let regressed = bracket_game(GameStatus::Pending, (a, None));

    let queue = vec![
        bracket_item(ev.id, completed.id, 1, QueueStatus::InProgress),
        bracket_item(ev.id, regressed.id, 2, QueueStatus::Queued),
    ];

    let actions = plan_bracket_sync(&[completed.clone(), regressed.clone()], &queue);

    // The finished game's row is forced completed; the regressed game's
    // row is left in place untouched.
    assert_eq!(
        actions,
        vec![QueueAction::ForceCompleted {
            item_id: queue[0].id
        }]
    );
}

#[test]
fn test_bracket_sync_is_idempotent() {
    let ev = event(1);
    let (a, b) = (Some(Uuid::new_v4()), Some(Uuid::new_v4()));
    let ready = bracket_game(GameStatus::Ready, (a, b));
    let queue = vec![bracket_item(ev.id, ready.id, 1, QueueStatus::Queued)];

    let actions = plan_bracket_sync(&[ready], &queue);

    assert!(actions.is_empty());
}
