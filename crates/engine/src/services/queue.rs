use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{
    BracketGameRow, EventRow, GameQueueItemRow, ScoreSubmissionRow, SeedingScoreRow, TeamRow,
};
use infra::repos::bracket_games::GameStatus;
use infra::repos::game_queue::{CreateQueueItem, QueueStatus};
use infra::repos::{
    bracket_games, brackets, events, game_queue, score_submissions, seeding_scores, teams,
};

use crate::error::{EngineError, EngineResult};
use crate::payload::SeedingPayload;

/// Result of one sync pass. `created` counts appended rows, `completed`
/// and `reverted` count status flips on existing rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSyncOutcome {
    pub created: usize,
    pub completed: usize,
    pub reverted: usize,
}

/// One write the sync pass decided on. Creation carries the target status
/// so a freshly appended row for an already-scored pair lands completed
/// without a second pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    CreateSeeding {
        team_id: Uuid,
        round: i32,
        completed: bool,
    },
    CreateBracket {
        game_id: Uuid,
        completed: bool,
    },
    ForceCompleted {
        item_id: Uuid,
    },
    RevertToQueued {
        item_id: Uuid,
    },
}

/// Decide the writes that bring the seeding segment of the queue in line
/// with the ledger. Existing rows keep their position and operator fields;
/// new pairs are appended round-major (all teams of round 1, then round 2).
pub fn plan_seeding_sync(
    event: &EventRow,
    event_teams: &[TeamRow],
    scores: &[SeedingScoreRow],
    open_submission_pairs: &HashSet<(Uuid, i32)>,
    queue: &[GameQueueItemRow],
) -> Vec<QueueAction> {
    // A ledger row is a backing score even when its value is null: it
    // exists because a submission was accepted for the pair.
    let mut scored: HashSet<(Uuid, i32)> = scores
        .iter()
        .map(|s| (s.team_id, s.round_number))
        .collect();
    scored.extend(open_submission_pairs.iter().copied());

    let existing: HashMap<(Uuid, i32), &GameQueueItemRow> = queue
        .iter()
        .filter_map(|item| match (item.seeding_team_id, item.seeding_round) {
            (Some(team_id), Some(round)) => Some(((team_id, round), item)),
            _ => None,
        })
        .collect();

    let mut actions = Vec::new();
    for round in 1..=event.seeding_rounds {
        for team in event_teams {
            let key = (team.id, round);
            let has_score = scored.contains(&key);
            match existing.get(&key) {
                None => actions.push(QueueAction::CreateSeeding {
                    team_id: team.id,
                    round,
                    completed: has_score,
                }),
                Some(item) => {
                    if has_score && item.status != QueueStatus::Completed {
                        actions.push(QueueAction::ForceCompleted { item_id: item.id });
                    } else if !has_score && item.status == QueueStatus::Completed {
                        actions.push(QueueAction::RevertToQueued { item_id: item.id });
                    }
                }
            }
        }
    }
    actions
}

/// Whether a bracket game belongs in the queue at all: runnable now
/// (ready, or pending with both slots filled), already running, or done.
/// Byes never queue.
fn bracket_game_wants_row(game: &BracketGameRow) -> bool {
    match game.status {
        GameStatus::Ready | GameStatus::InProgress | GameStatus::Completed => true,
        GameStatus::Pending => game.both_slots_filled(),
        GameStatus::Bye => false,
    }
}

/// Decide the writes that bring the bracket segment of the queue in line
/// with the bracket graph. Rows for games that regressed out of readiness
/// are tolerated and left in place.
pub fn plan_bracket_sync(
    games: &[BracketGameRow],
    queue: &[GameQueueItemRow],
) -> Vec<QueueAction> {
    let existing: HashMap<Uuid, &GameQueueItemRow> = queue
        .iter()
        .filter_map(|item| item.bracket_game_id.map(|game_id| (game_id, item)))
        .collect();

    let mut actions = Vec::new();
    for game in games {
        match existing.get(&game.id) {
            None => {
                if bracket_game_wants_row(game) {
                    actions.push(QueueAction::CreateBracket {
                        game_id: game.id,
                        completed: game.status == GameStatus::Completed,
                    });
                }
            }
            Some(item) => {
                if game.status == GameStatus::Completed && item.status != QueueStatus::Completed {
                    actions.push(QueueAction::ForceCompleted { item_id: item.id });
                }
            }
        }
    }
    actions
}

async fn apply_actions(
    pool: &PgPool,
    event_id: Uuid,
    actions: &[QueueAction],
) -> EngineResult<QueueSyncOutcome> {
    let mut outcome = QueueSyncOutcome::default();
    if actions.is_empty() {
        return Ok(outcome);
    }

    let mut tx = pool.begin().await?;
    let mut next_position = game_queue::max_position(&mut *tx, event_id).await? + 1;

    for action in actions {
        match *action {
            QueueAction::CreateSeeding {
                team_id,
                round,
                completed,
            } => {
                game_queue::insert(
                    &mut *tx,
                    CreateQueueItem {
                        event_id,
                        seeding_team_id: Some(team_id),
                        seeding_round: Some(round),
                        bracket_game_id: None,
                        queue_position: next_position,
                        status: if completed {
                            QueueStatus::Completed
                        } else {
                            QueueStatus::Queued
                        },
                    },
                )
                .await?;
                next_position += 1;
                outcome.created += 1;
            }
            QueueAction::CreateBracket { game_id, completed } => {
                game_queue::insert(
                    &mut *tx,
                    CreateQueueItem {
                        event_id,
                        seeding_team_id: None,
                        seeding_round: None,
                        bracket_game_id: Some(game_id),
                        queue_position: next_position,
                        status: if completed {
                            QueueStatus::Completed
                        } else {
                            QueueStatus::Queued
                        },
                    },
                )
                .await?;
                next_position += 1;
                outcome.created += 1;
            }
            QueueAction::ForceCompleted { item_id } => {
                game_queue::set_status(&mut *tx, item_id, QueueStatus::Completed).await?;
                outcome.completed += 1;
            }
            QueueAction::RevertToQueued { item_id } => {
                game_queue::revert_to_queued(&mut *tx, item_id).await?;
                outcome.reverted += 1;
            }
        }
    }
    tx.commit().await?;

    Ok(outcome)
}

/// Seeding pairs claimed by submissions the ledger has not folded yet.
/// Unparseable payloads are skipped; sync is best-effort by design.
fn open_seeding_pairs(
    submissions: &[ScoreSubmissionRow],
    event_teams: &[TeamRow],
) -> HashSet<(Uuid, i32)> {
    let by_number: HashMap<i32, Uuid> = event_teams
        .iter()
        .map(|team| (team.team_number, team.id))
        .collect();

    let mut pairs = HashSet::new();
    for submission in submissions {
        match SeedingPayload::parse(&submission.payload) {
            Ok(payload) => {
                let team_id = payload.team_id.or_else(|| {
                    payload
                        .team_number
                        .and_then(|number| by_number.get(&number).copied())
                });
                if let Some(team_id) = team_id {
                    pairs.insert((team_id, payload.round_number));
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Skipping unparseable seeding payload on submission {}: {}",
                    submission.id,
                    err
                );
            }
        }
    }
    pairs
}

/// Ensure one queue row per (team, round) up to the event's configured
/// seeding-round count, forcing completion where a score exists and
/// reverting completed rows whose backing score disappeared. Idempotent;
/// never reassigns existing positions.
pub async fn sync_seeding_queue(pool: &PgPool, event_id: Uuid) -> EngineResult<QueueSyncOutcome> {
    let event = events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;

    let event_teams = teams::list_by_event(pool, event_id).await?;
    let scores = seeding_scores::list_by_event(pool, event_id).await?;
    let submissions = score_submissions::list_open_seeding_by_event(pool, event_id).await?;
    let queue = game_queue::list_by_event(pool, event_id).await?;

    let open_pairs = open_seeding_pairs(&submissions, &event_teams);
    let actions = plan_seeding_sync(&event, &event_teams, &scores, &open_pairs, &queue);

    apply_actions(pool, event_id, &actions).await
}

/// Ensure a queue row per runnable or finished bracket game, forcing
/// completion for completed games. Idempotent and non-destructive.
pub async fn sync_bracket_queue(pool: &PgPool, event_id: Uuid) -> EngineResult<QueueSyncOutcome> {
    events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;

    let games = bracket_games::list_by_event(pool, event_id).await?;
    let queue = game_queue::list_by_event(pool, event_id).await?;

    let actions = plan_bracket_sync(&games, &queue);

    apply_actions(pool, event_id, &actions).await
}

/// Post-acceptance follow-up: mark the queue item for a just-scored
/// seeding pair completed, appending one if sync never created it.
pub async fn complete_seeding_item(
    pool: &PgPool,
    event_id: Uuid,
    team_id: Uuid,
    round: i32,
) -> EngineResult<GameQueueItemRow> {
    if let Some(item) = game_queue::get_seeding_item(pool, team_id, round).await? {
        if item.status == QueueStatus::Completed {
            return Ok(item);
        }
        return game_queue::set_status(pool, item.id, QueueStatus::Completed)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("queue item {} disappeared during sync", item.id))
            });
    }

    let mut tx = pool.begin().await?;
    let position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let item = game_queue::insert(
        &mut *tx,
        CreateQueueItem {
            event_id,
            seeding_team_id: Some(team_id),
            seeding_round: Some(round),
            bracket_game_id: None,
            queue_position: position,
            status: QueueStatus::Completed,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(item)
}

/// Post-acceptance follow-up: mark the queue item for a just-completed
/// bracket game completed, appending one if sync never created it.
pub async fn complete_bracket_item(
    pool: &PgPool,
    event_id: Uuid,
    game_id: Uuid,
) -> EngineResult<GameQueueItemRow> {
    if let Some(item) = game_queue::get_bracket_item(pool, game_id).await? {
        if item.status == QueueStatus::Completed {
            return Ok(item);
        }
        return game_queue::set_status(pool, item.id, QueueStatus::Completed)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("queue item {} disappeared during sync", item.id))
            });
    }

    let mut tx = pool.begin().await?;
    let position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let item = game_queue::insert(
        &mut *tx,
        CreateQueueItem {
            event_id,
            seeding_team_id: None,
            seeding_round: None,
            bracket_game_id: Some(game_id),
            queue_position: position,
            status: QueueStatus::Completed,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(item)
}

/// Explicit operator enqueue of a seeding pair. Fails `Conflict` when a
/// queue item for the pair already exists.
pub async fn enqueue_seeding(
    pool: &PgPool,
    event_id: Uuid,
    team_id: Uuid,
    round: i32,
) -> EngineResult<GameQueueItemRow> {
    let event = events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;
    let team = teams::get(pool, team_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("team {} does not exist", team_id)))?;
    if team.event_id != event_id {
        return Err(EngineError::BadRequest(
            "team belongs to a different event".into(),
        ));
    }
    if round < 1 || round > event.seeding_rounds {
        return Err(EngineError::BadRequest(format!(
            "round {} is outside the event's {} seeding rounds",
            round, event.seeding_rounds
        )));
    }

    let mut tx = pool.begin().await?;
    if let Some(existing) = game_queue::get_seeding_item(&mut *tx, team_id, round).await? {
        return Err(EngineError::conflict(
            "a queue item for this team and round already exists",
            serde_json::json!({ "queue_item_id": existing.id }),
            serde_json::json!({ "seeding_team_id": team_id, "seeding_round": round }),
        ));
    }
    let position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let item = game_queue::insert(
        &mut *tx,
        CreateQueueItem {
            event_id,
            seeding_team_id: Some(team_id),
            seeding_round: Some(round),
            bracket_game_id: None,
            queue_position: position,
            status: QueueStatus::Queued,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(item)
}

/// Explicit operator enqueue of a bracket game. Fails `Conflict` when a
/// queue item for the game already exists.
pub async fn enqueue_bracket(
    pool: &PgPool,
    event_id: Uuid,
    game_id: Uuid,
) -> EngineResult<GameQueueItemRow> {
    let game = bracket_games::get(pool, game_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("bracket game {} does not exist", game_id)))?;
    let bracket = brackets::get(pool, game.bracket_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("bracket {} does not exist", game.bracket_id))
        })?;
    if bracket.event_id != event_id {
        return Err(EngineError::BadRequest(
            "bracket game belongs to a different event".into(),
        ));
    }

    let mut tx = pool.begin().await?;
    if let Some(existing) = game_queue::get_bracket_item(&mut *tx, game_id).await? {
        return Err(EngineError::conflict(
            "a queue item for this bracket game already exists",
            serde_json::json!({ "queue_item_id": existing.id }),
            serde_json::json!({ "bracket_game_id": game_id }),
        ));
    }
    let position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let item = game_queue::insert(
        &mut *tx,
        CreateQueueItem {
            event_id,
            seeding_team_id: None,
            seeding_round: None,
            bracket_game_id: Some(game_id),
            queue_position: position,
            status: QueueStatus::Queued,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(item)
}

/// Rewrite queue positions to match the given order. The order must name
/// every queue item of the event exactly once.
pub async fn reorder(pool: &PgPool, event_id: Uuid, ordered: &[Uuid]) -> EngineResult<usize> {
    let items = game_queue::list_by_event(pool, event_id).await?;
    let current: HashSet<Uuid> = items.iter().map(|item| item.id).collect();
    let requested: HashSet<Uuid> = ordered.iter().copied().collect();

    if requested.len() != ordered.len() {
        return Err(EngineError::BadRequest(
            "reorder names a queue item more than once".into(),
        ));
    }
    if requested != current {
        return Err(EngineError::BadRequest(
            "reorder must name every queue item of the event exactly once".into(),
        ));
    }

    let mut tx = pool.begin().await?;
    for (index, item_id) in ordered.iter().enumerate() {
        game_queue::set_position(&mut *tx, *item_id, (index + 1) as i32).await?;
    }
    tx.commit().await?;
    Ok(ordered.len())
}

/// Destructive replace of the seeding segment, used only for initial
/// setup: existing seeding rows (positions, operator fields) are dropped
/// and rebuilt in canonical round-major order.
pub async fn populate_seeding_queue(pool: &PgPool, event_id: Uuid) -> EngineResult<usize> {
    let event = events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;

    let event_teams = teams::list_by_event(pool, event_id).await?;
    let scores = seeding_scores::list_by_event(pool, event_id).await?;
    let submissions = score_submissions::list_open_seeding_by_event(pool, event_id).await?;

    let mut scored = open_seeding_pairs(&submissions, &event_teams);
    scored.extend(scores.iter().map(|s| (s.team_id, s.round_number)));

    let mut tx = pool.begin().await?;
    game_queue::delete_seeding_items(&mut *tx, event_id).await?;
    let mut position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let mut inserted = 0;
    for round in 1..=event.seeding_rounds {
        for team in &event_teams {
            let completed = scored.contains(&(team.id, round));
            game_queue::insert(
                &mut *tx,
                CreateQueueItem {
                    event_id,
                    seeding_team_id: Some(team.id),
                    seeding_round: Some(round),
                    bracket_game_id: None,
                    queue_position: position,
                    status: if completed {
                        QueueStatus::Completed
                    } else {
                        QueueStatus::Queued
                    },
                },
            )
            .await?;
            position += 1;
            inserted += 1;
        }
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Destructive replace of the bracket segment, used only for initial
/// setup.
pub async fn populate_bracket_queue(pool: &PgPool, event_id: Uuid) -> EngineResult<usize> {
    events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;

    let games = bracket_games::list_by_event(pool, event_id).await?;

    let mut tx = pool.begin().await?;
    game_queue::delete_bracket_items(&mut *tx, event_id).await?;
    let mut position = game_queue::max_position(&mut *tx, event_id).await? + 1;
    let mut inserted = 0;
    for game in games.iter().filter(|game| bracket_game_wants_row(game)) {
        game_queue::insert(
            &mut *tx,
            CreateQueueItem {
                event_id,
                seeding_team_id: None,
                seeding_round: None,
                bracket_game_id: Some(game.id),
                queue_position: position,
                status: if game.status == GameStatus::Completed {
                    QueueStatus::Completed
                } else {
                    QueueStatus::Queued
                },
            },
        )
        .await?;
        position += 1;
        inserted += 1;
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Call a queued item to a table.
pub async fn call_item(
    pool: &PgPool,
    item_id: Uuid,
    table_number: Option<i32>,
) -> EngineResult<GameQueueItemRow> {
    let item = game_queue::get(pool, item_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))?;
    if !item.status.can_transition_to(QueueStatus::Called) {
        return Err(EngineError::BadRequest(format!(
            "queue item cannot move from {} to called",
            item.status.as_str()
        )));
    }
    game_queue::set_called(pool, item_id, table_number)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))
}

/// Take a called item back to queued, clearing its call metadata.
pub async fn uncall_item(pool: &PgPool, item_id: Uuid) -> EngineResult<GameQueueItemRow> {
    let item = game_queue::get(pool, item_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))?;
    if !item.status.can_transition_to(QueueStatus::Queued) {
        return Err(EngineError::BadRequest(format!(
            "queue item cannot move from {} to queued",
            item.status.as_str()
        )));
    }
    game_queue::revert_to_queued(pool, item_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))
}

/// Mark a called item as playing.
pub async fn start_item(pool: &PgPool, item_id: Uuid) -> EngineResult<GameQueueItemRow> {
    let item = game_queue::get(pool, item_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))?;
    if !item.status.can_transition_to(QueueStatus::InProgress) {
        return Err(EngineError::BadRequest(format!(
            "queue item cannot move from {} to in_progress",
            item.status.as_str()
        )));
    }
    game_queue::set_status(pool, item_id, QueueStatus::InProgress)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))
}

/// Mark an item finished.
pub async fn complete_item(pool: &PgPool, item_id: Uuid) -> EngineResult<GameQueueItemRow> {
    let item = game_queue::get(pool, item_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))?;
    if !item.status.can_transition_to(QueueStatus::Completed) {
        return Err(EngineError::BadRequest(format!(
            "queue item cannot move from {} to completed",
            item.status.as_str()
        )));
    }
    game_queue::set_status(pool, item_id, QueueStatus::Completed)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("queue item {} does not exist", item_id)))
}
