use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use infra::models::{BracketGameRow, ScoreSubmissionRow, SeedingScoreRow, TeamRow};
use infra::repos::audit_log::NewAuditEntry;
use infra::repos::bracket_games::RecordGameResult;
use infra::repos::score_submissions::{ScoreType, SubmissionStatus};
use infra::repos::seeding_scores::UpsertSeedingScore;
use infra::repos::{bracket_games, score_submissions, seeding_scores, teams};

use crate::error::{EngineError, EngineResult};
use crate::payload::{BracketPayload, SeedingPayload};
use crate::services::byes::{self, ByeResolution};
use crate::services::rankings::{self, RecalculateOutcome};
use crate::services::{audit, queue};

/// Parameters for accepting a submission (parsed by the route layer).
pub struct AcceptScoreParams {
    pub submission_id: Uuid,
    /// Overwrite an already-recorded contending value instead of failing
    /// `Conflict`, and re-apply an already-reviewed submission.
    pub force: bool,
    /// None marks a system auto-acceptance.
    pub reviewer_id: Option<Uuid>,
}

/// What an acceptance committed, by submission kind.
#[derive(Debug)]
pub enum AcceptScoreOutcome {
    Seeding {
        submission: ScoreSubmissionRow,
        seeding_score: SeedingScoreRow,
        rankings: RecalculateOutcome,
    },
    Bracket {
        submission: ScoreSubmissionRow,
        game: BracketGameRow,
        byes: ByeResolution,
    },
}

/// Parameters for rejecting a submission.
pub struct RejectScoreParams {
    pub submission_id: Uuid,
    pub reviewer_id: Option<Uuid>,
}

/// Commit a pending score submission into durable ledger/graph state.
///
/// All validation failures are typed and leave no partial state; the
/// mutating section runs in one transaction. The post-commit follow-ups
/// (queue sync, ranking recompute, bye resolution) are idempotent, so a
/// failure there is recovered by re-running them, not by re-accepting.
pub async fn accept_score(
    pool: &PgPool,
    params: AcceptScoreParams,
) -> EngineResult<AcceptScoreOutcome> {
    let submission = score_submissions::get(pool, params.submission_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "submission {} does not exist",
                params.submission_id
            ))
        })?;

    let event_id = submission.event_id.ok_or_else(|| {
        EngineError::BadRequest(
            "submission is not event-scoped; legacy spreadsheet submissions use the export path"
                .into(),
        )
    })?;

    check_reviewable(&submission, params.force)?;

    match submission.score_type {
        ScoreType::Seeding => accept_seeding(pool, event_id, submission, &params).await,
        ScoreType::Bracket => accept_bracket(pool, event_id, submission, &params).await,
    }
}

/// Mark a pending submission rejected. No ledger, graph or queue side
/// effects.
pub async fn reject_score(
    pool: &PgPool,
    params: RejectScoreParams,
) -> EngineResult<ScoreSubmissionRow> {
    let mut tx = pool.begin().await?;
    let submission = score_submissions::get_for_update(&mut *tx, params.submission_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!(
                "submission {} does not exist",
                params.submission_id
            ))
        })?;
    let event_id = submission.event_id.ok_or_else(|| {
        EngineError::BadRequest(
            "submission is not event-scoped; legacy spreadsheet submissions use the export path"
                .into(),
        )
    })?;
    if !submission
        .status
        .can_transition_to(SubmissionStatus::Rejected)
    {
        return Err(EngineError::BadRequest(format!(
            "submission was already {}",
            submission.status.as_str()
        )));
    }
    let old_status = submission.status;
    let rejected =
        score_submissions::mark_rejected(&mut *tx, submission.id, params.reviewer_id).await?;
    tx.commit().await?;

    audit::record_best_effort(
        pool,
        NewAuditEntry {
            event_id,
            user_id: params.reviewer_id,
            action: "score_submission.rejected".into(),
            entity_type: "score_submission".into(),
            entity_id: rejected.id,
            old_value: Some(json!({ "status": old_status.as_str() })),
            new_value: Some(json!({ "status": rejected.status.as_str() })),
            ip: None,
        },
    )
    .await;

    Ok(rejected)
}

/// `force` re-applies an already-reviewed submission as an idempotent
/// overwrite; without it only `pending` may move.
fn check_reviewable(submission: &ScoreSubmissionRow, force: bool) -> EngineResult<()> {
    if force {
        return Ok(());
    }
    if !submission
        .status
        .can_transition_to(SubmissionStatus::Accepted)
    {
        return Err(EngineError::BadRequest(format!(
            "submission was already {}",
            submission.status.as_str()
        )));
    }
    Ok(())
}

async fn resolve_team(
    pool: &PgPool,
    event_id: Uuid,
    team_id: Option<Uuid>,
    team_number: Option<i32>,
) -> EngineResult<TeamRow> {
    if let Some(id) = team_id {
        let team = teams::get(pool, id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("team {} does not exist", id)))?;
        if team.event_id != event_id {
            return Err(EngineError::BadRequest(
                "team belongs to a different event".into(),
            ));
        }
        return Ok(team);
    }
    if let Some(number) = team_number {
        return teams::get_by_number(pool, event_id, number)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("no team with number {} in this event", number))
            });
    }
    Err(EngineError::BadRequest(
        "payload does not identify a team".into(),
    ))
}

async fn accept_seeding(
    pool: &PgPool,
    event_id: Uuid,
    submission: ScoreSubmissionRow,
    params: &AcceptScoreParams,
) -> EngineResult<AcceptScoreOutcome> {
    let payload = SeedingPayload::parse(&submission.payload)?;
    let team = resolve_team(pool, event_id, payload.team_id, payload.team_number).await?;

    let existing = seeding_scores::get_by_team_round(pool, team.id, payload.round_number).await?;
    if let Some(existing) = &existing {
        if existing.score.is_some() && !params.force {
            return Err(EngineError::conflict(
                "a score for this team and round is already recorded",
                json!({ "seeding_score_id": existing.id, "score": existing.score }),
                json!({ "submission_id": submission.id, "score": payload.score }),
            ));
        }
    }
    let old_score = existing.as_ref().and_then(|row| row.score);

    let mut tx = pool.begin().await?;
    // Re-read under row lock: two concurrent acceptances of the same
    // submission serialize here and the loser observes the final status.
    let locked = score_submissions::get_for_update(&mut *tx, submission.id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("submission {} does not exist", submission.id))
        })?;
    check_reviewable(&locked, params.force)?;
    let old_status = locked.status;

    let seeding_score = seeding_scores::upsert(
        &mut *tx,
        UpsertSeedingScore {
            event_id,
            team_id: team.id,
            round_number: payload.round_number,
            score: payload.score,
            submission_id: Some(submission.id),
        },
    )
    .await?;
    let submission = score_submissions::mark_accepted(
        &mut *tx,
        submission.id,
        params.reviewer_id,
        Some(seeding_score.id),
    )
    .await?;
    tx.commit().await?;

    queue::complete_seeding_item(pool, event_id, team.id, payload.round_number).await?;
    let rankings = rankings::recalculate(pool, event_id).await?;

    audit::record_best_effort(
        pool,
        NewAuditEntry {
            event_id,
            user_id: params.reviewer_id,
            action: "score_submission.accepted".into(),
            entity_type: "score_submission".into(),
            entity_id: submission.id,
            old_value: Some(json!({ "status": old_status.as_str() })),
            new_value: Some(json!({ "status": submission.status.as_str() })),
            ip: None,
        },
    )
    .await;
    audit::record_best_effort(
        pool,
        NewAuditEntry {
            event_id,
            user_id: params.reviewer_id,
            action: "seeding_score.recorded".into(),
            entity_type: "seeding_score".into(),
            entity_id: seeding_score.id,
            old_value: Some(json!({ "score": old_score })),
            new_value: Some(json!({ "score": seeding_score.score })),
            ip: None,
        },
    )
    .await;

    tracing::info!(
        "Accepted seeding score for team {} round {} in event {}",
        team.team_number,
        payload.round_number,
        event_id
    );

    Ok(AcceptScoreOutcome::Seeding {
        submission,
        seeding_score,
        rankings,
    })
}

async fn accept_bracket(
    pool: &PgPool,
    event_id: Uuid,
    submission: ScoreSubmissionRow,
    params: &AcceptScoreParams,
) -> EngineResult<AcceptScoreOutcome> {
    let game_id = submission.bracket_game_id.ok_or_else(|| {
        EngineError::BadRequest("bracket submission does not reference a bracket game".into())
    })?;
    let payload = BracketPayload::parse(&submission.payload)?;
    let winner = resolve_team(
        pool,
        event_id,
        payload.winner_team_id,
        payload.winner_team_number,
    )
    .await?;

    let mut tx = pool.begin().await?;
    let locked = score_submissions::get_for_update(&mut *tx, submission.id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("submission {} does not exist", submission.id))
        })?;
    check_reviewable(&locked, params.force)?;
    let old_status = locked.status;

    // Locking the game serializes two results racing for the same game.
    let game = bracket_games::get_for_update(&mut *tx, game_id)
        .await?
        .ok_or_else(|| {
            EngineError::NotFound(format!("bracket game {} does not exist", game_id))
        })?;

    if !game.has_team(winner.id) {
        return Err(EngineError::BadRequest(
            "declared winner is not one of the game's teams".into(),
        ));
    }
    let loser_id = game.opponent_of(winner.id).ok_or_else(|| {
        EngineError::BadRequest("game does not have both teams assigned".into())
    })?;

    if let Some(recorded) = game.winner_id {
        if recorded != winner.id && !params.force {
            return Err(EngineError::conflict(
                "the game already has a different recorded winner",
                json!({ "winner_id": recorded }),
                json!({ "winner_id": winner.id }),
            ));
        }
    }

    let old_game_status = game.status;
    let old_winner = game.winner_id;

    // Winner/loser scores map onto the game's fixed sides.
    let (team1_score, team2_score) = if game.slot_of(winner.id) == Some(1) {
        (payload.winner_score, payload.loser_score)
    } else {
        (payload.loser_score, payload.winner_score)
    };

    let game = bracket_games::record_result(
        &mut *tx,
        game_id,
        RecordGameResult {
            winner_id: winner.id,
            loser_id,
            team1_score,
            team2_score,
            submission_id: Some(submission.id),
        },
    )
    .await?;

    // Forward edges. The winner edge always delivers. Both edges naming
    // the same downstream game is a grand-final reset pairing: a win from
    // the winners-bracket seat (slot 1) ends the bracket, so its loser
    // stays eliminated; a win from the losers-bracket seat forces the
    // replay and both teams advance.
    if let (Some(target), Some(slot)) = (game.winner_advances_to_id, game.winner_slot) {
        if target != game.id {
            bracket_games::fill_slot(&mut *tx, target, slot, winner.id).await?;
        }
    }
    let reset_edge = game.winner_advances_to_id.is_some()
        && game.winner_advances_to_id == game.loser_advances_to_id;
    let drop_loser = reset_edge && game.slot_of(winner.id) == Some(1);
    if !drop_loser {
        if let (Some(target), Some(slot)) = (game.loser_advances_to_id, game.loser_slot) {
            if target != game.id {
                bracket_games::fill_slot(&mut *tx, target, slot, loser_id).await?;
            }
        }
    }

    let submission =
        score_submissions::mark_accepted(&mut *tx, submission.id, params.reviewer_id, None)
            .await?;
    tx.commit().await?;

    // Filling a slot may cascade byes further down; resolving also flips
    // newly fillable games to ready.
    let byes = byes::resolve_byes(pool, game.bracket_id).await?;
    queue::complete_bracket_item(pool, event_id, game_id).await?;

    audit::record_best_effort(
        pool,
        NewAuditEntry {
            event_id,
            user_id: params.reviewer_id,
            action: "score_submission.accepted".into(),
            entity_type: "score_submission".into(),
            entity_id: submission.id,
            old_value: Some(json!({ "status": old_status.as_str() })),
            new_value: Some(json!({ "status": submission.status.as_str() })),
            ip: None,
        },
    )
    .await;
    audit::record_best_effort(
        pool,
        NewAuditEntry {
            event_id,
            user_id: params.reviewer_id,
            action: "bracket_game.completed".into(),
            entity_type: "bracket_game".into(),
            entity_id: game.id,
            old_value: Some(json!({
                "status": old_game_status.as_str(),
                "winner_id": old_winner,
            })),
            new_value: Some(json!({
                "status": game.status.as_str(),
                "winner_id": game.winner_id,
            })),
            ip: None,
        },
    )
    .await;

    tracing::info!(
        "Accepted bracket result for game {} in event {}: winner {}",
        game_id,
        event_id,
        winner.team_number
    );

    Ok(AcceptScoreOutcome::Bracket {
        submission,
        game,
        byes,
    })
}
