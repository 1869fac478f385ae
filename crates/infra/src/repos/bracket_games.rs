use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::BracketGameRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "game_status", rename_all = "snake_case")]
pub enum GameStatus {
    Pending,
    Ready,
    InProgress,
    Completed,
    Bye,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Pending => "pending",
            GameStatus::Ready => "ready",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
            GameStatus::Bye => "bye",
        }
    }

    /// `completed` and `bye` are terminal. A game may complete straight from
    /// `pending`: the ready flip is a best-effort follow-up, so a game whose
    /// slots filled moments ago can receive a result before anything flipped
    /// it.
    pub fn can_transition_to(&self, next: GameStatus) -> bool {
        matches!(
            (self, next),
            (GameStatus::Pending, GameStatus::Ready)
                | (GameStatus::Pending, GameStatus::Bye)
                | (GameStatus::Pending, GameStatus::Completed)
                | (GameStatus::Ready, GameStatus::InProgress)
                | (GameStatus::Ready, GameStatus::Completed)
                | (GameStatus::InProgress, GameStatus::Completed)
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self, GameStatus::Completed | GameStatus::Bye)
    }
}

impl FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GameStatus::Pending),
            "ready" => Ok(GameStatus::Ready),
            "in_progress" => Ok(GameStatus::InProgress),
            "completed" => Ok(GameStatus::Completed),
            "bye" => Ok(GameStatus::Bye),
            _ => Err(format!("Unknown game status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBracketGame {
    pub bracket_id: Uuid,
    pub round: i32,
    pub game_number: i32,
    pub team1_id: Option<Uuid>,
    pub team2_id: Option<Uuid>,
    pub status: GameStatus,
    pub winner_advances_to_id: Option<Uuid>,
    pub winner_slot: Option<i32>,
    pub loser_advances_to_id: Option<Uuid>,
    pub loser_slot: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct RecordGameResult {
    pub winner_id: Uuid,
    pub loser_id: Uuid,
    pub team1_score: Option<f64>,
    pub team2_score: Option<f64>,
    pub submission_id: Option<Uuid>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateBracketGame,
) -> SqlxResult<BracketGameRow> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        INSERT INTO bracket_games (
            bracket_id, round, game_number, team1_id, team2_id, status,
            winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot
        )
        VALUES ($1, $2, $3, $4, $5, $6::game_status, $7, $8, $9, $10)
        RETURNING id, bracket_id, round, game_number, team1_id, team2_id, status,
                  winner_id, loser_id, team1_score, team2_score,
                  winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
                  completed_at, submission_id, created_at, updated_at
        "#,
    )
    .bind(data.bracket_id)
    .bind(data.round)
    .bind(data.game_number)
    .bind(data.team1_id)
    .bind(data.team2_id)
    .bind(data.status.as_str())
    .bind(data.winner_advances_to_id)
    .bind(data.winner_slot)
    .bind(data.loser_advances_to_id)
    .bind(data.loser_slot)
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        SELECT id, bracket_id, round, game_number, team1_id, team2_id, status,
               winner_id, loser_id, team1_score, team2_score,
               winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
               completed_at, submission_id, created_at, updated_at
        FROM bracket_games
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Row-locked read used inside the acceptance transaction; serializes two
/// acceptances targeting the same game.
pub async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        SELECT id, bracket_id, round, game_number, team1_id, team2_id, status,
               winner_id, loser_id, team1_score, team2_score,
               winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
               completed_at, submission_id, created_at, updated_at
        FROM bracket_games
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_bracket<'e>(
    executor: impl PgExecutor<'e>,
    bracket_id: Uuid,
) -> SqlxResult<Vec<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        SELECT id, bracket_id, round, game_number, team1_id, team2_id, status,
               winner_id, loser_id, team1_score, team2_score,
               winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
               completed_at, submission_id, created_at, updated_at
        FROM bracket_games
        WHERE bracket_id = $1
        ORDER BY round ASC, game_number ASC
        "#,
    )
    .bind(bracket_id)
    .fetch_all(executor)
    .await
}

pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        SELECT g.id, g.bracket_id, g.round, g.game_number, g.team1_id, g.team2_id, g.status,
               g.winner_id, g.loser_id, g.team1_score, g.team2_score,
               g.winner_advances_to_id, g.winner_slot, g.loser_advances_to_id, g.loser_slot,
               g.completed_at, g.submission_id, g.created_at, g.updated_at
        FROM bracket_games g
        JOIN brackets b ON g.bracket_id = b.id
        WHERE b.event_id = $1
        ORDER BY g.round ASC, g.game_number ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}

/// Record a decided result: winner, loser, optional per-side scores,
/// terminal status, completion time and the submission that produced it.
pub async fn record_result<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    data: RecordGameResult,
) -> SqlxResult<BracketGameRow> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        UPDATE bracket_games
        SET winner_id = $2,
            loser_id = $3,
            team1_score = $4,
            team2_score = $5,
            status = 'completed'::game_status,
            completed_at = NOW(),
            submission_id = COALESCE($6, submission_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, bracket_id, round, game_number, team1_id, team2_id, status,
                  winner_id, loser_id, team1_score, team2_score,
                  winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
                  completed_at, submission_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(data.winner_id)
    .bind(data.loser_id)
    .bind(data.team1_score)
    .bind(data.team2_score)
    .bind(data.submission_id)
    .fetch_one(executor)
    .await
}

/// Write a team into slot 1 or 2 of a downstream game.
pub async fn fill_slot<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    slot: i32,
    team_id: Uuid,
) -> SqlxResult<Option<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        UPDATE bracket_games
        SET team1_id = CASE WHEN $2 = 1 THEN $3 ELSE team1_id END,
            team2_id = CASE WHEN $2 = 2 THEN $3 ELSE team2_id END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, bracket_id, round, game_number, team1_id, team2_id, status,
                  winner_id, loser_id, team1_score, team2_score,
                  winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
                  completed_at, submission_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(slot)
    .bind(team_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: GameStatus,
) -> SqlxResult<Option<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        UPDATE bracket_games
        SET status = $2::game_status,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, bracket_id, round, game_number, team1_id, team2_id, status,
                  winner_id, loser_id, team1_score, team2_score,
                  winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
                  completed_at, submission_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(executor)
    .await
}

/// Resolve a game as a bye: its sole occupant is recorded as the winner and
/// the game never produces a loser.
pub async fn mark_bye<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    winner_id: Uuid,
) -> SqlxResult<Option<BracketGameRow>> {
    sqlx::query_as::<_, BracketGameRow>(
        r#"
        UPDATE bracket_games
        SET status = 'bye'::game_status,
            winner_id = $2,
            completed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, bracket_id, round, game_number, team1_id, team2_id, status,
                  winner_id, loser_id, team1_score, team2_score,
                  winner_advances_to_id, winner_slot, loser_advances_to_id, loser_slot,
                  completed_at, submission_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(winner_id)
    .fetch_optional(executor)
    .await
}
