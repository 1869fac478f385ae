use crate::repos::bracket_games::GameStatus;
use crate::repos::game_queue::QueueStatus;
use crate::repos::score_submissions::{ScoreType, SubmissionStatus};
use crate::repos::teams::TeamStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventRow {
    pub id: Uuid,
    pub name: String,
    pub seeding_rounds: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_number: i32,
    pub name: String,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScoreSubmissionRow {
    pub id: Uuid,
    /// NULL for legacy (spreadsheet-era) submissions, which the engine
    /// refuses to accept.
    pub event_id: Option<Uuid>,
    pub score_type: ScoreType,
    pub payload: serde_json::Value,
    pub bracket_game_id: Option<Uuid>,
    pub status: SubmissionStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub seeding_score_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeedingScoreRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub round_number: i32,
    pub score: Option<f64>,
    pub submission_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeedingRankingRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub seed_average: Option<f64>,
    pub tiebreaker: Option<f64>,
    pub seed_rank: Option<i32>,
    pub raw_seed_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BracketRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BracketGameRow {
    pub id: Uuid,
    pub bracket_id: Uuid,
    pub round: i32,
    pub game_number: i32,
    pub team1_id: Option<Uuid>,
    pub team2_id: Option<Uuid>,
    pub status: GameStatus,
    pub winner_id: Option<Uuid>,
    pub loser_id: Option<Uuid>,
    pub team1_score: Option<f64>,
    pub team2_score: Option<f64>,
    pub winner_advances_to_id: Option<Uuid>,
    pub winner_slot: Option<i32>,
    pub loser_advances_to_id: Option<Uuid>,
    pub loser_slot: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub submission_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BracketGameRow {
    pub fn has_team(&self, team_id: Uuid) -> bool {
        self.team1_id == Some(team_id) || self.team2_id == Some(team_id)
    }

    pub fn both_slots_filled(&self) -> bool {
        self.team1_id.is_some() && self.team2_id.is_some()
    }

    /// The occupant of the slot the given team does not hold, if any.
    pub fn opponent_of(&self, team_id: Uuid) -> Option<Uuid> {
        if self.team1_id == Some(team_id) {
            self.team2_id
        } else if self.team2_id == Some(team_id) {
            self.team1_id
        } else {
            None
        }
    }

    /// The slot (1 or 2) the given team occupies, if any.
    pub fn slot_of(&self, team_id: Uuid) -> Option<i32> {
        if self.team1_id == Some(team_id) {
            Some(1)
        } else if self.team2_id == Some(team_id) {
            Some(2)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GameQueueItemRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub seeding_team_id: Option<Uuid>,
    pub seeding_round: Option<i32>,
    pub bracket_game_id: Option<Uuid>,
    pub queue_position: i32,
    pub status: QueueStatus,
    pub table_number: Option<i32>,
    pub called_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
}
