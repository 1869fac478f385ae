use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::ScoreSubmissionRow;
use crate::pagination::LimitOffset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "score_type", rename_all = "snake_case")]
pub enum ScoreType {
    Seeding,
    Bracket,
}

impl ScoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreType::Seeding => "seeding",
            ScoreType::Bracket => "bracket",
        }
    }
}

impl FromStr for ScoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seeding" => Ok(ScoreType::Seeding),
            "bracket" => Ok(ScoreType::Bracket),
            _ => Err(format!("Unknown score type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Accepted,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// A submission is reviewed exactly once; `pending` is the only state
    /// that may move. Re-review is an explicit force overwrite, not a
    /// transition.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (
                SubmissionStatus::Pending,
                SubmissionStatus::Accepted | SubmissionStatus::Rejected
            )
        )
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "accepted" => Ok(SubmissionStatus::Accepted),
            "rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(format!("Unknown submission status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateScoreSubmission {
    pub event_id: Option<Uuid>,
    pub score_type: ScoreType,
    pub payload: serde_json::Value,
    pub bracket_game_id: Option<Uuid>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateScoreSubmission,
) -> SqlxResult<ScoreSubmissionRow> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        INSERT INTO score_submissions (event_id, score_type, payload, bracket_game_id)
        VALUES ($1, $2::score_type, $3, $4)
        RETURNING id, event_id, score_type, payload, bracket_game_id, status,
                  reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.score_type.as_str())
    .bind(data.payload)
    .bind(data.bracket_game_id)
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ScoreSubmissionRow>> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        SELECT id, event_id, score_type, payload, bracket_game_id, status,
               reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        FROM score_submissions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Row-locked read used inside the acceptance transaction so two concurrent
/// acceptances of the same submission serialize on the row.
pub async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ScoreSubmissionRow>> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        SELECT id, event_id, score_type, payload, bracket_game_id, status,
               reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        FROM score_submissions
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn mark_accepted<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    reviewed_by: Option<Uuid>,
    seeding_score_id: Option<Uuid>,
) -> SqlxResult<ScoreSubmissionRow> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        UPDATE score_submissions
        SET status = 'accepted'::submission_status,
            reviewed_by = $2,
            reviewed_at = NOW(),
            seeding_score_id = COALESCE($3, seeding_score_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, score_type, payload, bracket_game_id, status,
                  reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(reviewed_by)
    .bind(seeding_score_id)
    .fetch_one(executor)
    .await
}

pub async fn mark_rejected<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    reviewed_by: Option<Uuid>,
) -> SqlxResult<ScoreSubmissionRow> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        UPDATE score_submissions
        SET status = 'rejected'::submission_status,
            reviewed_by = $2,
            reviewed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, score_type, payload, bracket_game_id, status,
                  reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(reviewed_by)
    .fetch_one(executor)
    .await
}

pub async fn list_pending_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<ScoreSubmissionRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        SELECT id, event_id, score_type, payload, bracket_game_id, status,
               reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        FROM score_submissions
        WHERE event_id = $1 AND status = 'pending'
        ORDER BY created_at ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(event_id)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

/// Seeding submissions that count as "a score exists" for queue sync:
/// pending ones not yet folded into the ledger plus accepted ones.
pub async fn list_open_seeding_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<ScoreSubmissionRow>> {
    sqlx::query_as::<_, ScoreSubmissionRow>(
        r#"
        SELECT id, event_id, score_type, payload, bracket_game_id, status,
               reviewed_by, reviewed_at, seeding_score_id, created_at, updated_at
        FROM score_submissions
        WHERE event_id = $1
          AND score_type = 'seeding'
          AND status IN ('pending', 'accepted')
        ORDER BY created_at ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}
