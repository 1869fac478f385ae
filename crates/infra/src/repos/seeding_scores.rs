use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::SeedingScoreRow;

#[derive(Debug, Clone)]
pub struct UpsertSeedingScore {
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub round_number: i32,
    pub score: Option<f64>,
    pub submission_id: Option<Uuid>,
}

/// One row per (team, round); a new submission for the same pair overwrites
/// rather than appends.
pub async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    data: UpsertSeedingScore,
) -> SqlxResult<SeedingScoreRow> {
    sqlx::query_as::<_, SeedingScoreRow>(
        r#"
        INSERT INTO seeding_scores (event_id, team_id, round_number, score, submission_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (team_id, round_number)
        DO UPDATE SET score = EXCLUDED.score,
                      submission_id = EXCLUDED.submission_id,
                      updated_at = NOW()
        RETURNING id, event_id, team_id, round_number, score, submission_id,
                  created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.team_id)
    .bind(data.round_number)
    .bind(data.score)
    .bind(data.submission_id)
    .fetch_one(executor)
    .await
}

pub async fn get_by_team_round<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    round_number: i32,
) -> SqlxResult<Option<SeedingScoreRow>> {
    sqlx::query_as::<_, SeedingScoreRow>(
        r#"
        SELECT id, event_id, team_id, round_number, score, submission_id,
               created_at, updated_at
        FROM seeding_scores
        WHERE team_id = $1 AND round_number = $2
        "#,
    )
    .bind(team_id)
    .bind(round_number)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<SeedingScoreRow>> {
    sqlx::query_as::<_, SeedingScoreRow>(
        r#"
        SELECT id, event_id, team_id, round_number, score, submission_id,
               created_at, updated_at
        FROM seeding_scores
        WHERE event_id = $1
        ORDER BY team_id, round_number ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}

pub async fn list_by_team<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
) -> SqlxResult<Vec<SeedingScoreRow>> {
    sqlx::query_as::<_, SeedingScoreRow>(
        r#"
        SELECT id, event_id, team_id, round_number, score, submission_id,
               created_at, updated_at
        FROM seeding_scores
        WHERE team_id = $1
        ORDER BY round_number ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(executor)
    .await
}

/// Delete a score (admin correction path). Queue sync reverts the matching
/// queue item afterwards.
pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<bool> {
    let result = sqlx::query("DELETE FROM seeding_scores WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
