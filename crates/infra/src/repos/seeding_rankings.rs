use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::SeedingRankingRow;

#[derive(Debug, Clone)]
pub struct UpsertSeedingRanking {
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub seed_average: Option<f64>,
    pub tiebreaker: Option<f64>,
    pub seed_rank: Option<i32>,
    pub raw_seed_score: Option<f64>,
}

/// Insert-or-update keyed by team id; the ranking table is a fully
/// recomputed materialized view, so every recompute upserts every team.
pub async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    data: UpsertSeedingRanking,
) -> SqlxResult<SeedingRankingRow> {
    sqlx::query_as::<_, SeedingRankingRow>(
        r#"
        INSERT INTO seeding_rankings (event_id, team_id, seed_average, tiebreaker, seed_rank, raw_seed_score)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (team_id)
        DO UPDATE SET seed_average = EXCLUDED.seed_average,
                      tiebreaker = EXCLUDED.tiebreaker,
                      seed_rank = EXCLUDED.seed_rank,
                      raw_seed_score = EXCLUDED.raw_seed_score,
                      updated_at = NOW()
        RETURNING id, event_id, team_id, seed_average, tiebreaker, seed_rank, raw_seed_score,
                  created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.team_id)
    .bind(data.seed_average)
    .bind(data.tiebreaker)
    .bind(data.seed_rank)
    .bind(data.raw_seed_score)
    .fetch_one(executor)
    .await
}

pub async fn get_by_team<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
) -> SqlxResult<Option<SeedingRankingRow>> {
    sqlx::query_as::<_, SeedingRankingRow>(
        r#"
        SELECT id, event_id, team_id, seed_average, tiebreaker, seed_rank, raw_seed_score,
               created_at, updated_at
        FROM seeding_rankings
        WHERE team_id = $1
        "#,
    )
    .bind(team_id)
    .fetch_optional(executor)
    .await
}

/// Ranked teams first in rank order; unranked teams last.
pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<SeedingRankingRow>> {
    sqlx::query_as::<_, SeedingRankingRow>(
        r#"
        SELECT id, event_id, team_id, seed_average, tiebreaker, seed_rank, raw_seed_score,
               created_at, updated_at
        FROM seeding_rankings
        WHERE event_id = $1
        ORDER BY seed_rank ASC NULLS LAST
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}
