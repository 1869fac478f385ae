use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::GameQueueItemRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "queue_status", rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Called,
    InProgress,
    Completed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Called => "called",
            QueueStatus::InProgress => "in_progress",
            QueueStatus::Completed => "completed",
        }
    }

    /// Operator progression. `called -> queued` un-calls a table;
    /// `completed -> queued` only happens when sync reverts an item whose
    /// backing score was deleted.
    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (QueueStatus::Queued, QueueStatus::Called)
                | (QueueStatus::Queued, QueueStatus::InProgress)
                | (QueueStatus::Queued, QueueStatus::Completed)
                | (QueueStatus::Called, QueueStatus::Queued)
                | (QueueStatus::Called, QueueStatus::InProgress)
                | (QueueStatus::Called, QueueStatus::Completed)
                | (QueueStatus::InProgress, QueueStatus::Completed)
                | (QueueStatus::Completed, QueueStatus::Queued)
        )
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(QueueStatus::Queued),
            "called" => Ok(QueueStatus::Called),
            "in_progress" => Ok(QueueStatus::InProgress),
            "completed" => Ok(QueueStatus::Completed),
            _ => Err(format!("Unknown queue status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateQueueItem {
    pub event_id: Uuid,
    pub seeding_team_id: Option<Uuid>,
    pub seeding_round: Option<i32>,
    pub bracket_game_id: Option<Uuid>,
    pub queue_position: i32,
    pub status: QueueStatus,
}

pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateQueueItem,
) -> SqlxResult<GameQueueItemRow> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        INSERT INTO game_queue (
            event_id, seeding_team_id, seeding_round, bracket_game_id,
            queue_position, status
        )
        VALUES ($1, $2, $3, $4, $5, $6::queue_status)
        RETURNING id, event_id, seeding_team_id, seeding_round, bracket_game_id,
                  queue_position, status, table_number, called_at, created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.seeding_team_id)
    .bind(data.seeding_round)
    .bind(data.bracket_game_id)
    .bind(data.queue_position)
    .bind(data.status.as_str())
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        SELECT id, event_id, seeding_team_id, seeding_round, bracket_game_id,
               queue_position, status, table_number, called_at, created_at, updated_at
        FROM game_queue
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        SELECT id, event_id, seeding_team_id, seeding_round, bracket_game_id,
               queue_position, status, table_number, called_at, created_at, updated_at
        FROM game_queue
        WHERE event_id = $1
        ORDER BY queue_position ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}

pub async fn get_seeding_item<'e>(
    executor: impl PgExecutor<'e>,
    team_id: Uuid,
    round: i32,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        SELECT id, event_id, seeding_team_id, seeding_round, bracket_game_id,
               queue_position, status, table_number, called_at, created_at, updated_at
        FROM game_queue
        WHERE seeding_team_id = $1 AND seeding_round = $2
        "#,
    )
    .bind(team_id)
    .bind(round)
    .fetch_optional(executor)
    .await
}

pub async fn get_bracket_item<'e>(
    executor: impl PgExecutor<'e>,
    bracket_game_id: Uuid,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        SELECT id, event_id, seeding_team_id, seeding_round, bracket_game_id,
               queue_position, status, table_number, called_at, created_at, updated_at
        FROM game_queue
        WHERE bracket_game_id = $1
        "#,
    )
    .bind(bracket_game_id)
    .fetch_optional(executor)
    .await
}

/// Highest queue_position in use for an event; new items append after it.
pub async fn max_position<'e>(executor: impl PgExecutor<'e>, event_id: Uuid) -> SqlxResult<i32> {
    let row: (Option<i32>,) =
        sqlx::query_as("SELECT MAX(queue_position) FROM game_queue WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.unwrap_or(0))
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: QueueStatus,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        UPDATE game_queue
        SET status = $2::queue_status,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, seeding_team_id, seeding_round, bracket_game_id,
                  queue_position, status, table_number, called_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(executor)
    .await
}

/// Sync reversion: a completed item whose backing score disappeared goes
/// back to queued with its call metadata cleared. queue_position survives.
pub async fn revert_to_queued<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        UPDATE game_queue
        SET status = 'queued'::queue_status,
            table_number = NULL,
            called_at = NULL,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, seeding_team_id, seeding_round, bracket_game_id,
                  queue_position, status, table_number, called_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn set_called<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    table_number: Option<i32>,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        UPDATE game_queue
        SET status = 'called'::queue_status,
            table_number = $2,
            called_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, seeding_team_id, seeding_round, bracket_game_id,
                  queue_position, status, table_number, called_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(table_number)
    .fetch_optional(executor)
    .await
}

pub async fn set_position<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    queue_position: i32,
) -> SqlxResult<Option<GameQueueItemRow>> {
    sqlx::query_as::<_, GameQueueItemRow>(
        r#"
        UPDATE game_queue
        SET queue_position = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, seeding_team_id, seeding_round, bracket_game_id,
                  queue_position, status, table_number, called_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(queue_position)
    .fetch_optional(executor)
    .await
}

/// Destructive: used only by the populate-from-seeding setup operation.
pub async fn delete_seeding_items<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<u64> {
    let result =
        sqlx::query("DELETE FROM game_queue WHERE event_id = $1 AND seeding_team_id IS NOT NULL")
            .bind(event_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

/// Destructive: used only by the populate-from-bracket setup operation.
pub async fn delete_bracket_items<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<u64> {
    let result =
        sqlx::query("DELETE FROM game_queue WHERE event_id = $1 AND bracket_game_id IS NOT NULL")
            .bind(event_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}
