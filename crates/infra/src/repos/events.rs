use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::EventRow;

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub name: String,
    pub seeding_rounds: i32,
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateEvent) -> SqlxResult<EventRow> {
    sqlx::query_as::<_, EventRow>(
        r#"
        INSERT INTO events (name, seeding_rounds)
        VALUES ($1, $2)
        RETURNING id, name, seeding_rounds, created_at, updated_at
        "#,
    )
    .bind(data.name)
    .bind(data.seeding_rounds)
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<Option<EventRow>> {
    sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, name, seeding_rounds, created_at, updated_at
        FROM events
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}
