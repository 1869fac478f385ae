use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::BracketRow;

#[derive(Debug, Clone)]
pub struct CreateBracket {
    pub event_id: Uuid,
    pub name: String,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateBracket,
) -> SqlxResult<BracketRow> {
    sqlx::query_as::<_, BracketRow>(
        r#"
        INSERT INTO brackets (event_id, name)
        VALUES ($1, $2)
        RETURNING id, event_id, name, created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.name)
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<Option<BracketRow>> {
    sqlx::query_as::<_, BracketRow>(
        r#"
        SELECT id, event_id, name, created_at, updated_at
        FROM brackets
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
) -> SqlxResult<Vec<BracketRow>> {
    sqlx::query_as::<_, BracketRow>(
        r#"
        SELECT id, event_id, name, created_at, updated_at
        FROM brackets
        WHERE event_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}
