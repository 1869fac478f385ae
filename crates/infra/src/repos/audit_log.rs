use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::AuditLogRow;
use crate::pagination::LimitOffset;

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub event_id: Uuid,
    /// None marks a system auto-acceptance as opposed to an admin review.
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub ip: Option<String>,
}

/// Insert a new audit entry and return it.
pub async fn record<'e>(
    executor: impl PgExecutor<'e>,
    entry: NewAuditEntry,
) -> SqlxResult<AuditLogRow> {
    sqlx::query_as::<_, AuditLogRow>(
        r#"
        INSERT INTO audit_log
        (event_id, user_id, action, entity_type, entity_id, old_value, new_value, ip)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, event_id, user_id, action, entity_type, entity_id,
                  old_value, new_value, ip, created_at
        "#,
    )
    .bind(entry.event_id)
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.old_value)
    .bind(entry.new_value)
    .bind(entry.ip)
    .fetch_one(executor)
    .await
}

/// List audit entries for an event, newest first.
/// Optionally filter by action.
pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
    action_filter: Option<&str>,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<AuditLogRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, AuditLogRow>(
        r#"
        SELECT id, event_id, user_id, action, entity_type, entity_id,
               old_value, new_value, ip, created_at
        FROM audit_log
        WHERE event_id = $1
          AND ($2::text IS NULL OR action = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(event_id)
    .bind(action_filter)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

/// Count audit entries for an event, optionally filtered by action.
pub async fn count_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
    action_filter: Option<&str>,
) -> SqlxResult<i64> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM audit_log
        WHERE event_id = $1
          AND ($2::text IS NULL OR action = $2)
        "#,
    )
    .bind(event_id)
    .bind(action_filter)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}
