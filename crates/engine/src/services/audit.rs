use sqlx::PgPool;

use infra::repos::audit_log::{self, NewAuditEntry};

/// Audit writes are best-effort: a failed write is logged and swallowed,
/// never rolling back the acceptance that produced it.
pub async fn record_best_effort(pool: &PgPool, entry: NewAuditEntry) {
    let action = entry.action.clone();
    if let Err(err) = audit_log::record(pool, entry).await {
        tracing::warn!("Failed to write audit entry for {}: {}", action, err);
    }
}
