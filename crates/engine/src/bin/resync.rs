//! Re-run the idempotent follow-up steps for an event: queue sync, bye
//! resolution and ranking recompute. Recovery path for an interrupted
//! post-acceptance cascade.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use engine::services::{byes, queue, rankings};
use infra::repos::brackets;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let event_id: Uuid = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: resync <event-id>"))?
        .parse()?;

    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let pool = infra::db::connect(&std::env::var("DATABASE_URL")?, max_connections).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let seeding = queue::sync_seeding_queue(&pool, event_id).await?;
    tracing::info!(
        "Seeding queue: {} created, {} completed, {} reverted",
        seeding.created,
        seeding.completed,
        seeding.reverted
    );

    for bracket in brackets::list_by_event(&pool, event_id).await? {
        let resolution = byes::resolve_byes(&pool, bracket.id).await?;
        tracing::info!(
            "Bracket {}: {} byes resolved, {} slots filled, {} games flipped ready",
            bracket.name,
            resolution.bye_games_resolved,
            resolution.slots_filled,
            resolution.ready_games_updated
        );
    }

    let bracket_queue = queue::sync_bracket_queue(&pool, event_id).await?;
    tracing::info!(
        "Bracket queue: {} created, {} completed, {} reverted",
        bracket_queue.created,
        bracket_queue.completed,
        bracket_queue.reverted
    );

    let outcome = rankings::recalculate(&pool, event_id).await?;
    tracing::info!(
        "Rankings: {} ranked, {} unranked",
        outcome.teams_ranked,
        outcome.teams_unranked
    );

    Ok(())
}
