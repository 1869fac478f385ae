use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use infra::repos::seeding_rankings::UpsertSeedingRanking;
use infra::repos::{events, seeding_rankings, seeding_scores, teams};

use crate::error::{EngineError, EngineResult};

/// Result of a full ranking recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalculateOutcome {
    pub teams_ranked: usize,
    pub teams_unranked: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRanking {
    pub team_id: Uuid,
    pub seed_average: Option<f64>,
    pub tiebreaker: Option<f64>,
    pub seed_rank: Option<i32>,
    pub raw_seed_score: Option<f64>,
}

/// Pure ranking math over each team's non-null seeding scores.
///
/// - seed average: mean of the two highest scores, or the single score,
///   or None with no scores.
/// - tiebreaker: third-highest score when three or more exist, otherwise
///   the sum of what is available, or None with no scores.
/// - rank: position in (average desc, tiebreaker desc) order over teams
///   with an average; scoreless teams keep a null rank and sort last.
/// - raw seed score: 0.75 weighted on rank position + 0.25 weighted on
///   average relative to the top average.
pub fn compute_rankings(scores_by_team: &[(Uuid, Vec<f64>)]) -> Vec<ComputedRanking> {
    let mut rankings: Vec<ComputedRanking> = scores_by_team
        .iter()
        .map(|(team_id, scores)| {
            let mut sorted = scores.clone();
            sorted.sort_by(|a, b| b.total_cmp(a));

            let seed_average = match sorted.len() {
                0 => None,
                1 => Some(sorted[0]),
                _ => Some((sorted[0] + sorted[1]) / 2.0),
            };
            let tiebreaker = match sorted.len() {
                0 => None,
                1 | 2 => Some(sorted.iter().sum()),
                _ => Some(sorted[2]),
            };

            ComputedRanking {
                team_id: *team_id,
                seed_average,
                tiebreaker,
                seed_rank: None,
                raw_seed_score: None,
            }
        })
        .collect();

    let mut ranked: Vec<usize> = rankings
        .iter()
        .enumerate()
        .filter(|(_, r)| r.seed_average.is_some())
        .map(|(i, _)| i)
        .collect();
    let sort_key = |r: &ComputedRanking| {
        (
            r.seed_average.unwrap_or(f64::NEG_INFINITY),
            r.tiebreaker.unwrap_or(f64::NEG_INFINITY),
        )
    };
    ranked.sort_by(|&a, &b| {
        let (ka, kb) = (sort_key(&rankings[a]), sort_key(&rankings[b]));
        kb.0.total_cmp(&ka.0).then(kb.1.total_cmp(&ka.1))
    });

    let n = ranked.len();
    let max_average = ranked
        .first()
        .and_then(|&i| rankings[i].seed_average)
        .unwrap_or(0.0);

    for (position, &i) in ranked.iter().enumerate() {
        let rank = (position + 1) as i32;
        let position_component = (n as f64 - rank as f64 + 1.0) / n as f64;
        let average_component = if max_average > 0.0 {
            rankings[i].seed_average.unwrap_or(0.0) / max_average
        } else {
            0.0
        };
        rankings[i].seed_rank = Some(rank);
        rankings[i].raw_seed_score = Some(0.75 * position_component + 0.25 * average_component);
    }

    rankings
}

/// Fully recompute an event's ranking table and upsert one row per team in
/// a single transaction. Safe to run on every accepted seeding score; this
/// is the single source of truth for rank.
pub async fn recalculate(pool: &PgPool, event_id: Uuid) -> EngineResult<RecalculateOutcome> {
    events::get(pool, event_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("event {} does not exist", event_id)))?;

    let event_teams = teams::list_by_event(pool, event_id).await?;
    let scores = seeding_scores::list_by_event(pool, event_id).await?;

    let mut by_team: HashMap<Uuid, Vec<f64>> = HashMap::new();
    for score in &scores {
        if let Some(value) = score.score {
            by_team.entry(score.team_id).or_default().push(value);
        }
    }

    let scores_by_team: Vec<(Uuid, Vec<f64>)> = event_teams
        .iter()
        .map(|team| (team.id, by_team.remove(&team.id).unwrap_or_default()))
        .collect();

    let computed = compute_rankings(&scores_by_team);

    let mut tx = pool.begin().await?;
    for ranking in &computed {
        seeding_rankings::upsert(
            &mut *tx,
            UpsertSeedingRanking {
                event_id,
                team_id: ranking.team_id,
                seed_average: ranking.seed_average,
                tiebreaker: ranking.tiebreaker,
                seed_rank: ranking.seed_rank,
                raw_seed_score: ranking.raw_seed_score,
            },
        )
        .await?;
    }
    tx.commit().await?;

    let teams_ranked = computed.iter().filter(|r| r.seed_rank.is_some()).count();
    let teams_unranked = computed.len() - teams_ranked;

    tracing::debug!(
        "Recomputed seed rankings for event {}: {} ranked, {} unranked",
        event_id,
        teams_ranked,
        teams_unranked
    );

    Ok(RecalculateOutcome {
        teams_ranked,
        teams_unranked,
    })
}
