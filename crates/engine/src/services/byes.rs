use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use infra::models::BracketGameRow;
use infra::repos::bracket_games::GameStatus;
use infra::repos::{bracket_games, brackets};

use crate::error::{EngineError, EngineResult};

/// Result of one bye-resolution pass over a bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByeResolution {
    pub bye_games_resolved: usize,
    pub slots_filled: usize,
    pub ready_games_updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByeAdvancement {
    pub game_id: Uuid,
    pub winner_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotFill {
    pub game_id: Uuid,
    pub slot: i32,
    pub team_id: Uuid,
}

/// Writes needed to bring a bracket to its bye fixpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ByePlan {
    pub byes: Vec<ByeAdvancement>,
    pub fills: Vec<SlotFill>,
    pub ready: Vec<Uuid>,
}

impl ByePlan {
    pub fn is_empty(&self) -> bool {
        self.byes.is_empty() && self.fills.is_empty() && self.ready.is_empty()
    }
}

fn winner_edge(game: &BracketGameRow) -> Option<(Uuid, i32)> {
    match (game.winner_advances_to_id, game.winner_slot) {
        (Some(target), Some(slot)) => Some((target, slot)),
        _ => None,
    }
}

fn loser_edge(game: &BracketGameRow) -> Option<(Uuid, i32)> {
    match (game.loser_advances_to_id, game.loser_slot) {
        (Some(target), Some(slot)) => Some((target, slot)),
        _ => None,
    }
}

/// Winner and loser edges naming the same downstream game mark a
/// grand-final "reset" pairing.
fn is_reset_edge(game: &BracketGameRow) -> bool {
    game.winner_advances_to_id.is_some()
        && game.winner_advances_to_id == game.loser_advances_to_id
}

/// Whether a game's loser edge can still deliver anything. Byes never
/// produce a loser. On a reset pairing the loser only advances when the
/// losers-bracket seat (slot 2) takes the game and forces the replay; a
/// win from the winners-bracket seat (slot 1) ends the bracket and the
/// loser stays eliminated.
fn loser_edge_dead(game: &BracketGameRow) -> bool {
    if game.status == GameStatus::Bye {
        return true;
    }
    if !is_reset_edge(game) {
        return false;
    }
    match game.winner_id.filter(|_| game.status == GameStatus::Completed) {
        Some(winner) => game.slot_of(winner) == Some(1),
        // Not decided yet; the edge may still deliver.
        None => false,
    }
}

/// Whether some other game's forward edge can still deliver a team into
/// `(target, slot)`. Winner edges always count (every game eventually has a
/// winner); loser edges stop counting once dead.
fn slot_is_fed(games: &HashMap<Uuid, BracketGameRow>, target: Uuid, slot: i32) -> bool {
    games.values().any(|g| {
        if g.id == target {
            return false;
        }
        if winner_edge(g) == Some((target, slot)) {
            return true;
        }
        loser_edge(g) == Some((target, slot)) && !loser_edge_dead(g)
    })
}

/// Deliver `team` along an edge into the named slot if that slot is still
/// empty. Self-loops are never followed.
fn deliver(
    games: &mut HashMap<Uuid, BracketGameRow>,
    fills: &mut Vec<SlotFill>,
    source: Uuid,
    edge: Option<(Uuid, i32)>,
    team: Uuid,
) -> bool {
    let Some((target, slot)) = edge else {
        return false;
    };
    if target == source {
        return false;
    }
    let Some(game) = games.get_mut(&target) else {
        return false;
    };
    let slot_ref = match slot {
        1 => &mut game.team1_id,
        2 => &mut game.team2_id,
        _ => return false,
    };
    if slot_ref.is_some() {
        return false;
    }
    *slot_ref = Some(team);
    fills.push(SlotFill {
        game_id: target,
        slot,
        team_id: team,
    });
    true
}

/// Compute the fixpoint of bye advancement over a bracket's games.
///
/// A game is a bye when its status says so, or when it has exactly one
/// occupant and the empty slot is structurally empty (no remaining edge can
/// fill it). Resolving one bye can expose the next, so the scan repeats
/// until nothing changes. Completed games re-deliver their winner/loser
/// into still-empty downstream slots, which makes the pass a convergence
/// operation after any interrupted propagation.
pub fn plan_bye_resolution(games: &[BracketGameRow]) -> ByePlan {
    let order: Vec<Uuid> = {
        let mut sorted: Vec<&BracketGameRow> = games.iter().collect();
        sorted.sort_by_key(|g| (g.round, g.game_number));
        sorted.iter().map(|g| g.id).collect()
    };

    let mut state: HashMap<Uuid, BracketGameRow> =
        games.iter().map(|g| (g.id, g.clone())).collect();

    let mut plan = ByePlan::default();

    // Bounded by the number of games: each productive pass resolves at
    // least one bye or fills at least one slot.
    for _ in 0..=games.len() {
        let mut changed = false;

        for id in &order {
            let game = state[id].clone();

            if let Some(winner) = game.winner_id.filter(|_| game.status.is_final()) {
                changed |= deliver(
                    &mut state,
                    &mut plan.fills,
                    game.id,
                    winner_edge(&game),
                    winner,
                );
                if game.status == GameStatus::Completed && !loser_edge_dead(&game) {
                    if let Some(loser) = game.loser_id {
                        changed |= deliver(
                            &mut state,
                            &mut plan.fills,
                            game.id,
                            loser_edge(&game),
                            loser,
                        );
                    }
                }
                continue;
            }
            if game.status == GameStatus::Completed {
                continue;
            }

            let (occupant, empty_slot) = match (game.team1_id, game.team2_id) {
                (Some(team), None) => (team, 2),
                (None, Some(team)) => (team, 1),
                _ => continue,
            };

            // A game explicitly created as a bye resolves unconditionally;
            // anything else only once its empty slot can no longer be fed.
            if game.status == GameStatus::Bye || !slot_is_fed(&state, game.id, empty_slot) {
                if let Some(entry) = state.get_mut(id) {
                    entry.status = GameStatus::Bye;
                    entry.winner_id = Some(occupant);
                }
                plan.byes.push(ByeAdvancement {
                    game_id: game.id,
                    winner_id: occupant,
                });
                deliver(
                    &mut state,
                    &mut plan.fills,
                    game.id,
                    winner_edge(&game),
                    occupant,
                );
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    for id in &order {
        let game = &state[id];
        if game.status == GameStatus::Pending && game.both_slots_filled() {
            plan.ready.push(*id);
        }
    }

    plan
}

/// Resolve byes across a whole bracket and flip newly fillable games to
/// ready. Safe to call repeatedly and after any slot-filling event.
pub async fn resolve_byes(pool: &PgPool, bracket_id: Uuid) -> EngineResult<ByeResolution> {
    brackets::get(pool, bracket_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("bracket {} does not exist", bracket_id)))?;

    let games = bracket_games::list_by_bracket(pool, bracket_id).await?;
    let plan = plan_bye_resolution(&games);

    if plan.is_empty() {
        return Ok(ByeResolution::default());
    }

    let mut tx = pool.begin().await?;
    for fill in &plan.fills {
        bracket_games::fill_slot(&mut *tx, fill.game_id, fill.slot, fill.team_id).await?;
    }
    for bye in &plan.byes {
        bracket_games::mark_bye(&mut *tx, bye.game_id, bye.winner_id).await?;
    }
    for game_id in &plan.ready {
        bracket_games::set_status(&mut *tx, *game_id, GameStatus::Ready).await?;
    }
    tx.commit().await?;

    tracing::debug!(
        "Resolved byes for bracket {}: {} byes, {} slots filled, {} games ready",
        bracket_id,
        plan.byes.len(),
        plan.fills.len(),
        plan.ready.len()
    );

    Ok(ByeResolution {
        bye_games_resolved: plan.byes.len(),
        slots_filled: plan.fills.len(),
        ready_games_updated: plan.ready.len(),
    })
}
