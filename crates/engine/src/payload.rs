use serde_json::Value;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Field contract for seeding submission payloads. The submitting side
/// identifies the team either directly or by its event-scoped number.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedingPayload {
    pub team_id: Option<Uuid>,
    pub team_number: Option<i32>,
    pub round_number: i32,
    pub score: Option<f64>,
}

/// Field contract for bracket submission payloads. The target game itself
/// is carried on the submission row, not in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketPayload {
    pub winner_team_id: Option<Uuid>,
    pub winner_team_number: Option<i32>,
    pub winner_score: Option<f64>,
    pub loser_score: Option<f64>,
}

fn uuid_field(payload: &Value, key: &str) -> EngineResult<Option<Uuid>> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Uuid::parse_str(raw).map(Some).map_err(|_| {
            EngineError::BadRequest(format!("payload field {} is not a valid uuid", key))
        }),
        Some(_) => Err(EngineError::BadRequest(format!(
            "payload field {} is not a valid uuid",
            key
        ))),
    }
}

fn int_field(payload: &Value, key: &str) -> EngineResult<Option<i32>> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(|n| Some(n as i32)).ok_or_else(|| {
            EngineError::BadRequest(format!("payload field {} is not an integer", key))
        }),
    }
}

fn number_field(payload: &Value, key: &str) -> EngineResult<Option<f64>> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            EngineError::BadRequest(format!("payload field {} is not a number", key))
        }),
    }
}

impl SeedingPayload {
    pub fn parse(payload: &Value) -> EngineResult<Self> {
        let team_id = uuid_field(payload, "team_id")?;
        let team_number = int_field(payload, "team_number")?;
        if team_id.is_none() && team_number.is_none() {
            return Err(EngineError::BadRequest(
                "seeding payload names neither team_id nor team_number".into(),
            ));
        }
        let round_number = int_field(payload, "round_number")?.ok_or_else(|| {
            EngineError::BadRequest("seeding payload is missing round_number".into())
        })?;
        let score = number_field(payload, "score")?;

        Ok(Self {
            team_id,
            team_number,
            round_number,
            score,
        })
    }
}

impl BracketPayload {
    pub fn parse(payload: &Value) -> EngineResult<Self> {
        let winner_team_id = uuid_field(payload, "winner_team_id")?;
        let winner_team_number = int_field(payload, "winner_team_number")?;
        if winner_team_id.is_none() && winner_team_number.is_none() {
            return Err(EngineError::BadRequest(
                "bracket payload does not identify a winner".into(),
            ));
        }

        Ok(Self {
            winner_team_id,
            winner_team_number,
            winner_score: number_field(payload, "winner_score")?,
            loser_score: number_field(payload, "loser_score")?,
        })
    }
}
