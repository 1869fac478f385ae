use sqlx::{PgExecutor, Result as SqlxResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::TeamRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "team_status", rename_all = "snake_case")]
pub enum TeamStatus {
    Registered,
    CheckedIn,
    NoShow,
    Withdrawn,
}

impl TeamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamStatus::Registered => "registered",
            TeamStatus::CheckedIn => "checked_in",
            TeamStatus::NoShow => "no_show",
            TeamStatus::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for TeamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(TeamStatus::Registered),
            "checked_in" => Ok(TeamStatus::CheckedIn),
            "no_show" => Ok(TeamStatus::NoShow),
            "withdrawn" => Ok(TeamStatus::Withdrawn),
            _ => Err(format!("Unknown team status: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub event_id: Uuid,
    pub team_number: i32,
    pub name: String,
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateTeam) -> SqlxResult<TeamRow> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        INSERT INTO teams (event_id, team_number, name)
        VALUES ($1, $2, $3)
        RETURNING id, event_id, team_number, name, status, created_at, updated_at
        "#,
    )
    .bind(data.event_id)
    .bind(data.team_number)
    .bind(data.name)
    .fetch_one(executor)
    .await
}

pub async fn get<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<Option<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, event_id, team_number, name, status, created_at, updated_at
        FROM teams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_number<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
    team_number: i32,
) -> SqlxResult<Option<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, event_id, team_number, name, status, created_at, updated_at
        FROM teams
        WHERE event_id = $1 AND team_number = $2
        "#,
    )
    .bind(event_id)
    .bind(team_number)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_event<'e>(
    executor: impl PgExecutor<'e>,
    event_id: Uuid,
) -> SqlxResult<Vec<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, event_id, team_number, name, status, created_at, updated_at
        FROM teams
        WHERE event_id = $1
        ORDER BY team_number ASC
        "#,
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}

pub async fn update_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: TeamStatus,
) -> SqlxResult<Option<TeamRow>> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        UPDATE teams
        SET status = $2::team_status,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, event_id, team_number, name, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(executor)
    .await
}
