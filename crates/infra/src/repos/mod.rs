pub mod audit_log;
pub mod bracket_games;
pub mod brackets;
pub mod events;
pub mod game_queue;
pub mod score_submissions;
pub mod seeding_rankings;
pub mod seeding_scores;
pub mod teams;

pub use audit_log::NewAuditEntry;
pub use bracket_games::{CreateBracketGame, GameStatus, RecordGameResult};
pub use brackets::CreateBracket;
pub use events::CreateEvent;
pub use game_queue::{CreateQueueItem, QueueStatus};
pub use score_submissions::{CreateScoreSubmission, ScoreType, SubmissionStatus};
pub use seeding_rankings::UpsertSeedingRanking;
pub use seeding_scores::UpsertSeedingScore;
pub use teams::{CreateTeam, TeamStatus};
