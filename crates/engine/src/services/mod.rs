pub mod acceptance;
pub mod audit;
pub mod byes;
pub mod queue;
pub mod rankings;

pub use acceptance::{accept_score, reject_score, AcceptScoreOutcome, AcceptScoreParams};
pub use byes::{resolve_byes, ByeResolution};
pub use queue::{sync_bracket_queue, sync_seeding_queue, QueueSyncOutcome};
pub use rankings::{recalculate, RecalculateOutcome};
