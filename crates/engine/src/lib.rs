//! Score-acceptance and bracket-progression engine: commits validated
//! score submissions into the seeding ledger and bracket graph, resolves
//! byes, recomputes seed rankings and keeps the game queue in sync.

pub mod error;
pub mod payload;
pub mod services;

pub use error::{EngineError, EngineResult};
