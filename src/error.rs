//! Engine error taxonomy.
//!
//! Most failure classes in this system never reach the caller: validation
//! problems substitute safe defaults, concurrency conflicts and state
//! errors are benign no-ops. What remains is unknown ids (soft, the caller
//! simply re-fetches) and storage failures (hard, the core cannot guess a
//! rating profile).

use thiserror::Error;
use uuid::Uuid;

use crate::profile::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error(transparent)]
  Storage(#[from] StorageError),
  #[error("unknown session {0}")]
  UnknownSession(Uuid),
  #[error("unknown game {0}")]
  UnknownGame(Uuid),
}

impl EngineError {
  /// Hard failures surface to the user as a generic "try again"; everything
  /// else renders as a normal response.
  pub fn is_hard(&self) -> bool {
    matches!(self, EngineError::Storage(_))
  }
}
