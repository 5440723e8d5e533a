//! Rating-profile persistence boundary.
//!
//! The engine never assumes a storage technology: it talks to a
//! `ProfileStore` and treats store failures as the one hard error class
//! (every other failure in the system degrades to a safe default or an
//! idempotent no-op). The in-memory implementation backs the service and
//! the tests.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;
use tracing::instrument;

use crate::domain::{RatingMode, RatingProfile};

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("profile store unavailable: {0}")]
  Unavailable(String),
  #[error("profile store poisoned")]
  Poisoned,
}

/// Load/save boundary to durable storage. A missing profile is not an
/// error: new users start from the default profile.
pub trait ProfileStore: Send + Sync {
  fn load(&self, user_id: &str, mode: RatingMode) -> Result<RatingProfile, StorageError>;
  fn save(
    &self,
    user_id: &str,
    mode: RatingMode,
    profile: &RatingProfile,
  ) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct InMemoryProfileStore {
  profiles: RwLock<HashMap<(String, RatingMode), RatingProfile>>,
}

impl ProfileStore for InMemoryProfileStore {
  #[instrument(level = "debug", skip(self))]
  fn load(&self, user_id: &str, mode: RatingMode) -> Result<RatingProfile, StorageError> {
    let map = self.profiles.read().map_err(|_| StorageError::Poisoned)?;
    Ok(
      map
        .get(&(user_id.to_string(), mode))
        .cloned()
        .unwrap_or_default(),
    )
  }

  #[instrument(level = "debug", skip(self, profile), fields(rating = profile.rating))]
  fn save(
    &self,
    user_id: &str,
    mode: RatingMode,
    profile: &RatingProfile,
  ) -> Result<(), StorageError> {
    let mut map = self.profiles.write().map_err(|_| StorageError::Poisoned)?;
    map.insert((user_id.to_string(), mode), profile.clone());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::DEFAULT_RATING;

  #[test]
  fn missing_profile_defaults() {
    let store = InMemoryProfileStore::default();
    let p = store.load("nobody", RatingMode::Solo).unwrap();
    assert_eq!(p.rating, DEFAULT_RATING);
  }

  #[test]
  fn modes_are_independent() {
    let store = InMemoryProfileStore::default();
    let mut p = store.load("ada", RatingMode::Solo).unwrap();
    p.rating = 1234;
    store.save("ada", RatingMode::Solo, &p).unwrap();

    assert_eq!(store.load("ada", RatingMode::Solo).unwrap().rating, 1234);
    assert_eq!(
      store.load("ada", RatingMode::Multiplayer).unwrap().rating,
      DEFAULT_RATING
    );
  }
}
