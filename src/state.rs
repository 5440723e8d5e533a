//! Application state: in-memory stores for sessions and games, the profile
//! store boundary, and the engine configuration.
//!
//! Locking discipline:
//!   - `sessions` is a plain RwLock'd map; solo sessions have one writer.
//!   - each game lives behind its own `tokio::sync::Mutex`, so join,
//!     submission and finalization are serialized per game id while
//!     different games proceed independently.
//!   - `matchmaking` is a dedicated Mutex held only while claiming or
//!     creating a waiting game, making the claim an atomic compare-and-set:
//!     of two simultaneous joiners, exactly one wins a given waiting slot.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use uuid::Uuid;

use crate::config::{load_engine_config_from_env, EngineConfig};
use crate::domain::{GameStatus, MultiplayerGame, TestSession};
use crate::profile::{InMemoryProfileStore, ProfileStore};

pub type SharedGame = Arc<Mutex<MultiplayerGame>>;

#[derive(Clone)]
pub struct AppState {
    pub config: EngineConfig,
    pub sessions: Arc<RwLock<HashMap<Uuid, TestSession>>>,
    pub games: Arc<RwLock<HashMap<Uuid, SharedGame>>>,
    /// Serializes matchmaking claims. Never held across an await on a game
    /// lock owned by someone else; see `game::create_or_join`.
    pub matchmaking: Arc<Mutex<()>>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Build state from env: load config, init the in-memory profile store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryProfileStore::default()))
    }

    /// Inject a profile store; tests use this to simulate storage failures.
    pub fn with_store(profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            config: load_engine_config_from_env(),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            games: Arc::new(RwLock::new(HashMap::new())),
            matchmaking: Arc::new(Mutex::new(())),
            profiles,
        }
    }

    pub async fn insert_session(&self, s: TestSession) {
        self.sessions.write().await.insert(s.id, s);
    }

    pub async fn get_session(&self, id: Uuid) -> Option<TestSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn insert_game(&self, g: MultiplayerGame) -> SharedGame {
        let id = g.id;
        let shared = Arc::new(Mutex::new(g));
        self.games.write().await.insert(id, shared.clone());
        shared
    }

    pub async fn get_game(&self, id: Uuid) -> Option<SharedGame> {
        self.games.read().await.get(&id).cloned()
    }

    /// Snapshot of games currently waiting for an opponent. Each candidate
    /// must be re-checked under its own lock before joining; the status may
    /// have moved since this scan.
    pub async fn waiting_games(&self) -> Vec<SharedGame> {
        let games = self.games.read().await;
        let mut out = Vec::new();
        for shared in games.values() {
            // try_lock: a game being mutated right now is either leaving
            // Waiting (no longer a candidate) or irrelevant to this scan.
            if let Ok(g) = shared.try_lock() {
                if g.status == GameStatus::Waiting {
                    out.push(shared.clone());
                }
            }
        }
        out
    }

    /// The game a user currently occupies a seat in, if any non-terminal one
    /// exists. Used to refuse double matchmaking.
    pub async fn find_active_game(&self, user_id: &str) -> Option<SharedGame> {
        let games = self.games.read().await;
        for shared in games.values() {
            let g = shared.lock().await;
            if !g.is_terminal() && g.side_of(user_id).is_some() {
                return Some(shared.clone());
            }
        }
        None
    }
}
