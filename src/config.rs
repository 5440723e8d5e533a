//! Engine tuning knobs loaded from TOML.
//!
//! Everything has a sensible default; the config file is optional. Set
//! `ENGINE_CONFIG_PATH` to override matchmaking width, the Elo K-factor or
//! question counts without a rebuild.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct EngineConfig {
  #[serde(default)]
  pub matchmaking: MatchmakingCfg,
  #[serde(default)]
  pub scoring: ScoringCfg,
  #[serde(default)]
  pub tests: TestsCfg,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MatchmakingCfg {
  /// Ranked games only pair players within this rating distance.
  pub rating_window: i32,
}

impl Default for MatchmakingCfg {
  fn default() -> Self {
    Self { rating_window: 200 }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ScoringCfg {
  pub k_factor: f64,
}

impl Default for ScoringCfg {
  fn default() -> Self {
    Self { k_factor: crate::rating::DEFAULT_K_FACTOR }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TestsCfg {
  pub solo_question_count: usize,
  pub multiplayer_question_count: usize,
}

impl Default for TestsCfg {
  fn default() -> Self {
    Self { solo_question_count: 20, multiplayer_question_count: 20 }
  }
}

/// Attempt to load `EngineConfig` from ENGINE_CONFIG_PATH. On any parsing/IO
/// error, falls back to defaults rather than refusing to start.
pub fn load_engine_config_from_env() -> EngineConfig {
  let Some(path) = std::env::var("ENGINE_CONFIG_PATH").ok() else {
    return EngineConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<EngineConfig>(&s) {
      Ok(cfg) => {
        info!(target: "mathrush_backend", %path, "Loaded engine config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "mathrush_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        EngineConfig::default()
      }
    },
    Err(e) => {
      error!(target: "mathrush_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      EngineConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_complete() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.matchmaking.rating_window, 200);
    assert_eq!(cfg.scoring.k_factor, 32.0);
    assert_eq!(cfg.tests.solo_question_count, 20);
  }

  #[test]
  fn partial_toml_fills_in_defaults() {
    let cfg: EngineConfig = toml::from_str("[matchmaking]\nrating_window = 150\n").unwrap();
    assert_eq!(cfg.matchmaking.rating_window, 150);
    assert_eq!(cfg.scoring.k_factor, 32.0);
  }
}
