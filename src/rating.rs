//! Rating engine: solo outcome scoring with a component breakdown, classic
//! Elo for head-to-head games, and the rank tier table.
//!
//! The solo formula is the compatibility-critical part of the system: the
//! constants below are fixed and reproduced exactly by the tests. Callers
//! receive each named component alongside the total so the UI can render an
//! explanation of the delta.

use serde::{Deserialize, Serialize};

use crate::domain::{GameType, RankTier, RatingProfile};

/// Flat bonus for a perfect session. Also the floor of a perfect session's
/// final delta, regardless of speed or difficulty mix.
pub const PERFECT_BONUS: f64 = 35.0;

/// Questions at or above this difficulty count toward the hard-accuracy
/// component.
pub const HARD_DIFFICULTY: u8 = 7;

/// Default Elo K-factor for ranked multiplayer (overridable via config).
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Lower bound of each tier, worst to best. The bottom tier is unbounded
/// below and the top unbounded above, so lookup is total.
const TIER_LOWER_BOUNDS: [(RankTier, i32); 21] = [
  (RankTier::FMinus, i32::MIN),
  (RankTier::F, 100),
  (RankTier::FPlus, 200),
  (RankTier::EMinus, 300),
  (RankTier::E, 400),
  (RankTier::EPlus, 500),
  (RankTier::DMinus, 600),
  (RankTier::D, 700),
  (RankTier::DPlus, 800),
  (RankTier::CMinus, 900),
  (RankTier::C, 1000),
  (RankTier::CPlus, 1100),
  (RankTier::BMinus, 1200),
  (RankTier::B, 1300),
  (RankTier::BPlus, 1400),
  (RankTier::AMinus, 1500),
  (RankTier::A, 1600),
  (RankTier::APlus, 1700),
  (RankTier::SMinus, 1800),
  (RankTier::S, 1900),
  (RankTier::SPlus, 2000),
];

/// Map a rating to its tier. Scans from the top; the bottom tier's bound is
/// `i32::MIN` so this can never fail to match.
pub fn tier_for(rating: i32) -> RankTier {
  for (tier, lower) in TIER_LOWER_BOUNDS.iter().rev() {
    if rating >= *lower {
      return *tier;
    }
  }
  RankTier::FMinus
}

/// Tier intervals for client rendering: `(tier, lower, upper)` where `None`
/// marks an unbounded end.
pub fn tier_intervals() -> Vec<(RankTier, Option<i32>, Option<i32>)> {
  TIER_LOWER_BOUNDS
    .iter()
    .enumerate()
    .map(|(i, (tier, lower))| {
      let lo = if i == 0 { None } else { Some(*lower) };
      let hi = TIER_LOWER_BOUNDS.get(i + 1).map(|(_, b)| *b);
      (*tier, lo, hi)
    })
    .collect()
}

/// Progress within the current tier, 0.0..=1.0. Unbounded tiers use a
/// virtual width of 100 and clamp.
pub fn tier_progress(rating: i32) -> f64 {
  let tier = tier_for(rating);
  let ix = TIER_LOWER_BOUNDS.iter().position(|(t, _)| *t == tier).unwrap_or(0);
  let upper = TIER_LOWER_BOUNDS
    .get(ix + 1)
    .map(|(_, b)| *b)
    .unwrap_or(TIER_LOWER_BOUNDS[ix].1 + 100);
  let lower = if ix == 0 { upper - 100 } else { TIER_LOWER_BOUNDS[ix].1 };
  ((rating - lower) as f64 / (upper - lower) as f64).clamp(0.0, 1.0)
}

/// Per-question result of a completed solo session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionResult {
  pub difficulty: u8,
  pub correct: bool,
  pub elapsed_ms: u64,
}

/// A completed solo session, summarized for scoring.
///
/// The per-question correctness vector is required. The source system had a
/// fallback that assumed the first N answers were the correct ones when the
/// vector was missing; that path is positionally biased and unsupported here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoloOutcome {
  pub results: Vec<QuestionResult>,
}

/// Named contributing factors of a solo delta. `scale × (base + speed +
/// difficulty + hard_accuracy + streak)` rounds to `total`, except that a
/// perfect session is floored at [`PERFECT_BONUS`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Breakdown {
  pub base: f64,
  pub speed: f64,
  pub difficulty: f64,
  pub hard_accuracy: f64,
  pub streak: f64,
  pub scale: f64,
  pub total: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutcomeReport {
  pub new_rating: i32,
  pub delta: i32,
  pub breakdown: Breakdown,
}

fn base_component(score_pct: f64, perfect: bool) -> f64 {
  if perfect {
    return PERFECT_BONUS;
  }
  // Decile table: punitive below 50%, growing multipliers above.
  match (score_pct / 10.0).floor() as i32 {
    0 => -30.0,
    1 => -24.0,
    2 => -18.0,
    3 => -12.0,
    4 => -6.0,
    5 => 4.0,
    6 => 8.0,
    7 => 13.0,
    8 => 19.0,
    _ => 26.0,
  }
}

fn speed_component(avg_secs: f64, score_pct: f64) -> f64 {
  let band = if avg_secs <= 3.0 {
    12.0
  } else if avg_secs <= 6.0 {
    8.0
  } else if avg_secs <= 8.0 {
    4.0
  } else if avg_secs <= 12.0 {
    0.0
  } else if avg_secs <= 20.0 {
    -4.0
  } else {
    -8.0
  };
  // Wrong and slow compounds beyond the sum of the two penalties.
  if score_pct < 50.0 && avg_secs > 12.0 {
    band - 6.0
  } else {
    band
  }
}

fn hard_accuracy_component(results: &[QuestionResult]) -> f64 {
  let hard: Vec<&QuestionResult> =
    results.iter().filter(|r| r.difficulty >= HARD_DIFFICULTY).collect();
  if hard.is_empty() {
    return 0.0;
  }
  // Accuracy within the hard subset only, independent of overall volume.
  let acc = hard.iter().filter(|r| r.correct).count() as f64 / hard.len() as f64;
  if acc >= 0.9 {
    10.0
  } else if acc >= 0.75 {
    6.0
  } else if acc >= 0.5 {
    3.0
  } else {
    0.0
  }
}

fn rating_scale(rating: i32) -> f64 {
  if rating < 400 {
    1.3
  } else if rating < 1000 {
    1.0
  } else if rating < 1300 {
    0.9
  } else if rating < 1600 {
    0.75
  } else {
    0.6
  }
}

/// Score a completed solo session and mutate the profile in place. Returns
/// the report with the full component breakdown.
pub fn apply_outcome(profile: &mut RatingProfile, outcome: &SoloOutcome) -> OutcomeReport {
  let total = outcome.results.len();
  if total == 0 {
    // Nothing to score; the session produced no observations.
    return OutcomeReport {
      new_rating: profile.rating,
      delta: 0,
      breakdown: Breakdown {
        base: 0.0,
        speed: 0.0,
        difficulty: 0.0,
        hard_accuracy: 0.0,
        streak: 0.0,
        scale: 1.0,
        total: 0,
      },
    };
  }

  let correct = outcome.results.iter().filter(|r| r.correct).count();
  let score_pct = correct as f64 / total as f64 * 100.0;
  let perfect = correct == total;
  let passed = score_pct >= 50.0;

  let avg_secs = outcome.results.iter().map(|r| r.elapsed_ms).sum::<u64>() as f64
    / total as f64
    / 1000.0;
  let avg_difficulty =
    outcome.results.iter().map(|r| r.difficulty as f64).sum::<f64>() / total as f64;

  let base = base_component(score_pct, perfect);
  let speed = speed_component(avg_secs, score_pct);
  let difficulty = (avg_difficulty - 5.5) * 2.0;
  let hard_accuracy = hard_accuracy_component(&outcome.results);
  let streak = if passed { (profile.streak.min(5) as f64) * 2.0 } else { 0.0 };
  let scale = rating_scale(profile.rating);

  let mut delta =
    (scale * (base + speed + difficulty + hard_accuracy + streak)).round() as i32;
  if perfect {
    // The reward ceiling is also a floor: perfection always pays at least
    // the flat bonus, regardless of speed or difficulty mix.
    delta = delta.max(PERFECT_BONUS as i32);
  }

  let new_rating = profile.rating + delta;
  profile.rating = new_rating;
  profile.tier = tier_for(new_rating);
  profile.streak = if passed { profile.streak + 1 } else { 0 };
  profile.best_streak = profile.best_streak.max(profile.streak);
  if new_rating > profile.best_rating {
    profile.best_rating = new_rating;
    profile.best_tier = tier_for(new_rating);
  }

  tracing::info!(
    target: "rating",
    delta,
    new_rating,
    score = %format!("{:.0}%", score_pct),
    avg_secs = %format!("{:.1}", avg_secs),
    "Solo outcome applied"
  );

  OutcomeReport {
    new_rating,
    delta,
    breakdown: Breakdown {
      base,
      speed,
      difficulty,
      hard_accuracy,
      streak,
      scale,
      total: delta,
    },
  }
}

/// Elo expected score for `a` against `b`.
pub fn expected_score(a: i32, b: i32) -> f64 {
  1.0 / (1.0 + 10f64.powf((b - a) as f64 / 400.0))
}

/// Rating delta for a multiplayer result. `outcome` is 1.0 win / 0.5 draw /
/// 0.0 loss. Friendly games always yield zero.
pub fn elo_delta(
  rating: i32,
  opponent_rating: i32,
  outcome: f64,
  game_type: GameType,
  k: f64,
) -> i32 {
  if game_type == GameType::Friendly {
    return 0;
  }
  (k * (outcome - expected_score(rating, opponent_rating))).round() as i32
}

/// Apply a multiplayer delta to a profile, maintaining tier and best-ever
/// fields. Streaks are a solo concept and untouched here.
pub fn apply_game_delta(profile: &mut RatingProfile, delta: i32) {
  profile.rating += delta;
  profile.tier = tier_for(profile.rating);
  if profile.rating > profile.best_rating {
    profile.best_rating = profile.rating;
    profile.best_tier = profile.tier;
  }
}
