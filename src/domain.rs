//! Domain models used by the backend: operation kinds, exercises, rank tiers,
//! rating profiles, solo test sessions and multiplayer games.
//!
//! These records are plain data. Lifecycle rules (who may mutate what, and
//! when) live in `logic.rs` and `game.rs`; scoring rules live in `rating.rs`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::now_ms;

/// Arithmetic operation families the generator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
  Addition,
  Subtraction,
  Multiplication,
  Division,
  Power,
  SquareRoot,
  Factorization,
  Percentage,
  Fractions,
  Equation,
  MentalMath,
  Sequence,
}

impl OperationKind {
  pub const ALL: [OperationKind; 12] = [
    OperationKind::Addition,
    OperationKind::Subtraction,
    OperationKind::Multiplication,
    OperationKind::Division,
    OperationKind::Power,
    OperationKind::SquareRoot,
    OperationKind::Factorization,
    OperationKind::Percentage,
    OperationKind::Fractions,
    OperationKind::Equation,
    OperationKind::MentalMath,
    OperationKind::Sequence,
  ];
}

/// One generated problem. Immutable once produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
  pub id: Uuid,
  pub kind: OperationKind,
  /// 1..=10; magnitude of operands grows with this.
  pub difficulty: u8,
  pub question: String,
  /// Canonical answer, already in normalized form (`util::normalize_answer`).
  pub answer: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

/// The 21 rank tiers, ordered worst to best. Interval bounds live in
/// `rating::tier_for`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
  FMinus, F, FPlus,
  EMinus, E, EPlus,
  DMinus, D, DPlus,
  CMinus, C, CPlus,
  BMinus, B, BPlus,
  AMinus, A, APlus,
  SMinus, S, SPlus,
}

impl RankTier {
  pub fn label(self) -> &'static str {
    match self {
      RankTier::FMinus => "F-", RankTier::F => "F", RankTier::FPlus => "F+",
      RankTier::EMinus => "E-", RankTier::E => "E", RankTier::EPlus => "E+",
      RankTier::DMinus => "D-", RankTier::D => "D", RankTier::DPlus => "D+",
      RankTier::CMinus => "C-", RankTier::C => "C", RankTier::CPlus => "C+",
      RankTier::BMinus => "B-", RankTier::B => "B", RankTier::BPlus => "B+",
      RankTier::AMinus => "A-", RankTier::A => "A", RankTier::APlus => "A+",
      RankTier::SMinus => "S-", RankTier::S => "S", RankTier::SPlus => "S+",
    }
  }
}

/// Solo play modes. Training never touches the rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  Competitive,
  Training,
}

/// Which rating a profile tracks. Solo tests and head-to-head games carry
/// independent ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingMode {
  Solo,
  Multiplayer,
}

/// Rating new players start from.
pub const DEFAULT_RATING: i32 = 400;

/// Per-user, per-mode skill state. Mutated only by `rating::apply_outcome`
/// (solo) and game finalization (multiplayer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RatingProfile {
  pub rating: i32,
  pub tier: RankTier,
  pub best_rating: i32,
  pub best_tier: RankTier,
  pub streak: u32,
  pub best_streak: u32,
}

impl Default for RatingProfile {
  fn default() -> Self {
    let tier = crate::rating::tier_for(DEFAULT_RATING);
    Self {
      rating: DEFAULT_RATING,
      tier,
      best_rating: DEFAULT_RATING,
      best_tier: tier,
      streak: 0,
      best_streak: 0,
    }
  }
}

/// One recorded submission for a single question. Written at most once per
/// player per question, never overwritten.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedAnswer {
  pub answer: String,
  pub elapsed_ms: u64,
  pub correct: bool,
}

/// A solo test in progress or completed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestSession {
  pub id: Uuid,
  pub user_id: String,
  pub mode: Mode,
  pub exercises: Vec<Exercise>,
  /// One slot per exercise; `None` until the question is answered.
  pub answers: Vec<Option<RecordedAnswer>>,
  pub started_at_ms: u64,
  pub completed_at_ms: Option<u64>,
  /// Guards double application of the rating delta.
  pub rating_applied: bool,
}

impl TestSession {
  pub fn new(user_id: String, mode: Mode, exercises: Vec<Exercise>) -> Self {
    let slots = exercises.len();
    Self {
      id: Uuid::new_v4(),
      user_id,
      mode,
      exercises,
      answers: vec![None; slots],
      started_at_ms: now_ms(),
      completed_at_ms: None,
      rating_applied: false,
    }
  }

  pub fn answered_count(&self) -> usize {
    self.answers.iter().filter(|a| a.is_some()).count()
  }

  pub fn is_complete(&self) -> bool {
    self.answered_count() == self.exercises.len()
  }
}

/// Named multiplayer pacing presets, each with a fixed total time budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeControl {
  Bullet,
  Blitz,
  Rapid,
  Classical,
}

impl TimeControl {
  pub fn limit_seconds(self) -> u64 {
    match self {
      TimeControl::Bullet => 120,
      TimeControl::Blitz => 240,
      TimeControl::Rapid => 480,
      TimeControl::Classical => 720,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
  Ranked,
  Friendly,
}

/// Multiplayer game states. Transitions are forward-only:
/// Waiting -> Playing -> Finished, or Waiting -> Aborted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
  Waiting,
  Playing,
  Finished,
  Aborted,
}

/// Which seat a user occupies in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSide {
  One,
  Two,
}

impl PlayerSide {
  pub fn other(self) -> PlayerSide {
    match self {
      PlayerSide::One => PlayerSide::Two,
      PlayerSide::Two => PlayerSide::One,
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSlot {
  pub user_id: String,
  pub rating: i32,
  pub abandoned: bool,
}

/// One element of the shared question sequence. The exercise is identical for
/// both players; each answer slot is written independently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedQuestion {
  pub exercise: Exercise,
  pub player1: Option<RecordedAnswer>,
  pub player2: Option<RecordedAnswer>,
}

impl SharedQuestion {
  pub fn slot(&self, side: PlayerSide) -> &Option<RecordedAnswer> {
    match side {
      PlayerSide::One => &self.player1,
      PlayerSide::Two => &self.player2,
    }
  }

  pub fn slot_mut(&mut self, side: PlayerSide) -> &mut Option<RecordedAnswer> {
    match side {
      PlayerSide::One => &mut self.player1,
      PlayerSide::Two => &mut self.player2,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
  Completed,
  Timeout,
  Abandoned,
}

/// Frozen result written exactly once at finalization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameOutcome {
  pub player1_score: u32,
  pub player2_score: u32,
  /// `None` means draw.
  pub winner: Option<PlayerSide>,
  pub reason: FinishReason,
  /// Elo deltas; `None` for friendly games or when rating application failed
  /// (retryable by the persistence layer, see `game.rs`).
  pub player1_delta: Option<i32>,
  pub player2_delta: Option<i32>,
}

/// A head-to-head game. Owned and mutated exclusively by `game.rs`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultiplayerGame {
  pub id: Uuid,
  pub game_type: GameType,
  pub time_control: TimeControl,
  pub status: GameStatus,
  pub player1: PlayerSlot,
  pub player2: Option<PlayerSlot>,
  pub questions: Vec<SharedQuestion>,
  pub created_at_ms: u64,
  pub started_at_ms: Option<u64>,
  pub finished_at_ms: Option<u64>,
  pub outcome: Option<GameOutcome>,
}

impl MultiplayerGame {
  pub fn new_waiting(
    user_id: String,
    rating: i32,
    time_control: TimeControl,
    game_type: GameType,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      game_type,
      time_control,
      status: GameStatus::Waiting,
      player1: PlayerSlot { user_id, rating, abandoned: false },
      player2: None,
      questions: Vec::new(),
      created_at_ms: now_ms(),
      started_at_ms: None,
      finished_at_ms: None,
      outcome: None,
    }
  }

  pub fn side_of(&self, user_id: &str) -> Option<PlayerSide> {
    if self.player1.user_id == user_id {
      return Some(PlayerSide::One);
    }
    match &self.player2 {
      Some(p) if p.user_id == user_id => Some(PlayerSide::Two),
      _ => None,
    }
  }

  pub fn slot(&self, side: PlayerSide) -> Option<&PlayerSlot> {
    match side {
      PlayerSide::One => Some(&self.player1),
      PlayerSide::Two => self.player2.as_ref(),
    }
  }

  /// Single derivation point for a player's score: the count of their
  /// correct recorded answers. Never stored independently while playing.
  pub fn score(&self, side: PlayerSide) -> u32 {
    self
      .questions
      .iter()
      .filter(|q| q.slot(side).as_ref().map(|a| a.correct).unwrap_or(false))
      .count() as u32
  }

  pub fn answered_count(&self, side: PlayerSide) -> u32 {
    self.questions.iter().filter(|q| q.slot(side).is_some()).count() as u32
  }

  /// A player is finished once every question index has an answer recorded
  /// for them.
  pub fn player_finished(&self, side: PlayerSide) -> bool {
    !self.questions.is_empty()
      && self.answered_count(side) as usize == self.questions.len()
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self.status, GameStatus::Finished | GameStatus::Aborted)
  }

  /// Wall-clock budget exhausted for the selected time control.
  pub fn time_expired(&self, at_ms: u64) -> bool {
    match self.started_at_ms {
      Some(start) => at_ms.saturating_sub(start) >= self.time_control.limit_seconds() * 1000,
      None => false,
    }
  }
}
