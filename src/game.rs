//! Matchmaking and multiplayer game lifecycle.
//!
//! This module is the only writer of game state. States move forward only:
//! Waiting -> Playing -> Finished, or Waiting -> Aborted. Every public
//! operation is a single read-modify-write under the game's own mutex, so
//! the engine is safe under concurrent invocation from both players' poll
//! cycles regardless of transport.
//!
//! Finalization happens exactly once per game: it freezes the derived
//! scores, decides the winner, applies Elo best-effort (a storage failure
//! never blocks the Finished transition) and stamps the outcome.

use rand::thread_rng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::assembler::assemble_shared_test;
use crate::domain::{
  FinishReason, GameOutcome, GameStatus, GameType, MultiplayerGame, PlayerSide, PlayerSlot,
  RatingMode, RecordedAnswer, SharedQuestion, TimeControl,
};
use crate::error::EngineError;
use crate::rating::{apply_game_delta, elo_delta};
use crate::state::{AppState, SharedGame};
use crate::util::{answers_match, now_ms};

/// Matchmaking entry point: join a compatible waiting game or create a new
/// one. The claim is a compare-and-set under the matchmaking lock plus the
/// candidate's own lock; a candidate that was filled by a third party in
/// between is simply skipped (the race is benign, we keep scanning).
#[instrument(level = "info", skip(state))]
pub async fn create_or_join(
  state: &AppState,
  user_id: &str,
  time_control: TimeControl,
  game_type: GameType,
) -> Result<SharedGame, EngineError> {
  let _mm = state.matchmaking.lock().await;

  // A player already seated in an active game re-enters that game instead
  // of matching into a second one.
  if let Some(existing) = state.find_active_game(user_id).await {
    debug!(target: "game", %user_id, "Matchmaking request while already seated; returning existing game");
    return Ok(existing);
  }

  let rating = state.profiles.load(user_id, RatingMode::Multiplayer)?.rating;
  let window = state.config.matchmaking.rating_window;

  for candidate in state.waiting_games().await {
    let mut g = candidate.lock().await;
    // Re-check under the lock: the scan snapshot may be stale.
    if g.status != GameStatus::Waiting {
      continue;
    }
    if !compatible(&g, user_id, rating, time_control, game_type, window) {
      continue;
    }

    g.player2 = Some(PlayerSlot {
      user_id: user_id.to_string(),
      rating,
      abandoned: false,
    });
    // The shared sequence is assembled exactly once, balanced for the
    // pair, and is immutable for the life of the game.
    let count = state.config.tests.multiplayer_question_count;
    g.questions = assemble_shared_test(&mut thread_rng(), g.player1.rating, rating, count)
      .into_iter()
      .map(|exercise| SharedQuestion { exercise, player1: None, player2: None })
      .collect();
    g.status = GameStatus::Playing;
    g.started_at_ms = Some(now_ms());
    info!(
      target: "game",
      game_id = %g.id,
      player1 = %g.player1.user_id,
      player2 = %user_id,
      questions = g.questions.len(),
      "Opponent joined; game started"
    );
    drop(g);
    return Ok(candidate);
  }

  let game = MultiplayerGame::new_waiting(
    user_id.to_string(),
    rating,
    time_control,
    game_type,
  );
  info!(target: "game", game_id = %game.id, %user_id, ?time_control, ?game_type, "No compatible opponent; waiting");
  Ok(state.insert_game(game).await)
}

fn compatible(
  g: &MultiplayerGame,
  user_id: &str,
  rating: i32,
  time_control: TimeControl,
  game_type: GameType,
  window: i32,
) -> bool {
  g.player1.user_id != user_id
    && g.time_control == time_control
    && g.game_type == game_type
    && (game_type == GameType::Friendly || (g.player1.rating - rating).abs() <= window)
}

/// Record one answer for one player. At most one answer per (player,
/// question); duplicates, out-of-range indexes, non-participants and
/// submissions to non-playing games are all silent no-ops. The opponent's
/// slot for the same question is never read.
#[instrument(level = "debug", skip(state, answer))]
pub async fn submit_answer(
  state: &AppState,
  game_id: Uuid,
  user_id: &str,
  question_index: usize,
  answer: String,
  elapsed_ms: u64,
) -> Result<(), EngineError> {
  let shared = state.get_game(game_id).await.ok_or(EngineError::UnknownGame(game_id))?;
  let mut g = shared.lock().await;

  if g.status != GameStatus::Playing {
    return Ok(());
  }
  if g.time_expired(now_ms()) {
    finalize_locked(state, &mut g, FinishReason::Timeout);
    return Ok(());
  }
  let Some(side) = g.side_of(user_id) else {
    debug!(target: "game", %game_id, %user_id, "Submission from non-participant ignored");
    return Ok(());
  };
  let Some(q) = g.questions.get_mut(question_index) else {
    return Ok(());
  };
  let correct = answers_match(&answer, &q.exercise.answer);
  let slot = q.slot_mut(side);
  if slot.is_some() {
    // Duplicate submission: idempotent no-op.
    return Ok(());
  }
  *slot = Some(RecordedAnswer { answer, elapsed_ms, correct });

  maybe_finalize_locked(state, &mut g);
  Ok(())
}

/// Read-only snapshot for client rendering, checking the time budget on the
/// way so an expired game finalizes on the next poll from either side.
#[instrument(level = "debug", skip(state))]
pub async fn poll_game(state: &AppState, game_id: Uuid) -> Result<MultiplayerGame, EngineError> {
  let shared = state.get_game(game_id).await.ok_or(EngineError::UnknownGame(game_id))?;
  let mut g = shared.lock().await;
  if g.status == GameStatus::Playing && g.time_expired(now_ms()) {
    finalize_locked(state, &mut g, FinishReason::Timeout);
  }
  Ok(g.clone())
}

/// Idempotent finalize trigger. A terminal game returns its frozen state
/// unchanged; a waiting game aborts.
#[instrument(level = "info", skip(state))]
pub async fn finalize_game(
  state: &AppState,
  game_id: Uuid,
  reason: FinishReason,
) -> Result<MultiplayerGame, EngineError> {
  let shared = state.get_game(game_id).await.ok_or(EngineError::UnknownGame(game_id))?;
  let mut g = shared.lock().await;
  finalize_locked(state, &mut g, reason);
  Ok(g.clone())
}

/// Record that a player left mid-game. The game is never deleted: the
/// remaining player's answers still count, and completion logic treats the
/// abandoner as answering nothing further.
#[instrument(level = "info", skip(state))]
pub async fn abandon(
  state: &AppState,
  game_id: Uuid,
  user_id: &str,
) -> Result<MultiplayerGame, EngineError> {
  let shared = state.get_game(game_id).await.ok_or(EngineError::UnknownGame(game_id))?;
  let mut g = shared.lock().await;
  match g.status {
    GameStatus::Waiting => {
      if g.player1.user_id == user_id {
        g.status = GameStatus::Aborted;
        g.finished_at_ms = Some(now_ms());
        info!(target: "game", %game_id, %user_id, "Waiting game aborted by creator");
      }
    }
    GameStatus::Playing => {
      if let Some(side) = g.side_of(user_id) {
        match side {
          PlayerSide::One => g.player1.abandoned = true,
          PlayerSide::Two => {
            if let Some(p2) = g.player2.as_mut() {
              p2.abandoned = true;
            }
          }
        }
        info!(target: "game", %game_id, %user_id, "Player abandoned mid-game");
        maybe_finalize_locked(state, &mut g);
      }
    }
    GameStatus::Finished | GameStatus::Aborted => {}
  }
  Ok(g.clone())
}

/// Remove a user's waiting game from the matchmaking pool. No effect on any
/// other game; a no-op if the user isn't searching.
#[instrument(level = "info", skip(state))]
pub async fn leave_search(state: &AppState, user_id: &str) {
  for shared in state.waiting_games().await {
    let mut g = shared.lock().await;
    if g.status == GameStatus::Waiting && g.player1.user_id == user_id {
      g.status = GameStatus::Aborted;
      g.finished_at_ms = Some(now_ms());
      info!(target: "game", game_id = %g.id, %user_id, "Left matchmaking");
    }
  }
}

/// Completion triggers, checked after every mutation while Playing.
fn completion_reason(g: &MultiplayerGame) -> Option<FinishReason> {
  if g.status != GameStatus::Playing {
    return None;
  }
  let p1_done = g.player_finished(PlayerSide::One);
  let p2_done = g.player_finished(PlayerSide::Two);
  let p1_gone = g.player1.abandoned;
  let p2_gone = g.player2.as_ref().map(|p| p.abandoned).unwrap_or(false);

  if p1_done && p2_done {
    Some(FinishReason::Completed)
  } else if (p1_done && p2_gone) || (p2_done && p1_gone) || (p1_gone && p2_gone) {
    Some(FinishReason::Abandoned)
  } else {
    None
  }
}

fn maybe_finalize_locked(state: &AppState, g: &mut MultiplayerGame) {
  if let Some(reason) = completion_reason(g) {
    finalize_locked(state, g, reason);
  }
}

/// The single finalization point. Caller holds the game lock, so this can
/// never race with a submission; calling it on a terminal game is a no-op.
fn finalize_locked(state: &AppState, g: &mut MultiplayerGame, reason: FinishReason) {
  if g.is_terminal() {
    return;
  }
  if g.status == GameStatus::Waiting {
    g.status = GameStatus::Aborted;
    g.finished_at_ms = Some(now_ms());
    return;
  }

  let p1_score = g.score(PlayerSide::One);
  let p2_score = g.score(PlayerSide::Two);
  let winner = match p1_score.cmp(&p2_score) {
    std::cmp::Ordering::Greater => Some(PlayerSide::One),
    std::cmp::Ordering::Less => Some(PlayerSide::Two),
    std::cmp::Ordering::Equal => None,
  };

  let (p1_delta, p2_delta) = match (&g.player2, g.game_type) {
    (Some(p2), GameType::Ranked) => {
      let outcome1 = match winner {
        Some(PlayerSide::One) => 1.0,
        Some(PlayerSide::Two) => 0.0,
        None => 0.5,
      };
      let k = state.config.scoring.k_factor;
      let d1 = elo_delta(g.player1.rating, p2.rating, outcome1, g.game_type, k);
      let d2 = elo_delta(p2.rating, g.player1.rating, 1.0 - outcome1, g.game_type, k);
      (
        persist_delta(state, &g.player1.user_id, d1),
        persist_delta(state, &p2.user_id, d2),
      )
    }
    _ => (None, None),
  };

  g.outcome = Some(GameOutcome {
    player1_score: p1_score,
    player2_score: p2_score,
    winner,
    reason,
    player1_delta: p1_delta,
    player2_delta: p2_delta,
  });
  g.status = GameStatus::Finished;
  g.finished_at_ms = Some(now_ms());
  info!(
    target: "game",
    game_id = %g.id,
    ?reason,
    p1_score,
    p2_score,
    ?winner,
    "Game finalized"
  );
}

/// Best-effort rating application: load, apply, save as one unit. A storage
/// failure leaves the delta unrecorded (None) for the persistence layer to
/// retry; it never blocks finalization.
fn persist_delta(state: &AppState, user_id: &str, delta: i32) -> Option<i32> {
  let mut profile = match state.profiles.load(user_id, RatingMode::Multiplayer) {
    Ok(p) => p,
    Err(e) => {
      warn!(target: "game", %user_id, error = %e, "Rating load failed at finalization; delta left unapplied");
      return None;
    }
  };
  apply_game_delta(&mut profile, delta);
  match state.profiles.save(user_id, RatingMode::Multiplayer, &profile) {
    Ok(()) => Some(delta),
    Err(e) => {
      warn!(target: "game", %user_id, error = %e, "Rating save failed at finalization; delta left unapplied");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::profile::{InMemoryProfileStore, ProfileStore, StorageError};
  use crate::domain::RatingProfile;
  use crate::rating::tier_for;
  use std::sync::Arc;

  fn state() -> AppState {
    AppState::with_store(Arc::new(InMemoryProfileStore::default()))
  }

  fn seed_rating(state: &AppState, user: &str, rating: i32) {
    let profile = RatingProfile {
      rating,
      tier: tier_for(rating),
      best_rating: rating,
      best_tier: tier_for(rating),
      streak: 0,
      best_streak: 0,
    };
    state.profiles.save(user, RatingMode::Multiplayer, &profile).unwrap();
  }

  async fn paired_game(state: &AppState) -> SharedGame {
    create_or_join(state, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    create_or_join(state, "bob", TimeControl::Blitz, GameType::Ranked).await.unwrap()
  }

  /// Answer question `ix` correctly for `user` by reading the canonical
  /// answer first (tests only; the protocol layer never exposes it while
  /// playing).
  async fn answer_correctly(state: &AppState, game: &SharedGame, user: &str, ix: usize) {
    let (id, answer) = {
      let g = game.lock().await;
      (g.id, g.questions[ix].exercise.answer.clone())
    };
    submit_answer(state, id, user, ix, answer, 4_000).await.unwrap();
  }

  #[tokio::test]
  async fn join_pairs_and_fixes_the_shared_sequence() {
    let st = state();
    let g = paired_game(&st).await;
    let g = g.lock().await;
    assert_eq!(g.status, GameStatus::Playing);
    assert_eq!(g.player1.user_id, "alice");
    assert_eq!(g.player2.as_ref().unwrap().user_id, "bob");
    assert_eq!(g.questions.len(), 20);
    assert!(g.started_at_ms.is_some());
  }

  #[tokio::test]
  async fn same_user_cannot_fill_both_seats() {
    let st = state();
    let first = create_or_join(&st, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    let second = create_or_join(&st, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    let first_id = first.lock().await.id;
    assert_eq!(first_id, second.lock().await.id);
    assert_eq!(first.lock().await.status, GameStatus::Waiting);
  }

  #[tokio::test]
  async fn time_control_and_type_must_match() {
    let st = state();
    create_or_join(&st, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    let other = create_or_join(&st, "bob", TimeControl::Rapid, GameType::Ranked).await.unwrap();
    assert_eq!(other.lock().await.status, GameStatus::Waiting);
    assert_eq!(st.games.read().await.len(), 2);
  }

  #[tokio::test]
  async fn ranked_pairing_respects_the_rating_window() {
    let st = state();
    seed_rating(&st, "shark", 1400);
    seed_rating(&st, "minnow", 400);
    create_or_join(&st, "shark", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    let g = create_or_join(&st, "minnow", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    assert_eq!(g.lock().await.status, GameStatus::Waiting);

    // Friendly games ignore the window.
    let st = state();
    seed_rating(&st, "shark", 1400);
    seed_rating(&st, "minnow", 400);
    create_or_join(&st, "shark", TimeControl::Blitz, GameType::Friendly).await.unwrap();
    let g = create_or_join(&st, "minnow", TimeControl::Blitz, GameType::Friendly).await.unwrap();
    assert_eq!(g.lock().await.status, GameStatus::Playing);
  }

  #[tokio::test]
  async fn duplicate_submissions_are_no_ops() {
    let st = state();
    let game = paired_game(&st).await;
    let id = game.lock().await.id;

    answer_correctly(&st, &game, "alice", 0).await;
    // Second write for the same slot must not overwrite.
    submit_answer(&st, id, "alice", 0, "wrong".into(), 1).await.unwrap();
    let g = game.lock().await;
    assert_eq!(g.answered_count(PlayerSide::One), 1);
    assert!(g.questions[0].player1.as_ref().unwrap().correct);
  }

  #[tokio::test]
  async fn mutual_completion_finalizes_with_elo() {
    let st = state();
    let game = paired_game(&st).await;
    let (id, n) = { let g = game.lock().await; (g.id, g.questions.len()) };

    // Alice answers everything right, Bob everything wrong.
    for ix in 0..n {
      answer_correctly(&st, &game, "alice", ix).await;
      submit_answer(&st, id, "bob", ix, "nope".into(), 3_000).await.unwrap();
    }

    let g = game.lock().await;
    assert_eq!(g.status, GameStatus::Finished);
    let o = g.outcome.as_ref().unwrap();
    assert_eq!(o.reason, FinishReason::Completed);
    assert_eq!(o.player1_score, n as u32);
    assert_eq!(o.player2_score, 0);
    assert_eq!(o.winner, Some(PlayerSide::One));
    // Equal starting ratings, K=32: winner +16, loser -16.
    assert_eq!(o.player1_delta, Some(16));
    assert_eq!(o.player2_delta, Some(-16));
    drop(g);

    let alice = st.profiles.load("alice", RatingMode::Multiplayer).unwrap();
    let bob = st.profiles.load("bob", RatingMode::Multiplayer).unwrap();
    assert_eq!(alice.rating - bob.rating, 32);
  }

  #[tokio::test]
  async fn friendly_games_finalize_without_deltas() {
    let st = state();
    create_or_join(&st, "alice", TimeControl::Bullet, GameType::Friendly).await.unwrap();
    let game = create_or_join(&st, "bob", TimeControl::Bullet, GameType::Friendly).await.unwrap();
    let (id, n) = { let g = game.lock().await; (g.id, g.questions.len()) };
    for ix in 0..n {
      answer_correctly(&st, &game, "alice", ix).await;
      submit_answer(&st, id, "bob", ix, "nope".into(), 3_000).await.unwrap();
    }
    let g = game.lock().await;
    assert_eq!(g.status, GameStatus::Finished);
    assert_eq!(g.outcome.as_ref().unwrap().player1_delta, None);
    let before = RatingProfile::default().rating;
    drop(g);
    assert_eq!(st.profiles.load("alice", RatingMode::Multiplayer).unwrap().rating, before);
  }

  #[tokio::test]
  async fn finalize_is_idempotent() {
    let st = state();
    let game = paired_game(&st).await;
    let (id, n) = { let g = game.lock().await; (g.id, g.questions.len()) };
    for ix in 0..n {
      answer_correctly(&st, &game, "alice", ix).await;
      submit_answer(&st, id, "bob", ix, "nope".into(), 3_000).await.unwrap();
    }

    let first = finalize_game(&st, id, FinishReason::Completed).await.unwrap();
    let again = finalize_game(&st, id, FinishReason::Timeout).await.unwrap();
    let o1 = first.outcome.unwrap();
    let o2 = again.outcome.unwrap();
    assert_eq!(o1.player1_score, o2.player1_score);
    assert_eq!(o1.winner, o2.winner);
    assert_eq!(o1.reason, o2.reason);
    // Deltas applied exactly once.
    let alice = st.profiles.load("alice", RatingMode::Multiplayer).unwrap();
    assert_eq!(alice.rating, RatingProfile::default().rating + 16);
  }

  #[tokio::test]
  async fn timeout_with_no_answers_is_a_draw() {
    let st = state();
    let game = paired_game(&st).await;
    let id = {
      let mut g = game.lock().await;
      // Rewind the clock past the Blitz budget.
      g.started_at_ms = Some(now_ms() - 241_000);
      g.id
    };
    let snap = poll_game(&st, id).await.unwrap();
    assert_eq!(snap.status, GameStatus::Finished);
    let o = snap.outcome.unwrap();
    assert_eq!(o.reason, FinishReason::Timeout);
    assert_eq!((o.player1_score, o.player2_score), (0, 0));
    assert_eq!(o.winner, None);
  }

  #[tokio::test]
  async fn abandonment_lets_the_finisher_win() {
    let st = state();
    let game = paired_game(&st).await;
    let (id, n) = { let g = game.lock().await; (g.id, g.questions.len()) };

    answer_correctly(&st, &game, "bob", 0).await;
    abandon(&st, id, "bob").await.unwrap();
    // Game stays live: alice's answers still count.
    assert_eq!(game.lock().await.status, GameStatus::Playing);

    for ix in 0..n {
      answer_correctly(&st, &game, "alice", ix).await;
    }
    let g = game.lock().await;
    assert_eq!(g.status, GameStatus::Finished);
    let o = g.outcome.as_ref().unwrap();
    assert_eq!(o.reason, FinishReason::Abandoned);
    assert_eq!(o.winner, Some(PlayerSide::One));
    // Bob's pre-abandonment answer still counted.
    assert_eq!(o.player2_score, 1);
  }

  #[tokio::test]
  async fn abandoning_a_waiting_game_aborts_it() {
    let st = state();
    let game = create_or_join(&st, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    let id = game.lock().await.id;
    let g = abandon(&st, id, "alice").await.unwrap();
    assert_eq!(g.status, GameStatus::Aborted);
  }

  #[tokio::test]
  async fn leave_search_only_touches_own_waiting_game() {
    let st = state();
    create_or_join(&st, "alice", TimeControl::Blitz, GameType::Ranked).await.unwrap();
    create_or_join(&st, "carol", TimeControl::Rapid, GameType::Ranked).await.unwrap();
    leave_search(&st, "alice").await;

    let mut statuses = Vec::new();
    for g in st.games.read().await.values() {
      let g = g.lock().await;
      statuses.push((g.player1.user_id.clone(), g.status));
    }
    statuses.sort();
    assert_eq!(
      statuses,
      vec![
        ("alice".to_string(), GameStatus::Aborted),
        ("carol".to_string(), GameStatus::Waiting),
      ]
    );
  }

  #[tokio::test]
  async fn submissions_after_finish_are_ignored() {
    let st = state();
    let game = paired_game(&st).await;
    let id = game.lock().await.id;
    finalize_game(&st, id, FinishReason::Timeout).await.unwrap();
    submit_answer(&st, id, "alice", 0, "1".into(), 100).await.unwrap();
    assert_eq!(game.lock().await.answered_count(PlayerSide::One), 0);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn interleaved_submissions_lose_no_writes() {
    let st = state();
    let game = paired_game(&st).await;
    let (id, answers): (Uuid, Vec<String>) = {
      let g = game.lock().await;
      (g.id, g.questions.iter().map(|q| q.exercise.answer.clone()).collect())
    };

    // 100+ concurrent submissions: every (player, index) is attempted at
    // least twice and some carry conflicting values; exactly 20 answers per
    // player must survive, first write wins.
    let mut handles = Vec::new();
    for round in 0..3 {
      for ix in 0..20usize {
        for user in ["alice", "bob"] {
          let st = st.clone();
          let user = user.to_string();
          let answer = if round == 0 { answers[ix].clone() } else { "junk".to_string() };
          handles.push(tokio::spawn(async move {
            submit_answer(&st, id, &user, ix, answer, 2_000).await.unwrap();
          }));
        }
      }
    }
    for h in handles {
      h.await.unwrap();
    }

    let g = game.lock().await;
    assert_eq!(g.answered_count(PlayerSide::One), 20);
    assert_eq!(g.answered_count(PlayerSide::Two), 20);
    assert_eq!(g.status, GameStatus::Finished);
    // Exactly one outcome, one delta application per player.
    let alice = st.profiles.load("alice", RatingMode::Multiplayer).unwrap();
    let bob = st.profiles.load("bob", RatingMode::Multiplayer).unwrap();
    assert_eq!(
      alice.rating + bob.rating,
      2 * RatingProfile::default().rating,
      "Elo must be zero-sum at equal ratings"
    );
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn simultaneous_matchmaking_yields_one_game() {
    let st = state();
    let mut handles = Vec::new();
    for user in ["alice", "bob"] {
      let st = st.clone();
      let user = user.to_string();
      handles.push(tokio::spawn(async move {
        create_or_join(&st, &user, TimeControl::Blitz, GameType::Ranked).await.unwrap();
      }));
    }
    for h in handles {
      h.await.unwrap();
    }

    let games = st.games.read().await;
    assert_eq!(games.len(), 1, "no stranded waiting games");
    let g = games.values().next().unwrap().lock().await;
    assert_eq!(g.status, GameStatus::Playing);
    let mut seated = vec![g.player1.user_id.clone(), g.player2.as_ref().unwrap().user_id.clone()];
    seated.sort();
    assert_eq!(seated, vec!["alice", "bob"]);
  }

  /// Loads succeed, saves fail: finalization must still reach Finished with
  /// the deltas left unapplied for retry.
  struct SaveFailsStore;

  impl ProfileStore for SaveFailsStore {
    fn load(&self, _user: &str, _mode: RatingMode) -> Result<RatingProfile, StorageError> {
      Ok(RatingProfile::default())
    }
    fn save(
      &self,
      _user: &str,
      _mode: RatingMode,
      _profile: &RatingProfile,
    ) -> Result<(), StorageError> {
      Err(StorageError::Unavailable("disk on fire".into()))
    }
  }

  #[tokio::test]
  async fn storage_failure_never_blocks_finalization() {
    let st = AppState::with_store(Arc::new(SaveFailsStore));
    let game = paired_game(&st).await;
    let id = game.lock().await.id;
    let g = finalize_game(&st, id, FinishReason::Timeout).await.unwrap();
    assert_eq!(g.status, GameStatus::Finished);
    let o = g.outcome.unwrap();
    assert_eq!(o.player1_delta, None);
    assert_eq!(o.player2_delta, None);
  }
}
