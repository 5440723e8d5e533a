//! Core solo-test behaviors shared by both HTTP and WebSocket handlers:
//! starting a test or focused course, recording answers, and completing a
//! session (which is the only path that applies a solo rating delta).

use rand::thread_rng;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::assembler::{assemble_course, assemble_test};
use crate::domain::{Mode, OperationKind, RatingMode, RecordedAnswer, TestSession};
use crate::error::EngineError;
use crate::rating::{apply_outcome, OutcomeReport, QuestionResult, SoloOutcome};
use crate::state::AppState;
use crate::util::{answers_match, now_ms};

/// Result of completing a test. `rating` is `None` for training sessions
/// and for repeated completions (the delta applies exactly once).
#[derive(Clone, Debug)]
pub struct TestReport {
  pub session: TestSession,
  pub correct: u32,
  pub total: u32,
  pub rating: Option<OutcomeReport>,
}

/// Start a solo test assembled from the user's current solo rating.
#[instrument(level = "info", skip(state, allowlist))]
pub async fn start_test(
  state: &AppState,
  user_id: &str,
  mode: Mode,
  count: Option<usize>,
  allowlist: Option<Vec<OperationKind>>,
) -> Result<TestSession, EngineError> {
  let profile = state.profiles.load(user_id, RatingMode::Solo)?;
  let count = count.unwrap_or(state.config.tests.solo_question_count);
  let exercises =
    assemble_test(&mut thread_rng(), profile.rating, count, allowlist.as_deref());
  let session = TestSession::new(user_id.to_string(), mode, exercises);
  info!(target: "exercise", session_id = %session.id, %user_id, ?mode, count, rating = profile.rating, "Test assembled");
  state.insert_session(session.clone()).await;
  Ok(session)
}

/// Start a focused course: caller-chosen kinds at a nominal difficulty,
/// capped by the user's rating band. Courses are always training.
#[instrument(level = "info", skip(state, kinds))]
pub async fn start_course(
  state: &AppState,
  user_id: &str,
  kinds: Vec<OperationKind>,
  difficulty: u8,
  count: Option<usize>,
) -> Result<TestSession, EngineError> {
  let profile = state.profiles.load(user_id, RatingMode::Solo)?;
  let count = count.unwrap_or(state.config.tests.solo_question_count);
  let exercises =
    assemble_course(&mut thread_rng(), profile.rating, count, &kinds, difficulty);
  let session = TestSession::new(user_id.to_string(), Mode::Training, exercises);
  info!(target: "exercise", session_id = %session.id, %user_id, difficulty, count, "Course assembled");
  state.insert_session(session.clone()).await;
  Ok(session)
}

/// Record one answer. Idempotent: a duplicate submission returns the
/// already-recorded correctness; a completed session accepts nothing new.
#[instrument(level = "debug", skip(state, answer))]
pub async fn submit_test_answer(
  state: &AppState,
  session_id: Uuid,
  index: usize,
  answer: &str,
  elapsed_ms: u64,
) -> Result<bool, EngineError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions.get_mut(&session_id).ok_or(EngineError::UnknownSession(session_id))?;

  let recorded = s.answers.get(index).and_then(|a| a.as_ref()).map(|a| a.correct);
  if s.completed_at_ms.is_some() {
    return Ok(recorded.unwrap_or(false));
  }
  if let Some(correct) = recorded {
    return Ok(correct);
  }
  let Some(slot) = s.answers.get_mut(index) else {
    // Out-of-range index: benign, nothing to record.
    return Ok(false);
  };
  let correct = answers_match(answer, &s.exercises[index].answer);
  *slot = Some(RecordedAnswer { answer: answer.to_string(), elapsed_ms, correct });
  Ok(correct)
}

/// Complete a session and, for competitive mode, apply the rating delta
/// exactly once. The full outcome is computed first and the profile
/// persisted as a single unit; on a storage failure the session stays
/// un-applied so the completion can be retried.
#[instrument(level = "info", skip(state))]
pub async fn complete_test(
  state: &AppState,
  session_id: Uuid,
) -> Result<TestReport, EngineError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions.get_mut(&session_id).ok_or(EngineError::UnknownSession(session_id))?;

  let outcome = SoloOutcome {
    results: s
      .exercises
      .iter()
      .zip(&s.answers)
      .map(|(ex, slot)| match slot {
        Some(a) => QuestionResult {
          difficulty: ex.difficulty,
          correct: a.correct,
          elapsed_ms: a.elapsed_ms,
        },
        // Unanswered questions score as wrong.
        None => QuestionResult { difficulty: ex.difficulty, correct: false, elapsed_ms: 0 },
      })
      .collect(),
  };
  let correct = outcome.results.iter().filter(|r| r.correct).count() as u32;
  let total = outcome.results.len() as u32;

  let rating = if s.mode == Mode::Competitive && !s.rating_applied {
    let mut profile = state.profiles.load(&s.user_id, RatingMode::Solo)?;
    let report = apply_outcome(&mut profile, &outcome);
    state.profiles.save(&s.user_id, RatingMode::Solo, &profile)?;
    s.rating_applied = true;
    Some(report)
  } else {
    None
  };

  if s.completed_at_ms.is_none() {
    s.completed_at_ms = Some(now_ms());
  }
  info!(target: "rating", %session_id, correct, total, applied = s.rating_applied, "Test completed");
  Ok(TestReport { session: s.clone(), correct, total, rating })
}
