//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Redaction rules live here: canonical answers and explanations are only
//! serialized once a session or game is over, and an opponent is always
//! reduced to aggregate counts (progress, score), never answer content.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Exercise, FinishReason, GameOutcome, GameStatus, GameType, Mode, MultiplayerGame,
    OperationKind, PlayerSide, RatingProfile, RecordedAnswer, TestSession, TimeControl,
};
use crate::rating::{tier_progress, OutcomeReport};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartTest {
        #[serde(rename = "userId")]
        user_id: String,
        mode: Mode,
        count: Option<usize>,
        /// Kind names; unknown names degrade to addition.
        kinds: Option<Vec<String>>,
    },
    StartCourse {
        #[serde(rename = "userId")]
        user_id: String,
        kinds: Vec<String>,
        difficulty: u8,
        count: Option<usize>,
    },
    SubmitTestAnswer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        index: usize,
        answer: String,
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
    },
    CompleteTest {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    GetProfile {
        #[serde(rename = "userId")]
        user_id: String,
        mode: crate::domain::RatingMode,
    },
    GetTiers,
    CreateOrJoinGame {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "timeControl")]
        time_control: TimeControl,
        #[serde(rename = "gameType")]
        game_type: GameType,
    },
    SubmitGameAnswer {
        #[serde(rename = "gameId")]
        game_id: Uuid,
        #[serde(rename = "userId")]
        user_id: String,
        index: usize,
        answer: String,
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
    },
    PollGame {
        #[serde(rename = "gameId")]
        game_id: Uuid,
        #[serde(rename = "userId")]
        user_id: String,
    },
    AbandonGame {
        #[serde(rename = "gameId")]
        game_id: Uuid,
        #[serde(rename = "userId")]
        user_id: String,
    },
    LeaveSearch {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Test { test: TestOut },
    TestAnswer { correct: bool },
    TestReport { report: TestReportOut },
    Profile { profile: ProfileOut },
    Tiers { tiers: Vec<TierOut> },
    Game { game: GameOut },
    Left,
    Error { message: String },
}

/// A question as delivered to a player: never the answer while live.
#[derive(Debug, Serialize)]
pub struct ExerciseOut {
    pub index: usize,
    pub kind: OperationKind,
    pub difficulty: u8,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct TestOut {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub mode: Mode,
    pub questions: Vec<ExerciseOut>,
    #[serde(rename = "startedAtMs")]
    pub started_at_ms: u64,
}

pub fn to_test_out(s: &TestSession) -> TestOut {
    TestOut {
        session_id: s.id,
        user_id: s.user_id.clone(),
        mode: s.mode,
        questions: s
            .exercises
            .iter()
            .enumerate()
            .map(|(index, ex)| exercise_out(index, ex))
            .collect(),
        started_at_ms: s.started_at_ms,
    }
}

fn exercise_out(index: usize, ex: &Exercise) -> ExerciseOut {
    ExerciseOut {
        index,
        kind: ex.kind,
        difficulty: ex.difficulty,
        question: ex.question.clone(),
    }
}

/// Per-question review shown after completion: answers revealed.
#[derive(Debug, Serialize)]
pub struct QuestionReview {
    pub index: usize,
    pub question: String,
    pub difficulty: u8,
    #[serde(rename = "yourAnswer")]
    pub your_answer: Option<String>,
    pub correct: bool,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestReportOut {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub correct: u32,
    pub total: u32,
    pub review: Vec<QuestionReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<OutcomeReport>,
}

pub fn to_report_out(report: &crate::logic::TestReport) -> TestReportOut {
    let s = &report.session;
    TestReportOut {
        session_id: s.id,
        correct: report.correct,
        total: report.total,
        review: s
            .exercises
            .iter()
            .zip(&s.answers)
            .enumerate()
            .map(|(index, (ex, slot))| QuestionReview {
                index,
                question: ex.question.clone(),
                difficulty: ex.difficulty,
                your_answer: slot.as_ref().map(|a| a.answer.clone()),
                correct: slot.as_ref().map(|a| a.correct).unwrap_or(false),
                answer: ex.answer.clone(),
                explanation: ex.explanation.clone(),
            })
            .collect(),
        rating: report.rating.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileOut {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub rating: i32,
    pub tier: String,
    /// 0.0..=1.0 toward the next tier.
    #[serde(rename = "tierProgress")]
    pub tier_progress: f64,
    #[serde(rename = "bestRating")]
    pub best_rating: i32,
    #[serde(rename = "bestTier")]
    pub best_tier: String,
    pub streak: u32,
    #[serde(rename = "bestStreak")]
    pub best_streak: u32,
}

pub fn to_profile_out(user_id: &str, p: &RatingProfile) -> ProfileOut {
    ProfileOut {
        user_id: user_id.to_string(),
        rating: p.rating,
        tier: p.tier.label().to_string(),
        tier_progress: tier_progress(p.rating),
        best_rating: p.best_rating,
        best_tier: p.best_tier.label().to_string(),
        streak: p.streak,
        best_streak: p.best_streak,
    }
}

#[derive(Debug, Serialize)]
pub struct TierOut {
    pub label: String,
    #[serde(rename = "minRating")]
    pub min_rating: Option<i32>,
    #[serde(rename = "maxRating")]
    pub max_rating: Option<i32>,
}

pub fn tiers_out() -> Vec<TierOut> {
    crate::rating::tier_intervals()
        .into_iter()
        .map(|(tier, lo, hi)| TierOut {
            label: tier.label().to_string(),
            min_rating: lo,
            max_rating: hi,
        })
        .collect()
}

/// One seat as visible to the other side: aggregate counts only.
#[derive(Debug, Serialize)]
pub struct SeatOut {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub rating: i32,
    pub score: u32,
    pub answered: u32,
    pub abandoned: bool,
}

#[derive(Debug, Serialize)]
pub struct GameQuestionOut {
    pub index: usize,
    pub kind: OperationKind,
    pub difficulty: u8,
    pub question: String,
    #[serde(rename = "yourAnswer")]
    pub your_answer: Option<RecordedAnswer>,
    /// Canonical answer; present only once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameOut {
    #[serde(rename = "gameId")]
    pub game_id: Uuid,
    pub status: GameStatus,
    #[serde(rename = "gameType")]
    pub game_type: GameType,
    #[serde(rename = "timeControl")]
    pub time_control: TimeControl,
    #[serde(rename = "timeLimitSeconds")]
    pub time_limit_seconds: u64,
    pub player1: SeatOut,
    pub player2: Option<SeatOut>,
    #[serde(rename = "yourSide")]
    pub your_side: Option<PlayerSide>,
    pub questions: Vec<GameQuestionOut>,
    #[serde(rename = "createdAtMs")]
    pub created_at_ms: u64,
    #[serde(rename = "startedAtMs")]
    pub started_at_ms: Option<u64>,
    #[serde(rename = "finishedAtMs")]
    pub finished_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

/// Build the viewer's snapshot of a game. The viewer sees their own
/// recorded answers inline; the opponent appears as counts only. Canonical
/// answers are withheld until the game is terminal.
pub fn game_snapshot(g: &MultiplayerGame, viewer: &str) -> GameOut {
    let your_side = g.side_of(viewer);
    let terminal = g.is_terminal();

    let seat = |side: PlayerSide| -> Option<SeatOut> {
        g.slot(side).map(|slot| SeatOut {
            user_id: slot.user_id.clone(),
            rating: slot.rating,
            score: g.score(side),
            answered: g.answered_count(side),
            abandoned: slot.abandoned,
        })
    };

    GameOut {
        game_id: g.id,
        status: g.status,
        game_type: g.game_type,
        time_control: g.time_control,
        time_limit_seconds: g.time_control.limit_seconds(),
        player1: seat(PlayerSide::One).expect("player1 always seated"),
        player2: seat(PlayerSide::Two),
        your_side,
        questions: g
            .questions
            .iter()
            .enumerate()
            .map(|(index, q)| GameQuestionOut {
                index,
                kind: q.exercise.kind,
                difficulty: q.exercise.difficulty,
                question: q.exercise.question.clone(),
                your_answer: your_side.and_then(|side| q.slot(side).clone()),
                answer: terminal.then(|| q.exercise.answer.clone()),
                explanation: if terminal { q.exercise.explanation.clone() } else { None },
            })
            .collect(),
        created_at_ms: g.created_at_ms,
        started_at_ms: g.started_at_ms,
        finished_at_ms: g.finished_at_ms,
        outcome: g.outcome.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartTestIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub mode: Mode,
    pub count: Option<usize>,
    pub kinds: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StartCourseIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub kinds: Vec<String>,
    pub difficulty: u8,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestAnswerIn {
    pub index: usize,
    pub answer: String,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
}

#[derive(Serialize)]
pub struct TestAnswerOut {
    pub correct: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub mode: Option<crate::domain::RatingMode>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "timeControl")]
    pub time_control: TimeControl,
    #[serde(rename = "gameType")]
    pub game_type: GameType,
}

#[derive(Debug, Deserialize)]
pub struct GameAnswerIn {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub index: usize,
    pub answer: String,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct GameViewerQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AbandonIn {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeIn {
    pub reason: FinishReason,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameType, PlayerSlot, SharedQuestion, TimeControl};
    use crate::generator::generate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn playing_game() -> MultiplayerGame {
        let mut rng = StdRng::seed_from_u64(1);
        let mut g = MultiplayerGame::new_waiting(
            "alice".into(),
            800,
            TimeControl::Blitz,
            GameType::Ranked,
        );
        g.player2 = Some(PlayerSlot { user_id: "bob".into(), rating: 820, abandoned: false });
        g.status = GameStatus::Playing;
        g.questions = (0..3)
            .map(|_| SharedQuestion {
                exercise: generate(&mut rng, OperationKind::Addition, 2),
                player1: None,
                player2: None,
            })
            .collect();
        g
    }

    #[test]
    fn snapshot_hides_answers_while_playing() {
        let mut g = playing_game();
        g.questions[0].player2 = Some(RecordedAnswer {
            answer: "123".into(),
            elapsed_ms: 1_000,
            correct: true,
        });

        let snap = game_snapshot(&g, "alice");
        assert_eq!(snap.your_side, Some(PlayerSide::One));
        // Opponent progress is a count; their content never appears.
        assert_eq!(snap.player2.as_ref().unwrap().answered, 1);
        for q in &snap.questions {
            assert!(q.answer.is_none());
            assert!(q.your_answer.is_none());
        }
        let json = serde_json::to_string(&snap).unwrap();
        assert!(!json.contains("\"123\""), "opponent answer leaked: {}", json);
    }

    #[test]
    fn snapshot_reveals_answers_once_terminal() {
        let mut g = playing_game();
        g.status = GameStatus::Finished;
        let snap = game_snapshot(&g, "bob");
        assert!(snap.questions.iter().all(|q| q.answer.is_some()));
    }

    #[test]
    fn spectators_get_counts_but_no_side() {
        let g = playing_game();
        let snap = game_snapshot(&g, "mallory");
        assert_eq!(snap.your_side, None);
        assert!(snap.questions.iter().all(|q| q.your_answer.is_none()));
    }
}
