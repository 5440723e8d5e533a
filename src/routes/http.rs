//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; hard failures render as a generic 500 and
//! unknown ids as 404, everything else is a normal 200.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::RatingMode;
use crate::error::EngineError;
use crate::generator::parse_kind_lossy;
use crate::protocol::*;
use crate::state::AppState;
use crate::{game, logic};

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self {
    ApiError(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = if self.0.is_hard() {
      error!(target: "mathrush_backend", error = %self.0, "Hard failure surfaced to client");
      (StatusCode::INTERNAL_SERVER_ERROR, "Temporary failure, please try again.".to_string())
    } else {
      (StatusCode::NOT_FOUND, self.0.to_string())
    };
    (status, Json(serde_json::json!({ "message": message }))).into_response()
  }
}

fn parse_kinds(kinds: Option<Vec<String>>) -> Option<Vec<crate::domain::OperationKind>> {
  kinds.map(|ks| ks.iter().map(|s| parse_kind_lossy(s)).collect())
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(user = %body.user_id, mode = ?body.mode))]
pub async fn http_start_test(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartTestIn>,
) -> Result<Json<TestOut>, ApiError> {
  let kinds = parse_kinds(body.kinds);
  let session = logic::start_test(&state, &body.user_id, body.mode, body.count, kinds).await?;
  info!(target: "exercise", session_id = %session.id, "HTTP test started");
  Ok(Json(to_test_out(&session)))
}

#[instrument(level = "info", skip(state, body), fields(user = %body.user_id))]
pub async fn http_start_course(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartCourseIn>,
) -> Result<Json<TestOut>, ApiError> {
  let kinds = parse_kinds(Some(body.kinds)).unwrap_or_default();
  let session =
    logic::start_course(&state, &body.user_id, kinds, body.difficulty, body.count).await?;
  Ok(Json(to_test_out(&session)))
}

#[instrument(level = "info", skip(state, body), fields(%session_id, index = body.index))]
pub async fn http_test_answer(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
  Json(body): Json<TestAnswerIn>,
) -> Result<Json<TestAnswerOut>, ApiError> {
  let correct =
    logic::submit_test_answer(&state, session_id, body.index, &body.answer, body.elapsed_ms)
      .await?;
  Ok(Json(TestAnswerOut { correct }))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn http_complete_test(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<TestReportOut>, ApiError> {
  let report = logic::complete_test(&state, session_id).await?;
  info!(target: "rating", %session_id, correct = report.correct, "HTTP test completed");
  Ok(Json(to_report_out(&report)))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn http_get_profile(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
  Query(q): Query<ProfileQuery>,
) -> Result<Json<ProfileOut>, ApiError> {
  let mode = q.mode.unwrap_or(RatingMode::Solo);
  let profile = state.profiles.load(&user_id, mode).map_err(EngineError::from)?;
  Ok(Json(to_profile_out(&user_id, &profile)))
}

#[instrument(level = "info")]
pub async fn http_get_tiers() -> impl IntoResponse {
  Json(tiers_out())
}

#[instrument(level = "info", skip(state, body), fields(user = %body.user_id))]
pub async fn http_create_or_join(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateGameIn>,
) -> Result<Json<GameOut>, ApiError> {
  let shared =
    game::create_or_join(&state, &body.user_id, body.time_control, body.game_type).await?;
  let g = shared.lock().await;
  info!(target: "game", game_id = %g.id, status = ?g.status, "HTTP matchmaking served");
  Ok(Json(game_snapshot(&g, &body.user_id)))
}

#[instrument(level = "info", skip(state), fields(%game_id))]
pub async fn http_poll_game(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<Uuid>,
  Query(q): Query<GameViewerQuery>,
) -> Result<Json<GameOut>, ApiError> {
  let g = game::poll_game(&state, game_id).await?;
  let viewer = q.user_id.unwrap_or_default();
  Ok(Json(game_snapshot(&g, &viewer)))
}

#[instrument(level = "info", skip(state, body), fields(%game_id, user = %body.user_id, index = body.index))]
pub async fn http_game_answer(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<Uuid>,
  Json(body): Json<GameAnswerIn>,
) -> Result<Json<GameOut>, ApiError> {
  game::submit_answer(&state, game_id, &body.user_id, body.index, body.answer, body.elapsed_ms)
    .await?;
  let g = game::poll_game(&state, game_id).await?;
  Ok(Json(game_snapshot(&g, &body.user_id)))
}

#[instrument(level = "info", skip(state, body), fields(%game_id, user = %body.user_id))]
pub async fn http_abandon(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<Uuid>,
  Json(body): Json<AbandonIn>,
) -> Result<Json<GameOut>, ApiError> {
  let g = game::abandon(&state, game_id, &body.user_id).await?;
  Ok(Json(game_snapshot(&g, &body.user_id)))
}

#[instrument(level = "info", skip(state, body), fields(%game_id, reason = ?body.reason))]
pub async fn http_finalize(
  State(state): State<Arc<AppState>>,
  Path(game_id): Path<Uuid>,
  Json(body): Json<FinalizeIn>,
) -> Result<Json<GameOut>, ApiError> {
  let g = game::finalize_game(&state, game_id, body.reason).await?;
  Ok(Json(game_snapshot(&g, "")))
}

#[instrument(level = "info", skip(state), fields(%user_id))]
pub async fn http_leave_search(
  State(state): State<Arc<AppState>>,
  Path(user_id): Path<String>,
) -> impl IntoResponse {
  game::leave_search(&state, &user_id).await;
  StatusCode::NO_CONTENT
}
