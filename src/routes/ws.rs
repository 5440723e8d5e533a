//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request,
//! so a push transport could replace polling without touching the lifecycle.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::generator::parse_kind_lossy;
use crate::protocol::{self, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;
use crate::{game, logic};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "mathrush_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "mathrush_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        debug!(target: "mathrush_backend", "WS received: {}", trunc_for_log(&txt, 300));
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "mathrush_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "mathrush_backend", "WebSocket disconnected");
}

fn soft_error(e: crate::error::EngineError) -> ServerWsMessage {
  if e.is_hard() {
    error!(target: "mathrush_backend", error = %e, "Hard failure surfaced over WS");
    ServerWsMessage::Error { message: "Temporary failure, please try again.".into() }
  } else {
    ServerWsMessage::Error { message: e.to_string() }
  }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartTest { user_id, mode, count, kinds } => {
      let kinds = kinds.map(|ks| ks.iter().map(|s| parse_kind_lossy(s)).collect());
      match logic::start_test(state, &user_id, mode, count, kinds).await {
        Ok(session) => {
          tracing::info!(target: "exercise", session_id = %session.id, %user_id, "WS test started");
          ServerWsMessage::Test { test: protocol::to_test_out(&session) }
        }
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::StartCourse { user_id, kinds, difficulty, count } => {
      let kinds = kinds.iter().map(|s| parse_kind_lossy(s)).collect();
      match logic::start_course(state, &user_id, kinds, difficulty, count).await {
        Ok(session) => ServerWsMessage::Test { test: protocol::to_test_out(&session) },
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::SubmitTestAnswer { session_id, index, answer, elapsed_ms } => {
      match logic::submit_test_answer(state, session_id, index, &answer, elapsed_ms).await {
        Ok(correct) => ServerWsMessage::TestAnswer { correct },
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::CompleteTest { session_id } => {
      match logic::complete_test(state, session_id).await {
        Ok(report) => {
          tracing::info!(target: "rating", %session_id, correct = report.correct, "WS test completed");
          ServerWsMessage::TestReport { report: protocol::to_report_out(&report) }
        }
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::GetProfile { user_id, mode } => {
      match state.profiles.load(&user_id, mode) {
        Ok(p) => ServerWsMessage::Profile { profile: protocol::to_profile_out(&user_id, &p) },
        Err(e) => soft_error(e.into()),
      }
    }

    ClientWsMessage::GetTiers => ServerWsMessage::Tiers { tiers: protocol::tiers_out() },

    ClientWsMessage::CreateOrJoinGame { user_id, time_control, game_type } => {
      match game::create_or_join(state, &user_id, time_control, game_type).await {
        Ok(shared) => {
          let g = shared.lock().await;
          tracing::info!(target: "game", game_id = %g.id, status = ?g.status, "WS matchmaking served");
          ServerWsMessage::Game { game: protocol::game_snapshot(&g, &user_id) }
        }
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::SubmitGameAnswer { game_id, user_id, index, answer, elapsed_ms } => {
      if let Err(e) = game::submit_answer(state, game_id, &user_id, index, answer, elapsed_ms).await {
        return soft_error(e);
      }
      match game::poll_game(state, game_id).await {
        Ok(g) => ServerWsMessage::Game { game: protocol::game_snapshot(&g, &user_id) },
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::PollGame { game_id, user_id } => {
      match game::poll_game(state, game_id).await {
        Ok(g) => ServerWsMessage::Game { game: protocol::game_snapshot(&g, &user_id) },
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::AbandonGame { game_id, user_id } => {
      match game::abandon(state, game_id, &user_id).await {
        Ok(g) => ServerWsMessage::Game { game: protocol::game_snapshot(&g, &user_id) },
        Err(e) => soft_error(e),
      }
    }

    ClientWsMessage::LeaveSearch { user_id } => {
      game::leave_search(state, &user_id).await;
      ServerWsMessage::Left
    }
  }
}
