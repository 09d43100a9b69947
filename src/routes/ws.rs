//! WebSocket upgrade + session loop. Each connection owns one `Session`.
//!
//! Client messages are handled inline. Network calls the session asks for are spawned
//! and report back through a channel, so the loop keeps reading while they run.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::service::HttpQuizService;
use crate::session::{run_command, Command, Completion, Session};
use crate::state::AppState;

enum Event {
  Client(String),
  Done(Completion),
  Ping(Vec<u8>),
  Skip,
  Closed,
}

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "intelliquiz", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

fn spawn_command(service: &HttpQuizService, cmd: Command, tx: mpsc::UnboundedSender<Completion>) {
  let service = service.clone();
  tokio::spawn(async move {
    let done = run_command(&service, cmd).await;
    // Receiver is gone when the socket closed first; nothing to deliver to.
    let _ = tx.send(done);
  });
}

#[instrument(level = "info", skip_all, fields(session = tracing::field::Empty))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  let mut session = Session::new(state.config.modes.clone());
  tracing::Span::current().record("session", tracing::field::display(session.id));
  info!(target: "intelliquiz", session = %session.id, "WebSocket connected");

  let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

  loop {
    let event = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => Event::Client(txt),
        Some(Ok(Message::Ping(payload))) => Event::Ping(payload),
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Event::Closed,
        Some(Ok(_)) => Event::Skip,
      },
      Some(done) = rx.recv() => Event::Done(done),
    };

    let outgoing = match event {
      Event::Client(txt) => match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => {
          debug!(target: "intelliquiz", "WS received: {:?}", &incoming);
          let reply = session.handle(incoming);
          if let Some(cmd) = reply.command {
            spawn_command(&state.service, cmd, tx.clone());
          }
          reply.messages
        }
        Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
      },
      Event::Done(done) => session.complete(done),
      Event::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
        continue;
      }
      Event::Skip => continue,
      Event::Closed => break,
    };

    for msg in outgoing {
      let out = serde_json::to_string(&msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      if let Err(e) = socket.send(Message::Text(out)).await {
        error!(target: "intelliquiz", error = %e, "WS send error");
        info!(target: "intelliquiz", session = %session.id, "WebSocket disconnected");
        return;
      }
    }
  }
  info!(target: "intelliquiz", session = %session.id, "WebSocket disconnected");
}
