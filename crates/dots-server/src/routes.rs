use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::state::{AppState, RegistryError};

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub m: i32,
    pub n: i32,
}

/// POST /room/{room_id}: register a room with the requested dimensions.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(req): Json<CreateRoomRequest>,
) -> StatusCode {
    if req.m < 1 || req.n < 1 {
        return StatusCode::BAD_REQUEST;
    }
    match state.create_room(&room_id, req.m, req.n) {
        Ok(_) => {
            println!("[registry] created room {room_id} ({}x{})", req.m, req.n);
            StatusCode::CREATED
        }
        Err(RegistryError::AlreadyExists) => StatusCode::CONFLICT,
        Err(RegistryError::AtCapacity) => StatusCode::FORBIDDEN,
    }
}

/// GET /room/{room_id}: attach to a room over WebSocket. Unknown rooms
/// are closed after the upgrade with a policy-violation frame, matching
/// the in-room rejection for full rooms.
pub async fn attach_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |mut socket| async move {
        match state.room(&room_id) {
            Some(room) => room.handle_socket(socket).await,
            None => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: "Room does not exist".into(),
                    })))
                    .await;
            }
        }
    })
}
