use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use dots_core::protocol::{ClientMessage, ServerMessage, StateSnapshot};
use dots_core::{Game, GameError, GameState, Owner};

/// Empty rooms older than this are eligible for reclamation.
const RETENTION: Duration = Duration::from_secs(60 * 60);

/// One session: an authoritative game plus up to two live connections,
/// keyed by player slot.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    created_at: Instant,
    retention: Duration,
    game: Game,
    conns: Mutex<HashMap<Owner, mpsc::UnboundedSender<ServerMessage>>>,
}

impl Room {
    pub fn new(id: String, m: i32, n: i32) -> Self {
        Room {
            id,
            created_at: Instant::now(),
            retention: RETENTION,
            game: Game::new(m, n),
            conns: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_retention(id: String, m: i32, n: i32, retention: Duration) -> Self {
        let mut room = Room::new(id, m, n);
        room.retention = retention;
        room
    }

    pub fn is_full(&self) -> bool {
        self.conns.lock().len() >= 2
    }

    pub fn is_reclaimable(&self) -> bool {
        self.conns.lock().is_empty() && self.created_at.elapsed() > self.retention
    }

    /// Register a connection in the first free slot. `None` means the
    /// room is full.
    fn claim_slot(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> Option<Owner> {
        let mut conns = self.conns.lock();
        if conns.len() >= 2 {
            return None;
        }
        let slot = if conns.contains_key(&Owner::PlayerOne) {
            Owner::PlayerTwo
        } else {
            Owner::PlayerOne
        };
        conns.insert(slot, tx);
        Some(slot)
    }

    fn release_slot(&self, slot: Owner) {
        self.conns.lock().remove(&slot);
    }

    fn send_to(&self, slot: Owner, msg: ServerMessage) {
        if let Some(tx) = self.conns.lock().get(&slot) {
            let _ = tx.send(msg);
        }
    }

    fn broadcast(&self, msg: ServerMessage) {
        for tx in self.conns.lock().values() {
            let _ = tx.send(msg.clone());
        }
    }

    fn broadcast_state(&self) {
        self.broadcast(ServerMessage::State(StateSnapshot::from_game(&self.game)));
    }

    /// Dispatch one decoded client message for `player`. Errors are the
    /// caller's to report; nothing is broadcast here except the rematch
    /// config reset.
    fn process_message(&self, msg: ClientMessage, player: Owner) -> Result<(), GameError> {
        match msg {
            ClientMessage::Place(line) => self.game.place(line, player),
            ClientMessage::Rematch {} => {
                self.game.rematch()?;
                // A rematch restarts the session framing: every
                // connection gets a fresh config carrying its own slot.
                let conns = self.conns.lock();
                for (slot, tx) in conns.iter() {
                    let _ = tx.send(ServerMessage::GameConfig {
                        m: self.game.m,
                        n: self.game.n,
                        player: *slot,
                    });
                }
                Ok(())
            }
        }
    }

    /// Per-connection task: claim a slot, run the handshake, then pump
    /// messages until the transport drops.
    pub async fn handle_socket(self: Arc<Self>, mut socket: WebSocket) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

        let player = match self.claim_slot(tx.clone()) {
            Some(player) => player,
            None => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: "Room full".into(),
                    })))
                    .await;
                return;
            }
        };

        println!("[room {}] player {:?} connected", self.id, player);

        let _ = tx.send(ServerMessage::GameConfig {
            m: self.game.m,
            n: self.game.n,
            player,
        });

        if self.is_full() {
            match self.game.state() {
                GameState::Waiting => {
                    println!("[room {}] starting game", self.id);
                    self.game.evaluate();
                }
                GameState::Paused => {
                    println!("[room {}] resuming game", self.id);
                    self.game.resume();
                }
                _ => {}
            }
        }
        self.broadcast_state();

        loop {
            tokio::select! {
                // Outbound: forward queued ServerMessage to the WebSocket.
                Some(msg) = rx.recv() => {
                    if let Ok(json) = serde_json::to_string(&msg) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                // Inbound: read from the WebSocket.
                maybe_msg = socket.recv() => {
                    match maybe_msg {
                        Some(Ok(Message::Text(text))) => {
                            let msg: ClientMessage = match serde_json::from_str(&text) {
                                Ok(msg) => msg,
                                Err(err) => {
                                    self.send_to(player, ServerMessage::Error {
                                        error: format!("Invalid message: {err}"),
                                    });
                                    continue;
                                }
                            };

                            match self.process_message(msg, player) {
                                Ok(()) => {
                                    let was_over = self.game.state() == GameState::GameOver;
                                    self.game.evaluate();
                                    if !was_over && self.game.state() == GameState::GameOver {
                                        let (winner, score) = self.game.winner();
                                        println!(
                                            "[room {}] game over, {winner:?} wins with {score}",
                                            self.id
                                        );
                                    }
                                    self.broadcast_state();
                                }
                                Err(err) => {
                                    // Rejections go back to the sender only.
                                    self.send_to(player, ServerMessage::Error {
                                        error: err.to_string(),
                                    });
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        _ => continue,
                    }
                }
            }
        }

        // Disconnect: suspend the game and free the slot so the player
        // can come back.
        println!("[room {}] player {:?} disconnected", self.id, player);
        self.game.pause();
        self.release_slot(player);
        self.broadcast_state();
    }
}
