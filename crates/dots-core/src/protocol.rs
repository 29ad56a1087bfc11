use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::{Game, GameState, Owner};
use crate::geom::Line;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Request to place a line for the sender's slot.
    #[serde(rename = "PLACE")]
    Place(Line),
    /// Request to restart a finished game.
    #[serde(rename = "REMATCH")]
    Rematch {},
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Sent once per connection on accept, and again to every
    /// connection after a successful rematch.
    #[serde(rename = "GAMECONFIG")]
    GameConfig { m: i32, n: i32, player: Owner },
    /// Full board snapshot, broadcast after every state-affecting
    /// operation.
    #[serde(rename = "STATE")]
    State(StateSnapshot),
    /// Sent only to the connection whose request was rejected.
    #[serde(rename = "ERROR")]
    Error { error: String },
}

/// Point-in-time view of a game, keyed by the canonical string forms of
/// lines ("from-x-y-to-x-y") and box origins ("x-y").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub grid: HashMap<String, Owner>,
    pub boxes: HashMap<String, Owner>,
    pub state: GameState,
    pub scores: HashMap<Owner, u32>,
    pub turn: Owner,
}

impl StateSnapshot {
    pub fn from_game(game: &Game) -> Self {
        let state = game.state();
        StateSnapshot {
            grid: game
                .grid()
                .into_iter()
                .map(|(line, owner)| (line.to_string(), owner))
                .collect(),
            boxes: game
                .boxes()
                .into_iter()
                .map(|(point, owner)| (point.to_string(), owner))
                .collect(),
            state,
            scores: game.scores(),
            turn: state.turn(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;
    use serde_json::json;

    #[test]
    fn place_message_envelope() {
        let raw = json!({
            "type": "PLACE",
            "payload": { "from": { "x": 0, "y": 0 }, "to": { "x": 1, "y": 0 } },
        });
        let msg: ClientMessage = serde_json::from_value(raw).unwrap();
        match msg {
            ClientMessage::Place(line) => {
                assert_eq!(line, Line::new(Point::new(0, 0), Point::new(1, 0)));
            }
            other => panic!("expected PLACE, got {other:?}"),
        }
    }

    #[test]
    fn rematch_message_envelope() {
        let raw = json!({ "type": "REMATCH", "payload": {} });
        let msg: ClientMessage = serde_json::from_value(raw).unwrap();
        assert!(matches!(msg, ClientMessage::Rematch {}));
    }

    #[test]
    fn game_config_serializes_owner_as_integer() {
        let msg = ServerMessage::GameConfig {
            m: 2,
            n: 3,
            player: Owner::PlayerTwo,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "GAMECONFIG");
        assert_eq!(value["payload"]["m"], 2);
        assert_eq!(value["payload"]["n"], 3);
        assert_eq!(value["payload"]["player"], 2);
    }

    #[test]
    fn snapshot_wire_format() {
        let game = Game::new(1, 1);
        game.evaluate();
        game.place(Line::new(Point::new(1, 0), Point::new(0, 0)), Owner::PlayerOne)
            .unwrap();
        game.evaluate();

        let value =
            serde_json::to_value(ServerMessage::State(StateSnapshot::from_game(&game))).unwrap();
        assert_eq!(value["type"], "STATE");
        let payload = &value["payload"];
        // Reversed endpoints still serialize under the canonical key.
        assert_eq!(payload["grid"]["from-0-0-to-1-0"], 1);
        assert_eq!(payload["state"], 2);
        assert_eq!(payload["turn"], 2);
        assert_eq!(payload["scores"]["1"], 0);
        assert_eq!(payload["boxes"], json!({}));
    }

    #[test]
    fn snapshot_round_trips() {
        let game = Game::new(1, 1);
        game.evaluate();
        let snapshot = StateSnapshot::from_game(&game);
        let text = serde_json::to_string(&snapshot).unwrap();
        let back: StateSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back.state, GameState::PlayerOneTurn);
        assert_eq!(back.turn, Owner::PlayerOne);
        assert_eq!(back.scores[&Owner::PlayerTwo], 0);
    }
}
