use std::collections::HashMap;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{all_box_origins, edges_of, Line, Point};

/// A player slot. `None` is the unowned bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Owner {
    None,
    PlayerOne,
    PlayerTwo,
}

impl From<Owner> for u8 {
    fn from(owner: Owner) -> u8 {
        match owner {
            Owner::None => 0,
            Owner::PlayerOne => 1,
            Owner::PlayerTwo => 2,
        }
    }
}

impl TryFrom<u8> for Owner {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Owner::None),
            1 => Ok(Owner::PlayerOne),
            2 => Ok(Owner::PlayerTwo),
            other => Err(format!("invalid owner: {other}")),
        }
    }
}

/// Game state machine. `Paused` remembers the turn state it suspended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GameState {
    Waiting,
    PlayerOneTurn,
    PlayerTwoTurn,
    Paused,
    GameOver,
}

impl GameState {
    /// The owner whose move it is, or `Owner::None` outside turn states.
    pub fn turn(self) -> Owner {
        match self {
            GameState::PlayerOneTurn => Owner::PlayerOne,
            GameState::PlayerTwoTurn => Owner::PlayerTwo,
            _ => Owner::None,
        }
    }
}

impl From<GameState> for u8 {
    fn from(state: GameState) -> u8 {
        match state {
            GameState::Waiting => 0,
            GameState::PlayerOneTurn => 1,
            GameState::PlayerTwoTurn => 2,
            GameState::Paused => 3,
            GameState::GameOver => 4,
        }
    }
}

impl TryFrom<u8> for GameState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameState::Waiting),
            1 => Ok(GameState::PlayerOneTurn),
            2 => Ok(GameState::PlayerTwoTurn),
            3 => Ok(GameState::Paused),
            4 => Ok(GameState::GameOver),
            other => Err(format!("invalid game state: {other}")),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid move")]
    InvalidMove,
    #[error("Line has already been taken")]
    AlreadyTaken,
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("Game has been paused")]
    GamePaused,
    #[error("Game is not over")]
    GameNotOver,
}

/// Who placed a line and when. `seq` is a per-game monotonic counter so
/// "last placed" stays deterministic when wall-clock timestamps collide.
#[derive(Clone, Copy, Debug)]
struct Ownership {
    owner: Owner,
    placed_at: SystemTime,
    seq: u64,
}

impl Ownership {
    fn order_key(&self) -> (SystemTime, u64) {
        (self.placed_at, self.seq)
    }
}

#[derive(Debug)]
struct Inner {
    state: GameState,
    before_pause: GameState,
    grid: HashMap<Line, Ownership>,
    boxes: HashMap<Point, Owner>,
    scores: HashMap<Owner, u32>,
    next_seq: u64,
    /// Grid size at the end of the last evaluation pass. When unchanged,
    /// re-evaluation must not move the turn.
    evaluated_lines: usize,
}

fn zero_scores() -> HashMap<Owner, u32> {
    HashMap::from([
        (Owner::None, 0),
        (Owner::PlayerOne, 0),
        (Owner::PlayerTwo, 0),
    ])
}

/// One authoritative match. All mutation happens under the single
/// aggregate lock; accessors hand out copies taken under the shared lock.
#[derive(Debug)]
pub struct Game {
    pub m: i32,
    pub n: i32,
    inner: RwLock<Inner>,
}

impl Game {
    pub fn new(m: i32, n: i32) -> Self {
        Game {
            m,
            n,
            inner: RwLock::new(Inner {
                state: GameState::Waiting,
                before_pause: GameState::Waiting,
                grid: HashMap::new(),
                boxes: HashMap::new(),
                scores: zero_scores(),
                next_seq: 0,
                evaluated_lines: 0,
            }),
        }
    }

    /// Record a line for `owner`. The line is canonicalized before any
    /// lookup so the grid only ever holds ordered keys. Does not
    /// re-evaluate the board; that is a separate step.
    pub fn place(&self, line: Line, owner: Owner) -> Result<(), GameError> {
        let mut g = self.inner.write();
        if g.state == GameState::Paused {
            return Err(GameError::GamePaused);
        }
        if g.state.turn() != owner {
            return Err(GameError::NotYourTurn);
        }
        let line = line.ordered();
        if !line.is_valid(self.m, self.n) {
            return Err(GameError::InvalidMove);
        }
        if g.grid.contains_key(&line) {
            return Err(GameError::AlreadyTaken);
        }
        let seq = g.next_seq;
        g.next_seq += 1;
        g.grid.insert(
            line,
            Ownership {
                owner,
                placed_at: SystemTime::now(),
                seq,
            },
        );
        Ok(())
    }

    /// Recompute every box ownership and all scores from scratch, then
    /// run the turn transition. A box belongs to whoever placed its last
    /// edge. Safe to call repeatedly: without an intervening `place` the
    /// second pass reproduces the first, turn included.
    pub fn evaluate(&self) {
        let mut g = self.inner.write();
        if g.state == GameState::Paused {
            return;
        }

        let mut boxes = HashMap::new();
        let mut scores = zero_scores();
        for origin in all_box_origins(self.m, self.n) {
            let mut placed = 0;
            let mut latest: Option<Ownership> = None;
            for edge in edges_of(origin) {
                if let Some(ownership) = g.grid.get(&edge) {
                    placed += 1;
                    if latest.is_none_or(|l| ownership.order_key() > l.order_key()) {
                        latest = Some(*ownership);
                    }
                }
            }
            if placed == 4 {
                let owner = latest.map(|l| l.owner).unwrap_or(Owner::None);
                boxes.insert(origin, owner);
                *scores.entry(owner).or_insert(0) += 1;
            }
        }

        g.boxes = boxes;
        let old_scores = std::mem::replace(&mut g.scores, scores);

        if g.boxes.len() == (self.m * self.n) as usize {
            g.state = GameState::GameOver;
            return;
        }

        if g.state == GameState::Waiting {
            g.state = GameState::PlayerOneTurn;
            g.evaluated_lines = g.grid.len();
            return;
        }

        // Nothing placed since the last pass: the turn stands.
        if g.grid.len() == g.evaluated_lines {
            return;
        }
        g.evaluated_lines = g.grid.len();

        // The turn-holder just closed a box: they move again.
        let turn = g.state.turn();
        if turn != Owner::None && g.scores[&turn] > old_scores[&turn] {
            return;
        }

        g.state = match g.state {
            GameState::PlayerOneTurn => GameState::PlayerTwoTurn,
            GameState::PlayerTwoTurn => GameState::PlayerOneTurn,
            other => other,
        };
    }

    /// Suspend turn-taking, remembering where to resume. No-op outside
    /// turn states.
    pub fn pause(&self) {
        let mut g = self.inner.write();
        match g.state {
            GameState::PlayerOneTurn | GameState::PlayerTwoTurn => {
                g.before_pause = g.state;
                g.state = GameState::Paused;
            }
            _ => {}
        }
    }

    /// Restore the pre-pause turn state. No-op unless paused.
    pub fn resume(&self) {
        let mut g = self.inner.write();
        if g.state == GameState::Paused {
            g.state = g.before_pause;
        }
    }

    /// Reset for a fresh match. Player one always opens a rematch.
    pub fn rematch(&self) -> Result<(), GameError> {
        let mut g = self.inner.write();
        if g.state != GameState::GameOver {
            return Err(GameError::GameNotOver);
        }
        g.grid.clear();
        g.boxes.clear();
        g.scores = zero_scores();
        g.evaluated_lines = 0;
        g.state = GameState::PlayerOneTurn;
        Ok(())
    }

    /// Highest-scoring owner. Ties resolve arbitrarily.
    pub fn winner(&self) -> (Owner, u32) {
        let g = self.inner.read();
        let mut highest = (Owner::None, 0);
        for (&owner, &score) in g.scores.iter() {
            if score > highest.1 {
                highest = (owner, score);
            }
        }
        highest
    }

    pub fn state(&self) -> GameState {
        self.inner.read().state
    }

    pub fn scores(&self) -> HashMap<Owner, u32> {
        self.inner.read().scores.clone()
    }

    pub fn grid(&self) -> HashMap<Line, Owner> {
        self.inner
            .read()
            .grid
            .iter()
            .map(|(line, ownership)| (*line, ownership.owner))
            .collect()
    }

    pub fn boxes(&self) -> HashMap<Point, Owner> {
        self.inner.read().boxes.clone()
    }
}
