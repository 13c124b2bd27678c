//! Game Records
//!
//! One record per game id. Records are never deleted; terminal records stay
//! queryable through [`GameSnapshot`].

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::ids::{Amount, GameId, PlayerId};
use super::commitment::{Commitment, Move};

/// Lifecycle of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameState {
    /// Player 1 committed, waiting for player 2.
    AwaitingPlayers = 0,
    /// Both committed, waiting for reveals.
    AwaitingReveals = 1,
    /// Both revealed and paid out.
    Settled = 2,
    /// One player revealed, the other was silent past the deadline.
    Forfeited = 3,
    /// Stakes returned without a result.
    Void = 4,
}

impl GameState {
    /// Terminal states never change again.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Settled | GameState::Forfeited | GameState::Void)
    }
}

/// How a terminal game was resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Both revealed; `winner` took both stakes.
    Won {
        /// Winning player.
        winner: PlayerId,
        /// Losing player.
        loser: PlayerId,
    },
    /// Both revealed the same move; stakes returned.
    Draw,
    /// Only `winner` revealed in time.
    Forfeited {
        /// Player who revealed.
        winner: PlayerId,
        /// Player who stayed silent.
        silent: PlayerId,
    },
    /// Nobody won; every escrowed stake went back to its owner.
    Refunded,
}

/// Which seat a player occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seat {
    /// Creator of the game.
    First,
    /// Second joiner.
    Second,
}

/// Full game record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Game {
    /// Game id.
    pub game_id: GameId,
    /// Creator.
    pub player1: PlayerId,
    /// Joiner, once present.
    pub player2: Option<PlayerId>,
    /// Per-player stake (equal for both seats).
    pub stake: Amount,
    /// Player 1's commitment.
    pub commitment1: Commitment,
    /// Player 2's commitment.
    pub commitment2: Option<Commitment>,
    /// Player 1's revealed move.
    pub revealed_move1: Option<Move>,
    /// Player 2's revealed move.
    pub revealed_move2: Option<Move>,
    /// Last tick at which player 2 may join.
    pub commit_deadline: u64,
    /// Last tick at which moves may be revealed.
    pub reveal_deadline: Option<u64>,
    /// Current state.
    pub state: GameState,
    /// Resolution, once terminal.
    pub outcome: Option<Outcome>,
    /// True once escrow for this game has been paid out.
    pub settled: bool,
}

impl Game {
    /// Create a game with only player 1 seated.
    pub fn new(
        game_id: GameId,
        player1: PlayerId,
        stake: Amount,
        commitment: Commitment,
        commit_deadline: u64,
    ) -> Self {
        Self {
            game_id,
            player1,
            player2: None,
            stake,
            commitment1: commitment,
            commitment2: None,
            revealed_move1: None,
            revealed_move2: None,
            commit_deadline,
            reveal_deadline: None,
            state: GameState::AwaitingPlayers,
            outcome: None,
            settled: false,
        }
    }

    /// Seat `player2` and open the reveal window.
    pub fn seat_second(&mut self, player2: PlayerId, commitment: Commitment, reveal_deadline: u64) {
        self.player2 = Some(player2);
        self.commitment2 = Some(commitment);
        self.reveal_deadline = Some(reveal_deadline);
        self.state = GameState::AwaitingReveals;
    }

    /// Seat occupied by `player`, if any.
    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        if *player == self.player1 {
            Some(Seat::First)
        } else if self.player2.as_ref() == Some(player) {
            Some(Seat::Second)
        } else {
            None
        }
    }

    /// Stored commitment for a seat.
    pub fn commitment(&self, seat: Seat) -> Option<&Commitment> {
        match seat {
            Seat::First => Some(&self.commitment1),
            Seat::Second => self.commitment2.as_ref(),
        }
    }

    /// Revealed move for a seat.
    pub fn revealed(&self, seat: Seat) -> Option<Move> {
        match seat {
            Seat::First => self.revealed_move1,
            Seat::Second => self.revealed_move2,
        }
    }

    /// Record a verified reveal.
    pub fn record_reveal(&mut self, seat: Seat, mv: Move) {
        match seat {
            Seat::First => self.revealed_move1 = Some(mv),
            Seat::Second => self.revealed_move2 = Some(mv),
        }
    }

    /// Number of players who revealed.
    pub fn reveal_count(&self) -> usize {
        self.revealed_move1.is_some() as usize + self.revealed_move2.is_some() as usize
    }

    /// Both moves, once both are revealed.
    pub fn both_moves(&self) -> Option<(Move, Move)> {
        Some((self.revealed_move1?, self.revealed_move2?))
    }

    /// Seated players in seat order.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut players = vec![self.player1];
        players.extend(self.player2);
        players
    }

    /// Amount that should be in escrow right now.
    pub fn expected_escrow(&self) -> Amount {
        if self.settled {
            0
        } else {
            self.stake.saturating_mul(self.players().len() as Amount)
        }
    }

    /// Is the game terminal?
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Mark terminal with `outcome`.
    pub fn finish(&mut self, state: GameState, outcome: Outcome) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.outcome = Some(outcome);
        self.settled = true;
    }

    /// Read-only view for callers.
    pub fn snapshot(&self, escrowed: Amount) -> GameSnapshot {
        GameSnapshot {
            game_id: self.game_id,
            state: self.state,
            player1: self.player1,
            player2: self.player2,
            stake: self.stake,
            escrowed,
            commitment1: self.commitment1.to_hex(),
            commitment2: self.commitment2.map(|c| c.to_hex()),
            revealed_move1: self.revealed_move1,
            revealed_move2: self.revealed_move2,
            commit_deadline: self.commit_deadline,
            reveal_deadline: self.reveal_deadline,
            outcome: self.outcome.clone(),
            settled: self.settled,
        }
    }

    /// Hash this game's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.game_id);
        hasher.update_uuid(&self.player1.0);
        hasher.update_bool(self.player2.is_some());
        if let Some(p2) = &self.player2 {
            hasher.update_uuid(&p2.0);
        }
        hasher.update_u128(self.stake);
        hasher.update_bytes(self.commitment1.as_bytes());
        if let Some(c2) = &self.commitment2 {
            hasher.update_bytes(c2.as_bytes());
        }
        hasher.update_u8(self.revealed_move1.map_or(0xFF, Move::tag));
        hasher.update_u8(self.revealed_move2.map_or(0xFF, Move::tag));
        hasher.update_u64(self.commit_deadline);
        hasher.update_opt_u64(self.reveal_deadline);
        hasher.update_u8(self.state as u8);
        hasher.update_bool(self.settled);
    }
}

/// Snapshot returned by `get_game_state`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game id.
    pub game_id: GameId,
    /// Current state.
    pub state: GameState,
    /// Creator.
    pub player1: PlayerId,
    /// Joiner.
    pub player2: Option<PlayerId>,
    /// Per-player stake.
    pub stake: Amount,
    /// Currently escrowed for this game.
    pub escrowed: Amount,
    /// Player 1 commitment (hex).
    pub commitment1: String,
    /// Player 2 commitment (hex).
    pub commitment2: Option<String>,
    /// Player 1's move, once revealed.
    pub revealed_move1: Option<Move>,
    /// Player 2's move, once revealed.
    pub revealed_move2: Option<Move>,
    /// Commit deadline tick.
    pub commit_deadline: u64,
    /// Reveal deadline tick.
    pub reveal_deadline: Option<u64>,
    /// Resolution, once terminal.
    pub outcome: Option<Outcome>,
    /// Escrow paid out.
    pub settled: bool,
}
