//! Engine Events
//!
//! Audit trail of every committed transition, plus the payout notices
//! delivered to an external [`PayoutHook`](super::PayoutHook).

use serde::{Serialize, Deserialize};

use crate::core::ids::{Amount, GameId, PlayerId};
use super::commitment::Move;
use super::game::Outcome;

/// A committed state transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Value entered the ledger.
    Deposited {
        player: PlayerId,
        amount: Amount,
    },

    /// Value left the ledger.
    Withdrawn {
        player: PlayerId,
        amount: Amount,
    },

    /// First commitment for a fresh game id.
    GameOpened {
        game_id: GameId,
        player: PlayerId,
        stake: Amount,
        commit_deadline: u64,
    },

    /// Second commitment; reveal window opened.
    PlayerJoined {
        game_id: GameId,
        player: PlayerId,
        reveal_deadline: u64,
    },

    /// A reveal verified against its commitment.
    MoveRevealed {
        game_id: GameId,
        player: PlayerId,
        mv: Move,
    },

    /// Game reached a terminal state.
    GameResolved {
        game_id: GameId,
        outcome: Outcome,
    },

    /// Lone committer withdrew from a game nobody joined.
    GameCancelled {
        game_id: GameId,
        player: PlayerId,
    },
}

/// Event with ordering metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number, starting at 0.
    pub seq: u64,
    /// Clock tick when the transition committed.
    pub tick: u64,
    /// Event data.
    pub event: EngineEvent,
}

/// Why value is leaving engine custody or being credited back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutReason {
    /// Winner or draw share after both reveals.
    Settlement(GameId),
    /// Revealer collecting a silent opponent's stake.
    Forfeit(GameId),
    /// Stake returned on void or cancel.
    Refund(GameId),
    /// Ledger balance sent out.
    Withdrawal,
}

/// Notice handed to the payout hook after the transition is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient.
    pub player: PlayerId,
    /// Amount credited or sent.
    pub amount: Amount,
    /// Cause.
    pub reason: PayoutReason,
}
